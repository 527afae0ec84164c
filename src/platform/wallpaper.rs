//! GNOME desktop background via `gsettings`

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::DesktopBackground;
use crate::constants::wallpaper::{GNOME_SCHEMA, PICTURE_URI_DARK_KEY, PICTURE_URI_KEY};

const FILE_URI_PREFIX: &str = "file://";

/// Background setter backed by the `org.gnome.desktop.background` schema
pub struct GnomeBackground {
    screen_size: (u32, u32),
}

impl GnomeBackground {
    pub fn new(screen_size: (u32, u32)) -> Self {
        Self { screen_size }
    }

    fn get_key(key: &str) -> Result<String> {
        let output = Command::new("gsettings")
            .args(["get", GNOME_SCHEMA, key])
            .output()
            .context("Failed to run gsettings")?;
        if !output.status.success() {
            bail!(
                "gsettings get {key} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn set_key(key: &str, value: &str) -> Result<()> {
        let status = Command::new("gsettings")
            .args(["set", GNOME_SCHEMA, key, value])
            .status()
            .context("Failed to run gsettings")?;
        if !status.success() {
            bail!("gsettings set {key} exited with {status}");
        }
        Ok(())
    }
}

impl DesktopBackground for GnomeBackground {
    fn current(&self) -> Option<PathBuf> {
        Self::get_key(PICTURE_URI_KEY)
            .inspect_err(|e| debug!(error = ?e, "Failed to read desktop background"))
            .ok()
            .and_then(|raw| uri_to_path(&raw))
    }

    fn set(&self, path: &Path) -> bool {
        let uri = path_to_uri(path);
        if let Err(e) = Self::set_key(PICTURE_URI_KEY, &uri) {
            debug!(error = ?e, path = %path.display(), "Failed to set desktop background");
            return false;
        }
        // Older GNOME releases lack the dark-style key; the light key is what counts
        if let Err(e) = Self::set_key(PICTURE_URI_DARK_KEY, &uri) {
            debug!(error = ?e, "Failed to set dark-style desktop background");
        }
        true
    }

    fn screen_resolution(&self) -> (u32, u32) {
        self.screen_size
    }
}

/// Convert gsettings output (`'file:///home/u/bg.png'`) into a filesystem path
pub fn uri_to_path(raw: &str) -> Option<PathBuf> {
    let value = raw.trim().trim_matches('\'').trim_matches('"');
    let path = value.strip_prefix(FILE_URI_PREFIX).unwrap_or(value);
    if path.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(path)
        .inspect_err(|e| debug!(error = ?e, uri = %value, "Background URI is not UTF-8 after decoding"))
        .ok()?;
    Some(PathBuf::from(decoded.into_owned()))
}

/// `file://` URI with every path segment percent-encoded
pub fn path_to_uri(path: &Path) -> String {
    let encoded: Vec<String> = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{FILE_URI_PREFIX}{}", encoded.join("/"))
}
