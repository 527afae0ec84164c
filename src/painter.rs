//! Desktop background painter
//!
//! Solid-color wallpapers are generated once per (layout, color) pair at the
//! screen resolution seen at startup and kept forever in the data directory.
//! Setting the background is best effort: a bounded number of supervised
//! attempts, then one unchecked attempt if the desktop still shows something else.

use anyhow::{Context, Result};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::color::HexColor;
use crate::constants::wallpaper::{RETRY_BACKOFF_MS, SET_ATTEMPTS};
use crate::layout::LayoutId;
use crate::platform::DesktopBackground;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: SET_ATTEMPTS,
            backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        }
    }
}

pub struct BackgroundPainter {
    desktop: Arc<dyn DesktopBackground>,
    cache_dir: PathBuf,
    screen_size: (u32, u32),
    /// Background in place when the painter was created
    original: Option<PathBuf>,
    retry: RetryPolicy,
}

impl BackgroundPainter {
    pub fn new(desktop: Arc<dyn DesktopBackground>, cache_dir: PathBuf, retry: RetryPolicy) -> Self {
        let screen_size = desktop.screen_resolution();
        let original = desktop.current();
        info!(original = ?original, width = screen_size.0, height = screen_size.1, "Captured original wallpaper");
        Self {
            desktop,
            cache_dir,
            screen_size,
            original,
            retry,
        }
    }

    /// Paint the desktop with `color`, generating the cached image on first use
    pub fn apply_color(&self, color: &str, id: LayoutId) {
        let Some(parsed) = HexColor::parse(color) else {
            error!(color = %color, layout = %id, "Invalid layout color, leaving background unchanged");
            return;
        };

        match self.cached_image(parsed, id) {
            Ok(path) => self.set_wallpaper(&path),
            Err(e) => error!(error = ?e, layout = %id, "Failed to prepare color image"),
        }
    }

    pub fn restore_original(&self) {
        match &self.original {
            Some(path) => self.set_wallpaper(path),
            None => debug!("No original wallpaper recorded, nothing to restore"),
        }
    }

    /// Path of the `<id>_<rrggbb>.png` image, created if missing
    pub fn cached_image(&self, color: HexColor, id: LayoutId) -> Result<PathBuf> {
        let path = self.cache_dir.join(format!("{id}_{}.png", color.digits()));
        if path.exists() {
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir)
            .context(format!("Failed to create cache directory: {}", self.cache_dir.display()))?;

        // Write aside and rename so an interrupted write never becomes a cache hit
        let tmp_path = path.with_extension("png.tmp");
        write_solid_png(&tmp_path, self.screen_size, color.rgb())?;
        fs::rename(&tmp_path, &path)
            .context(format!("Failed to move color image into place at {}", path.display()))?;

        info!(path = %path.display(), "Generated color image");
        Ok(path)
    }

    fn set_wallpaper(&self, path: &Path) {
        let full_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        let mut succeeded = false;
        for attempt in 1..=self.retry.attempts {
            if self.desktop.set(&full_path) {
                info!(path = %full_path.display(), attempt, "Wallpaper set");
                succeeded = true;
                break;
            }
            warn!(path = %full_path.display(), attempt, "Wallpaper set failed");
            if attempt < self.retry.attempts {
                thread::sleep(self.retry.backoff);
            }
        }
        if !succeeded {
            error!(path = %full_path.display(), attempts = self.retry.attempts, "Giving up on wallpaper change");
        }

        let matches = self
            .desktop
            .current()
            .is_some_and(|current| same_path(&current, &full_path));
        if !matches {
            warn!(path = %full_path.display(), "Wallpaper does not match after set, trying once more");
            // Result deliberately ignored: last attempt is fire-and-forget
            let _ = self.desktop.set(&full_path);
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn write_solid_png(path: &Path, (width, height): (u32, u32), rgb: [u8; 3]) -> Result<()> {
    let file = fs::File::create(path)
        .context(format!("Failed to create image file {}", path.display()))?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .context("Failed to write PNG header")?;

    let pixels = (width as usize) * (height as usize);
    let data: Vec<u8> = rgb.iter().copied().cycle().take(pixels * 3).collect();
    writer
        .write_image_data(&data)
        .context("Failed to write PNG data")?;
    writer.finish().context("Failed to finish PNG")?;
    Ok(())
}
