//! Tray glyph rendering
//!
//! A glyph is a pure function of (country code, dimmed): the flag of the
//! layout's country, or the application logo when no flag is configured.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::constants::{paths, tray};

/// Loads and prepares tray glyphs from the icon asset directory
#[derive(Debug, Clone)]
pub struct IconRenderer {
    assets_dir: PathBuf,
}

impl IconRenderer {
    pub fn new(assets_dir: PathBuf) -> Self {
        Self { assets_dir }
    }

    /// Asset directory: `icons/` beside the executable, then in the data dir, then `./icons`
    pub fn locate(data_dir: &Path) -> Self {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(paths::ICONS_DIR)));
        let candidates = beside_exe
            .into_iter()
            .chain([data_dir.join(paths::ICONS_DIR), PathBuf::from(paths::ICONS_DIR)]);

        let mut fallback = PathBuf::from(paths::ICONS_DIR);
        for candidate in candidates {
            if candidate.is_dir() {
                return Self::new(candidate);
            }
            fallback = candidate;
        }
        Self::new(fallback)
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    fn flag_path(&self, code: &str) -> PathBuf {
        self.assets_dir
            .join(paths::FLAGS_SUBDIR)
            .join(format!("{}.png", code.to_uppercase()))
    }

    fn logo_path(&self, dimmed: bool) -> PathBuf {
        let name = if dimmed {
            paths::LOGO_DIMMED_FILENAME
        } else {
            paths::LOGO_FILENAME
        };
        self.assets_dir.join(paths::LOGO_SUBDIR).join(name)
    }

    /// Flag when a country code is given, otherwise the (normal or dimmed) logo
    pub fn render(&self, country: Option<&str>, dimmed: bool) -> Result<RgbaImage> {
        let image = match country {
            Some(code) => {
                let path = self.flag_path(code);
                let flag = open_image(&path)?;
                if dimmed { desaturate(&flag) } else { flag }
            }
            None => open_image(&self.logo_path(dimmed))?,
        };

        Ok(image
            .resize_exact(tray::ICON_SIZE, tray::ICON_SIZE, FilterType::Lanczos3)
            .to_rgba8())
    }

    /// `render`, falling back to a plain placeholder when the asset is unusable
    pub fn render_or_placeholder(&self, country: Option<&str>, dimmed: bool) -> RgbaImage {
        self.render(country, dimmed).unwrap_or_else(|e| {
            error!(error = ?e, country = ?country, dimmed, "Failed to load tray icon");
            placeholder()
        })
    }

    /// Country codes with a flag asset, sorted
    pub fn flag_codes(&self) -> Vec<String> {
        let dir = self.assets_dir.join(paths::FLAGS_SUBDIR);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut codes: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().to_uppercase()))
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}

/// Minimal black glyph used when no asset can be loaded
pub fn placeholder() -> RgbaImage {
    RgbaImage::from_pixel(tray::PLACEHOLDER_SIZE, tray::PLACEHOLDER_SIZE, Rgba([0, 0, 0, 255]))
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).context(format!("Failed to open icon {}", path.display()))
}

/// Greyscale then back to RGBA, keeping transparency
fn desaturate(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageLumaA8(image.to_luma_alpha8())
        .to_rgba8()
        .into()
}
