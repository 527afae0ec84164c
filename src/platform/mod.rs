//! OS collaborators consumed by the detector, registry and painter
//!
//! Everything the core needs from the desktop goes through these two traits,
//! so the reconciliation algorithm never sees X11 or gsettings directly.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::layout::LayoutId;

pub mod locale;
pub mod wallpaper;
pub mod x11;

#[cfg(test)]
pub mod fake;

/// Keyboard layout queries
pub trait InputLayouts: Send + Sync {
    /// Every layout registered with the OS
    fn installed(&self) -> BTreeSet<LayoutId>;

    /// Layout of the window holding input focus, `None` when nothing is focused
    fn foreground(&self) -> Option<LayoutId>;

    /// Localized (native) language name for display
    fn language_name(&self, id: LayoutId) -> String;

    /// ISO-3166 alpha-2 country code, uppercase
    fn country_code(&self, id: LayoutId) -> Option<String>;
}

/// Desktop background access
pub trait DesktopBackground: Send + Sync {
    /// Path of the current background image, if one is set
    fn current(&self) -> Option<PathBuf>;

    /// Request a new background; returns whether the OS accepted it
    fn set(&self, path: &Path) -> bool;

    /// Screen size in pixels (width, height)
    fn screen_resolution(&self) -> (u32, u32);
}
