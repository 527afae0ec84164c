//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Data directory layout (under the user's home directory)
pub mod paths {
    /// Per-user data directory name
    pub const DATA_DIR: &str = ".keyboard_layout_colors";

    /// Persisted layout configuration document
    pub const CONFIG_FILENAME: &str = "layout_colors.json";

    /// Append-only application log
    pub const LOG_FILENAME: &str = "app.log";

    /// Asset directory name (searched next to the executable, then in the data dir)
    pub const ICONS_DIR: &str = "icons";

    /// Flag assets, one `<CODE>.png` per ISO-3166 alpha-2 code
    pub const FLAGS_SUBDIR: &str = "flags";

    /// Application logo assets
    pub const LOGO_SUBDIR: &str = "logo";
    pub const LOGO_FILENAME: &str = "app.png";
    pub const LOGO_DIMMED_FILENAME: &str = "app_grey.png";
}

/// Default color assignment for newly discovered layouts
pub mod palette {
    /// Ordered palette; the i-th discovered layout gets `DEFAULT_COLORS[i % len]`
    pub const DEFAULT_COLORS: [&str; 10] = [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
        "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
    ];
}

/// Reconciliation loop timing
pub mod monitor {
    /// Poll interval while monitoring is enabled
    pub const FAST_POLL_MS: u64 = 100;

    /// Poll interval while monitoring is disabled
    pub const SLOW_POLL_MS: u64 = 1000;

    /// Thread name for the polling loop
    pub const THREAD_NAME: &str = "layout-monitor";
}

/// Desktop background retry policy
pub mod wallpaper {
    /// Supervised attempts before giving up
    pub const SET_ATTEMPTS: u32 = 3;

    /// Fixed delay between failed attempts
    pub const RETRY_BACKOFF_MS: u64 = 500;

    /// gsettings schema holding the GNOME background
    pub const GNOME_SCHEMA: &str = "org.gnome.desktop.background";
    pub const PICTURE_URI_KEY: &str = "picture-uri";
    pub const PICTURE_URI_DARK_KEY: &str = "picture-uri-dark";
}

/// Tray icon constants
pub mod tray {
    /// Side length of rendered tray glyphs
    pub const ICON_SIZE: u32 = 32;

    /// Side length of the fallback glyph used when no asset can be loaded
    pub const PLACEHOLDER_SIZE: u32 = 16;

    pub const ID: &str = "keyboard-layout-color";
    pub const TITLE: &str = "Keyboard Layout Color";

    /// How long quit waits for the tray service to unregister
    pub const SHUTDOWN_TIMEOUT_MS: u64 = 500;
}

/// X11 protocol constants
pub mod x11 {
    /// Root window property describing the XKB rules, model, layouts, variants, options
    pub const XKB_RULES_NAMES: &[u8] = b"_XKB_RULES_NAMES";

    /// Root window property holding the focused client
    pub const NET_ACTIVE_WINDOW: &[u8] = b"_NET_ACTIVE_WINDOW";

    /// XKB protocol version requested on startup
    pub const XKB_MAJOR_VERSION: u16 = 1;
    pub const XKB_MINOR_VERSION: u16 = 0;
}

/// Logging defaults
pub mod logging {
    /// Environment variable selecting the log level
    pub const LEVEL_ENV: &str = "LOG_LEVEL";

    /// Level used when LOG_LEVEL is unset or unrecognised
    pub const DEFAULT_LEVEL: &str = "error";
}
