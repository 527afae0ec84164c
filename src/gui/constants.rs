//! GUI-specific constants for the settings window layout

/// Settings window dimensions
pub const WINDOW_WIDTH: f32 = 420.0;
pub const WINDOW_HEIGHT: f32 = 480.0;
pub const WINDOW_MIN_WIDTH: f32 = 360.0;
pub const WINDOW_MIN_HEIGHT: f32 = 240.0;

pub const WINDOW_TITLE: &str = "Keyboard Layout Colors";

/// Layout spacing
pub const PADDING: f32 = 8.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Width of the flag chooser drop-down
pub const FLAG_COMBO_WIDTH: f32 = 80.0;

pub const NO_FLAG_LABEL: &str = "None";
pub const NO_LAYOUTS_TEXT: &str = "No keyboard layouts detected.";
