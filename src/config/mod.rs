//! Configuration management for layout-tint
//!
//! - **registry**: the persisted layout → color/flag document and its edit protocol
//! - **data_dir**: where the document, log and generated wallpapers live

pub mod registry;

use std::path::PathBuf;

use crate::constants::paths;

pub use registry::{EditSnapshot, Registry};

/// Per-user data directory (`~/.keyboard_layout_colors`)
pub fn data_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(paths::DATA_DIR);
    path
}

pub fn config_path() -> PathBuf {
    data_dir().join(paths::CONFIG_FILENAME)
}
