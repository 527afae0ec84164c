//! Keyboard layout data model shared by the registry, detector and monitor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an installed input layout (locale id)
///
/// Serialized transparently so it becomes a decimal string when used as a JSON map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(pub u16);

impl LayoutId {
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual cue configured for one layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Background color as `#RRGGBB`
    pub color: String,

    /// ISO-3166 alpha-2 country code of the tray flag, `None` for the generic logo
    pub icon: Option<String>,
}

impl LayoutConfig {
    pub fn new(color: impl Into<String>, icon: Option<String>) -> Self {
        Self {
            color: color.into(),
            icon,
        }
    }
}

/// Whole persisted document: layout id → visual cue
pub type Configuration = BTreeMap<LayoutId, LayoutConfig>;
