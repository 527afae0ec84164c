//! Layout registry: persisted per-layout colors and tray flags
//!
//! The whole configuration lives in one JSON document that is read once at
//! startup and rewritten (atomically, via rename) after every mutation.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::constants::palette::DEFAULT_COLORS;
use crate::layout::{Configuration, LayoutConfig, LayoutId};
use crate::platform::InputLayouts;

/// Working copy handed to the settings dialog
///
/// Edits never touch the live configuration until the snapshot is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub config: Configuration,
    /// Installed layouts and their localized names
    pub names: BTreeMap<LayoutId, String>,
}

pub struct Registry {
    path: PathBuf,
    layouts: Arc<dyn InputLayouts>,
    config: Mutex<Configuration>,
    names: Mutex<BTreeMap<LayoutId, String>>,
}

impl Registry {
    /// Load the configuration document and seed defaults for `installed`
    ///
    /// A missing or unreadable document yields an empty configuration.
    pub fn load(path: PathBuf, layouts: Arc<dyn InputLayouts>, installed: BTreeSet<LayoutId>) -> Self {
        let mut config = read_config(&path);

        info!(layouts = ?installed, "Installed keyboard layouts");

        let mut names = BTreeMap::new();
        let mut added = false;
        for id in installed {
            added |= insert_default(&mut config, layouts.as_ref(), id);
            names.insert(id, layouts.language_name(id));
        }

        let registry = Self {
            path,
            layouts,
            config: Mutex::new(config),
            names: Mutex::new(names),
        };

        if added {
            if let Err(e) = registry.save() {
                error!(error = ?e, "Failed to persist default layout colors");
            }
        }
        registry
    }

    /// Create the default entry for `id` if it has none; returns the entry
    pub fn ensure_default(&self, id: LayoutId) -> LayoutConfig {
        let mut config = self.config.lock();
        if insert_default(&mut config, self.layouts.as_ref(), id) {
            info!(layout = %id, config = ?config[&id], "Assigned default for new layout");
            if let Err(e) = write_config(&self.path, &config) {
                error!(error = ?e, layout = %id, "Failed to persist default for new layout");
            }
        }
        config[&id].clone()
    }

    pub fn color(&self, id: LayoutId) -> Option<String> {
        self.config.lock().get(&id).map(|entry| entry.color.clone())
    }

    pub fn icon(&self, id: LayoutId) -> Option<String> {
        self.config.lock().get(&id).and_then(|entry| entry.icon.clone())
    }

    /// Overwrite one layout's color, creating its default entry first
    #[allow(dead_code)] // settings edits go through `commit`
    pub fn set_color_default(&self, id: LayoutId, color: &str) -> Result<()> {
        let mut config = self.config.lock();
        insert_default(&mut config, self.layouts.as_ref(), id);
        if let Some(entry) = config.get_mut(&id) {
            entry.color = color.to_string();
        }
        write_config(&self.path, &config)
            .context(format!("Failed to save color for layout {id}"))
    }

    /// Overwrite one layout's flag, creating its default entry first
    #[allow(dead_code)] // settings edits go through `commit`
    pub fn set_icon_default(&self, id: LayoutId, icon: Option<String>) -> Result<()> {
        let mut config = self.config.lock();
        insert_default(&mut config, self.layouts.as_ref(), id);
        if let Some(entry) = config.get_mut(&id) {
            entry.icon = icon;
        }
        write_config(&self.path, &config)
            .context(format!("Failed to save icon for layout {id}"))
    }

    /// Swap in a complete configuration and persist it
    pub fn replace_all(&self, new_config: Configuration) -> Result<()> {
        let mut config = self.config.lock();
        *config = new_config;
        info!(layouts = config.len(), "Configuration replaced");
        write_config(&self.path, &config)
    }

    pub fn snapshot(&self) -> Configuration {
        self.config.lock().clone()
    }

    pub fn display_names(&self) -> BTreeMap<LayoutId, String> {
        self.names.lock().clone()
    }

    pub fn begin_edit(&self) -> EditSnapshot {
        EditSnapshot {
            config: self.snapshot(),
            names: self.display_names(),
        }
    }

    pub fn commit(&self, snapshot: EditSnapshot) -> Result<()> {
        self.replace_all(snapshot.config)
    }

    pub fn discard(&self, snapshot: EditSnapshot) {
        debug!(layouts = snapshot.config.len(), "Settings edit discarded");
    }

    pub fn save(&self) -> Result<()> {
        write_config(&self.path, &self.config.lock())
    }
}

/// Insert a palette/country default for `id`; false when an entry already exists
fn insert_default(config: &mut Configuration, layouts: &dyn InputLayouts, id: LayoutId) -> bool {
    if config.contains_key(&id) {
        return false;
    }
    let color = DEFAULT_COLORS[config.len() % DEFAULT_COLORS.len()];
    config.insert(id, LayoutConfig::new(color, layouts.country_code(id)));
    true
}

fn read_config(path: &Path) -> Configuration {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            info!(path = %path.display(), error = %e, "No layout configuration found, starting fresh");
            return Configuration::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            info!(path = %path.display(), error = %e, "Layout configuration unreadable, starting fresh");
            Configuration::new()
        }
    }
}

fn write_config(path: &Path, config: &Configuration) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create config directory: {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(config)
        .context("Failed to serialize layout configuration")?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .context(format!("Failed to write config file to {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .context(format!("Failed to move config file into place at {}", path.display()))?;
    Ok(())
}
