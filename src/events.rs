//! Tray action dispatch
//!
//! Runs on its own thread so slow work triggered from the menu (a toggle
//! restoring the wallpaper, the tray shutdown handshake) never blocks the
//! tray service or the UI loop.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::config::{EditSnapshot, Registry};
use crate::gui::GuiCommand;
use crate::layout::Configuration;
use crate::monitor::Monitor;
use crate::tray::{TrayAction, TrayService};

/// What the dispatcher loop does after handling an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct EventDispatcher {
    monitor: Arc<Monitor>,
    tray: Arc<TrayService>,
    gui: Sender<GuiCommand>,
    /// Set while the settings dialog is on screen; cleared by the UI loop
    settings_open: Arc<AtomicBool>,
}

impl EventDispatcher {
    pub fn new(
        monitor: Arc<Monitor>,
        tray: Arc<TrayService>,
        gui: Sender<GuiCommand>,
        settings_open: Arc<AtomicBool>,
    ) -> Self {
        Self {
            monitor,
            tray,
            gui,
            settings_open,
        }
    }

    pub fn handle(&self, action: TrayAction) -> Flow {
        match action {
            TrayAction::Toggle => {
                let enabled = self.monitor.toggle();
                info!(enabled, "Monitoring toggled from tray");
                Flow::Continue
            }
            TrayAction::Settings => {
                if self.settings_open.swap(true, Ordering::SeqCst) {
                    debug!("Settings already open, ignoring request");
                } else if self.gui.send(GuiCommand::OpenSettings).is_err() {
                    warn!("UI loop is gone, cannot open settings");
                    self.settings_open.store(false, Ordering::SeqCst);
                }
                Flow::Continue
            }
            TrayAction::Quit => {
                info!("Quit requested from tray menu");
                self.tray.shutdown();
                let _ = self.gui.send(GuiCommand::Quit);
                Flow::Exit
            }
        }
    }

    /// Handle actions until Quit, then terminate the process
    pub fn spawn(self, actions: Receiver<TrayAction>) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("tray-events".to_string())
            .spawn(move || {
                for action in actions {
                    if self.handle(action) == Flow::Exit {
                        std::process::exit(0);
                    }
                }
                debug!("Tray action channel closed");
            })
            .context("Failed to spawn event dispatcher thread")
    }
}

/// Settle an edit session with what the settings window returned
///
/// Save commits and re-applies the current layout; Cancel, close or a window
/// failure discard the snapshot. Returns whether the edit was committed.
pub fn finish_settings(
    registry: &Registry,
    monitor: &Monitor,
    snapshot: EditSnapshot,
    outcome: Result<Option<Configuration>>,
) -> bool {
    match outcome {
        Ok(Some(config)) => {
            let edited = EditSnapshot {
                config,
                names: snapshot.names,
            };
            if let Err(e) = registry.commit(edited) {
                error!(error = ?e, "Failed to save settings");
            }
            monitor.force();
            true
        }
        Ok(None) => {
            registry.discard(snapshot);
            false
        }
        Err(e) => {
            error!(error = ?e, "Settings window failed");
            registry.discard(snapshot);
            false
        }
    }
}
