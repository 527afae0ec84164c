//! Settings dialog implemented with egui/eframe
//!
//! Shown modally on the main thread. eframe keeps its event loop between
//! `run_native` calls, so the dialog can be opened any number of times.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use eframe::{NativeOptions, egui};
use parking_lot::Mutex;
use tracing::info;

use super::components::layout_editor;
use super::constants::*;
use crate::config::EditSnapshot;
use crate::layout::{Configuration, LayoutId};

struct SettingsApp {
    config: Configuration,
    rows: Vec<(LayoutId, String)>,
    flag_codes: Vec<String>,
    dirty: bool,
    /// Written on Save; anything else leaves it empty
    outcome: Arc<Mutex<Option<Configuration>>>,
}

impl SettingsApp {
    fn new(snapshot: &EditSnapshot, flag_codes: &[String], outcome: Arc<Mutex<Option<Configuration>>>) -> Self {
        Self {
            config: snapshot.config.clone(),
            rows: layout_editor::sorted_layouts(&snapshot.names),
            flag_codes: flag_codes.to_vec(),
            dirty: false,
            outcome,
        }
    }

    fn save(&mut self, ctx: &egui::Context) {
        info!(changed = self.dirty, "Settings saved");
        *self.outcome.lock() = Some(self.config.clone());
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn cancel(&mut self, ctx: &egui::Context) {
        info!("Settings cancelled");
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

impl eframe::App for SettingsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("settings_actions").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    self.save(ctx);
                }
                if ui.button("Cancel").clicked() {
                    self.cancel(ctx);
                }
            });
            ui.add_space(ITEM_SPACING);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(PADDING);
            ui.heading(WINDOW_TITLE);
            ui.add_space(SECTION_SPACING);

            if layout_editor::ui(ui, &mut self.config, &self.rows, &self.flag_codes) {
                self.dirty = true;
            }
        });
    }
}

/// Show the settings window and block until it closes
///
/// Returns the edited configuration when the user saved, `None` on Cancel or
/// when the window was closed.
pub fn show(snapshot: &EditSnapshot, flag_codes: &[String]) -> Result<Option<Configuration>> {
    let outcome = Arc::new(Mutex::new(None));
    let app = SettingsApp::new(snapshot, flag_codes, outcome.clone());

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(WINDOW_TITLE, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|err| anyhow!("Failed to show settings window: {err}"))?;

    let saved = outcome.lock().take();
    Ok(saved)
}
