//! Settings window (egui/eframe)

pub mod components;
pub mod constants;
pub mod manager;

/// Requests from the tray side to the UI loop on the main thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiCommand {
    OpenSettings,
    Quit,
}
