#![forbid(unsafe_code)]

mod color;
mod config;
mod constants;
mod detector;
mod events;
mod gui;
mod layout;
mod logging;
mod monitor;
mod notifier;
mod painter;
mod platform;
mod tray;

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::info;

use config::Registry;
use detector::LayoutDetector;
use events::EventDispatcher;
use gui::GuiCommand;
use monitor::{Monitor, MonitorSettings};
use notifier::IconRenderer;
use painter::{BackgroundPainter, RetryPolicy};
use platform::wallpaper::GnomeBackground;
use platform::x11::X11Session;
use platform::{DesktopBackground, InputLayouts};
use tray::TrayService;

/// Run the settings dialog over a snapshot and apply the result
fn open_settings(registry: &Registry, monitor: &Monitor, icons: &IconRenderer) {
    let snapshot = registry.begin_edit();
    let outcome = gui::manager::show(&snapshot, &icons.flag_codes());
    events::finish_settings(registry, monitor, snapshot, outcome);
}

fn main() -> Result<()> {
    let data_dir = config::data_dir();
    let log_path = logging::init(&data_dir)?;
    info!(log = %log_path.display(), data = %data_dir.display(), "layout-tint starting");

    let session = Arc::new(X11Session::connect()?);
    let layouts: Arc<dyn InputLayouts> = session.clone();
    let desktop: Arc<dyn DesktopBackground> = Arc::new(GnomeBackground::new(session.screen_size()));

    let detector = LayoutDetector::new(layouts.clone());
    let registry = Arc::new(Registry::load(
        config::config_path(),
        layouts,
        detector.installed_layouts(),
    ));
    let painter = BackgroundPainter::new(desktop, data_dir.clone(), RetryPolicy::default());
    let icons = IconRenderer::locate(&data_dir);
    info!(assets = %icons.assets_dir().display(), "Using icon assets");

    let (action_tx, action_rx) = mpsc::channel();
    let tray = Arc::new(TrayService::spawn(action_tx)?);

    let monitor = Arc::new(Monitor::new(
        detector,
        registry.clone(),
        painter,
        icons.clone(),
        tray.clone(),
        MonitorSettings::default(),
    ));
    monitor.spawn()?;

    let (gui_tx, gui_rx) = mpsc::channel();
    let settings_open = Arc::new(AtomicBool::new(false));
    EventDispatcher::new(monitor.clone(), tray, gui_tx, settings_open.clone()).spawn(action_rx)?;

    // The main thread owns the UI; it sleeps here until the tray asks for something
    for command in gui_rx {
        match command {
            GuiCommand::OpenSettings => {
                open_settings(&registry, &monitor, &icons);
                settings_open.store(false, Ordering::SeqCst);
            }
            GuiCommand::Quit => break,
        }
    }

    info!("UI loop finished");
    Ok(())
}
