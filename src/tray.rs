//! System tray via D-Bus StatusNotifier (ksni)
//!
//! The tray lives on its own thread with a current-thread tokio runtime. Other
//! threads talk to it through an unbounded channel of `TrayUpdate`s; menu
//! clicks come back as `TrayAction`s on a std channel.

use anyhow::{Context, Result};
use image::RgbaImage;
use ksni::TrayMethods;
use ksni::menu::{CheckmarkItem, StandardItem};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};

use crate::constants::tray::{ID, SHUTDOWN_TIMEOUT_MS, TITLE};
use crate::monitor::TrayDisplay;
use crate::notifier;

/// Menu entries selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Toggle,
    Settings,
    Quit,
}

enum TrayUpdate {
    Icon(RgbaImage),
    Monitoring(bool),
    Shutdown(mpsc::Sender<()>),
}

struct LayoutTray {
    icon: RgbaImage,
    monitoring: bool,
    actions: mpsc::Sender<TrayAction>,
}

impl LayoutTray {
    fn send(&self, action: TrayAction) {
        if self.actions.send(action).is_err() {
            warn!(action = ?action, "Tray action dropped, dispatcher is gone");
        }
    }
}

impl ksni::Tray for LayoutTray {
    fn id(&self) -> String {
        ID.to_string()
    }

    fn title(&self) -> String {
        TITLE.to_string()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![to_argb_icon(&self.icon)]
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        vec![
            CheckmarkItem {
                label: "Toggle On/Off".into(),
                checked: self.monitoring,
                activate: Box::new(|tray: &mut Self| tray.send(TrayAction::Toggle)),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Settings".into(),
                activate: Box::new(|tray: &mut Self| tray.send(TrayAction::Settings)),
                ..Default::default()
            }
            .into(),
            ksni::MenuItem::Separator,
            StandardItem {
                label: "Quit".into(),
                activate: Box::new(|tray: &mut Self| tray.send(TrayAction::Quit)),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// StatusNotifier pixmaps are ARGB32 in network byte order
fn to_argb_icon(image: &RgbaImage) -> ksni::Icon {
    let data = image
        .pixels()
        .flat_map(|pixel| {
            let [r, g, b, a] = pixel.0;
            [a, r, g, b]
        })
        .collect();
    ksni::Icon {
        width: image.width() as i32,
        height: image.height() as i32,
        data,
    }
}

/// Sending side of the tray thread
pub struct TrayService {
    updates: UnboundedSender<TrayUpdate>,
}

impl TrayService {
    /// Start the tray thread; menu clicks are delivered on `actions`
    pub fn spawn(actions: mpsc::Sender<TrayAction>) -> Result<Self> {
        let (tx, rx) = unbounded_channel();
        let tray = LayoutTray {
            icon: notifier::placeholder(),
            monitoring: true,
            actions,
        };

        thread::Builder::new()
            .name("tray".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(error = ?e, "Failed to build tray runtime");
                        return;
                    }
                };
                runtime.block_on(serve(tray, rx));
            })
            .context("Failed to spawn tray thread")?;

        Ok(Self { updates: tx })
    }

    /// Remove the tray icon, waiting a bounded time for the service to go away
    pub fn shutdown(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.updates.send(TrayUpdate::Shutdown(ack_tx)).is_err() {
            debug!("Tray already stopped");
            return;
        }
        match ack_rx.recv_timeout(Duration::from_millis(SHUTDOWN_TIMEOUT_MS)) {
            Ok(()) => info!("Tray shut down"),
            Err(e) => warn!(error = ?e, "Tray did not confirm shutdown"),
        }
    }

    /// Service whose tray thread has already exited
    #[cfg(test)]
    pub fn detached() -> Self {
        let (tx, _) = unbounded_channel();
        Self { updates: tx }
    }

    fn push(&self, update: TrayUpdate) {
        if self.updates.send(update).is_err() {
            debug!("Tray update dropped, tray thread is gone");
        }
    }
}

impl TrayDisplay for TrayService {
    fn show_icon(&self, icon: RgbaImage) {
        self.push(TrayUpdate::Icon(icon));
    }

    fn set_monitoring(&self, enabled: bool) {
        self.push(TrayUpdate::Monitoring(enabled));
    }
}

async fn serve(tray: LayoutTray, mut updates: UnboundedReceiver<TrayUpdate>) {
    let handle = match tray.spawn().await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = ?e, "Failed to register tray icon");
            return;
        }
    };
    info!("Tray icon registered");

    while let Some(update) = updates.recv().await {
        match update {
            TrayUpdate::Icon(icon) => {
                handle.update(move |tray: &mut LayoutTray| tray.icon = icon).await;
            }
            TrayUpdate::Monitoring(enabled) => {
                handle
                    .update(move |tray: &mut LayoutTray| tray.monitoring = enabled)
                    .await;
            }
            TrayUpdate::Shutdown(ack) => {
                handle.shutdown().await;
                let _ = ack.send(());
                break;
            }
        }
    }
}
