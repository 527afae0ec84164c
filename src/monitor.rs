//! Reconciliation loop
//!
//! Polls the detector, and whenever the reported layout differs from the last
//! one (or a re-apply is forced) paints the configured background and swaps the
//! tray glyph. Monitoring can be paused by the user: the loop keeps ticking at a
//! slower rate but skips detection until re-enabled.

use anyhow::{Context, Result};
use image::RgbaImage;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Registry;
use crate::constants::monitor::{FAST_POLL_MS, SLOW_POLL_MS, THREAD_NAME};
use crate::detector::LayoutDetector;
use crate::layout::LayoutId;
use crate::notifier::IconRenderer;
use crate::painter::BackgroundPainter;

/// Where the loop sends tray updates
pub trait TrayDisplay: Send + Sync {
    fn show_icon(&self, icon: RgbaImage);

    /// Reflect the monitoring state in the tray menu checkmark
    fn set_monitoring(&self, enabled: bool);
}

/// Poll timing; swap these for an event source later without touching the algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub fast_poll: Duration,
    pub slow_poll: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            fast_poll: Duration::from_millis(FAST_POLL_MS),
            slow_poll: Duration::from_millis(SLOW_POLL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    pub current_layout: Option<LayoutId>,
    pub monitoring_enabled: bool,
    pub poll_interval: Duration,
}

pub struct Monitor {
    detector: LayoutDetector,
    registry: Arc<Registry>,
    painter: BackgroundPainter,
    icons: IconRenderer,
    tray: Arc<dyn TrayDisplay>,
    settings: MonitorSettings,
    state: Mutex<MonitorState>,
    /// Held while the desktop and tray are changed; never taken inside `state`
    paint: Mutex<()>,
    running: AtomicBool,
}

impl Monitor {
    pub fn new(
        detector: LayoutDetector,
        registry: Arc<Registry>,
        painter: BackgroundPainter,
        icons: IconRenderer,
        tray: Arc<dyn TrayDisplay>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            detector,
            registry,
            painter,
            icons,
            tray,
            settings,
            state: Mutex::new(MonitorState {
                current_layout: None,
                monitoring_enabled: true,
                poll_interval: settings.fast_poll,
            }),
            paint: Mutex::new(()),
            running: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state.lock().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().monitoring_enabled
    }

    /// One poll: detect and reconcile unless monitoring is paused
    pub fn tick(&self) -> bool {
        self.check(false)
    }

    /// Re-apply the configuration for the current layout even if it did not change
    ///
    /// Does nothing while paused; re-enabling re-applies anyway.
    pub fn force(&self) -> bool {
        self.check(true)
    }

    pub fn toggle(&self) -> bool {
        let state = self.state.lock();
        let enabled = !state.monitoring_enabled;
        self.switch(state, enabled);
        enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        let state = self.state.lock();
        if state.monitoring_enabled != enabled {
            self.switch(state, enabled);
        }
    }

    /// Start the polling loop on its own thread
    ///
    /// The thread is never joined by the application; process exit tears it down.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let monitor = Arc::clone(self);
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || monitor.run())
            .context("Failed to spawn monitor thread")
    }

    /// Make the loop return after its current sleep
    #[allow(dead_code)] // the application exits with the process instead
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn run(&self) {
        info!("Layout monitor started");
        self.tray.show_icon(self.icons.render_or_placeholder(None, false));

        while self.running.load(Ordering::SeqCst) {
            self.tick();
            let interval = self.state.lock().poll_interval;
            thread::sleep(interval);
        }
        info!("Layout monitor stopped");
    }

    fn check(&self, force: bool) -> bool {
        {
            let mut state = self.state.lock();
            if !state.monitoring_enabled || !self.detect_locked(&mut state, force) {
                return false;
            }
        }
        self.reconcile(false)
    }

    /// Flip the monitoring flag, then bring desktop and tray in line outside the state lock
    ///
    /// Re-enabling shows the current layout's flag rather than the generic logo,
    /// so the tray always names the layout being painted.
    fn switch(&self, mut state: MutexGuard<'_, MonitorState>, enabled: bool) {
        state.monitoring_enabled = enabled;
        info!(enabled, "Monitoring toggled");

        if enabled {
            state.poll_interval = self.settings.fast_poll;
            self.detect_locked(&mut state, true);
            drop(state);
            self.reconcile(true);
        } else {
            state.poll_interval = self.settings.slow_poll;
            drop(state);
            self.pause();
        }
    }

    /// Record the detected layout; true when it changed or `force` is set
    fn detect_locked(&self, state: &mut MonitorState, force: bool) -> bool {
        let detected = self.detector.current_layout();
        if detected.is_some() && detected != state.current_layout {
            info!(from = ?state.current_layout, to = ?detected, "Keyboard layout changed");
            state.current_layout = detected;
            true
        } else if force {
            debug!(layout = ?state.current_layout, "Forced re-apply");
            true
        } else {
            false
        }
    }

    /// Paint the latest recorded layout unless monitoring was paused meanwhile
    fn reconcile(&self, resumed: bool) -> bool {
        let _paint = self.paint.lock();
        let layout = {
            let state = self.state.lock();
            if !state.monitoring_enabled {
                debug!("Monitoring paused before reconcile, skipping");
                return false;
            }
            state.current_layout
        };

        if resumed {
            self.tray.set_monitoring(true);
        }
        self.apply(layout);
        true
    }

    fn pause(&self) {
        let _paint = self.paint.lock();
        if self.state.lock().monitoring_enabled {
            debug!("Monitoring resumed before pause took effect, skipping");
            return;
        }
        self.painter.restore_original();
        self.tray.set_monitoring(false);
        self.tray.show_icon(self.icons.render_or_placeholder(None, true));
    }

    fn apply(&self, layout: Option<LayoutId>) {
        let icon = layout.and_then(|id| {
            self.registry.ensure_default(id);
            if let Some(color) = self.registry.color(id) {
                self.painter.apply_color(&color, id);
            }
            self.registry.icon(id)
        });
        self.tray.show_icon(self.icons.render_or_placeholder(icon.as_deref(), false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::RetryPolicy;
    use crate::platform::fake::{RecordingDesktop, ScriptedLayouts};
    use std::path::PathBuf;

    const A: u16 = 1033;
    const B: u16 = 1036;
    const ORIGINAL: &str = "/home/user/bg.jpg";

    #[derive(Default)]
    struct RecordingTray {
        icons: Mutex<usize>,
        monitoring: Mutex<Vec<bool>>,
    }

    impl TrayDisplay for RecordingTray {
        fn show_icon(&self, _icon: RgbaImage) {
            *self.icons.lock() += 1;
        }

        fn set_monitoring(&self, enabled: bool) {
            self.monitoring.lock().push(enabled);
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        layouts: Arc<ScriptedLayouts>,
        desktop: Arc<RecordingDesktop>,
        tray: Arc<RecordingTray>,
        monitor: Arc<Monitor>,
    }

    impl Harness {
        fn new(installed: &[u16], script: &[Option<u16>]) -> Self {
            Self::with_desktop(installed, script, RecordingDesktop::new(Some(ORIGINAL)))
        }

        fn with_desktop(installed: &[u16], script: &[Option<u16>], desktop: RecordingDesktop) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let layouts = Arc::new(ScriptedLayouts::new(installed).with_script(script));
            let desktop = Arc::new(desktop);
            let tray = Arc::new(RecordingTray::default());

            let detector = LayoutDetector::new(layouts.clone());
            let registry = Arc::new(Registry::load(
                dir.path().join("layout_colors.json"),
                layouts.clone(),
                detector.installed_layouts(),
            ));
            let painter = BackgroundPainter::new(
                desktop.clone(),
                dir.path().to_path_buf(),
                RetryPolicy { attempts: 3, backoff: Duration::ZERO },
            );
            let monitor = Arc::new(Monitor::new(
                detector,
                registry,
                painter,
                IconRenderer::new(dir.path().join("no-icons")),
                tray.clone(),
                MonitorSettings {
                    fast_poll: Duration::from_millis(1),
                    slow_poll: Duration::from_millis(5),
                },
            ));

            Self { _dir: dir, layouts, desktop, tray, monitor }
        }

        fn paints(&self) -> Vec<PathBuf> {
            self.desktop.calls()
        }

        fn restores(&self) -> usize {
            self.paints().iter().filter(|path| *path == &PathBuf::from(ORIGINAL)).count()
        }
    }

    #[test]
    fn test_fires_only_on_changes() {
        let h = Harness::new(&[A, B], &[Some(A), Some(A), Some(B), Some(B), Some(A)]);

        let fired = (0..5).filter(|_| h.monitor.tick()).count();

        assert_eq!(fired, 3);
        assert_eq!(*h.tray.icons.lock(), 3);
        assert_eq!(h.paints().len(), 3);
        assert_eq!(h.monitor.state().current_layout, Some(LayoutId(A)));
    }

    #[test]
    fn test_no_focus_keeps_current_layout() {
        let h = Harness::new(&[A, B], &[Some(A), None, None, Some(B)]);

        let fired: Vec<bool> = (0..4).map(|_| h.monitor.tick()).collect();

        assert_eq!(fired, vec![true, false, false, true]);
        assert_eq!(h.monitor.state().current_layout, Some(LayoutId(B)));
    }

    #[test]
    fn test_nothing_fires_before_first_reading() {
        let h = Harness::new(&[A], &[None, None]);

        assert!(!h.monitor.tick());
        assert!(!h.monitor.tick());
        assert_eq!(h.monitor.state().current_layout, None);
        assert!(h.paints().is_empty());
    }

    #[test]
    fn test_paints_configured_color() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();

        let painted = h.paints();
        assert_eq!(painted.len(), 1);
        assert!(painted[0].ends_with("1033_1f77b4.png"));
    }

    #[test]
    fn test_unknown_layout_gets_lazy_default() {
        // Layout never reported by enumeration
        let h = Harness::new(&[A], &[Some(1049)]);
        h.monitor.tick();

        assert_eq!(h.monitor.registry.color(LayoutId(1049)).as_deref(), Some("#ff7f0e"));
        assert!(h.paints()[0].ends_with("1049_ff7f0e.png"));
    }

    #[test]
    fn test_force_reapplies_unchanged_layout() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();
        h.monitor
            .registry
            .set_color_default(LayoutId(A), "#000000")
            .unwrap();

        assert!(!h.monitor.tick());
        h.monitor.force();

        let painted = h.paints();
        assert_eq!(painted.len(), 2);
        assert!(painted[1].ends_with("1033_000000.png"));
    }

    #[test]
    fn test_force_while_paused_leaves_desktop_alone() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();
        h.monitor.set_enabled(false);
        let paints = h.paints();
        let icons = *h.tray.icons.lock();

        h.monitor
            .registry
            .set_color_default(LayoutId(A), "#000000")
            .unwrap();
        assert!(!h.monitor.force());

        assert_eq!(h.paints(), paints);
        assert_eq!(*h.tray.icons.lock(), icons);
        assert!(!h.monitor.is_enabled());

        // The new color shows up once monitoring resumes
        h.monitor.set_enabled(true);
        assert!(h.paints().last().unwrap().ends_with("1033_000000.png"));
    }

    #[test]
    fn test_force_without_any_layout_shows_logo_only() {
        let h = Harness::new(&[], &[None]);
        h.monitor.force();

        assert_eq!(*h.tray.icons.lock(), 1);
        assert!(h.paints().is_empty());
    }

    #[test]
    fn test_disable_restores_once_and_stops_painting() {
        let h = Harness::new(&[A, B], &[Some(A)]);
        h.monitor.tick();

        h.monitor.set_enabled(false);
        h.monitor.set_enabled(false);
        assert_eq!(h.restores(), 1);

        h.layouts.push(&[Some(B), Some(B)]);
        assert!(!h.monitor.tick());
        assert!(!h.monitor.tick());

        let state = h.monitor.state();
        assert!(!state.monitoring_enabled);
        assert_eq!(state.poll_interval, Duration::from_millis(5));
        // One paint for A, one restore, nothing else
        assert_eq!(h.paints().len(), 2);
        assert_eq!(*h.tray.monitoring.lock(), vec![false]);
    }

    #[test]
    fn test_enable_reconciles_exactly_once() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();
        h.monitor.set_enabled(false);
        let before = h.paints().len();

        // Same layout as before pausing, still re-applied once
        h.monitor.set_enabled(true);
        assert_eq!(h.paints().len(), before + 1);
        assert!(h.paints().last().unwrap().ends_with("1033_1f77b4.png"));

        assert!(!h.monitor.tick());
        assert_eq!(h.paints().len(), before + 1);

        let state = h.monitor.state();
        assert!(state.monitoring_enabled);
        assert_eq!(state.poll_interval, Duration::from_millis(1));
        assert_eq!(*h.tray.monitoring.lock(), vec![false, true]);
    }

    #[test]
    fn test_enable_shows_layout_glyph_once() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();
        h.monitor.set_enabled(false);
        let icons = *h.tray.icons.lock();

        h.monitor.set_enabled(true);
        // Layout glyph only, no generic logo on top of it
        assert_eq!(*h.tray.icons.lock(), icons + 1);
    }

    #[test]
    fn test_concurrent_toggles_all_take_effect() {
        let h = Harness::new(&[A], &[Some(A)]);
        h.monitor.tick();

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let monitor = Arc::clone(&h.monitor);
                thread::spawn(move || {
                    for _ in 0..10 {
                        monitor.toggle();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // 20 flips land back on enabled, and the tray agrees
        assert!(h.monitor.is_enabled());
        assert_eq!(h.tray.monitoring.lock().last(), Some(&true));
        assert_eq!(h.monitor.state().poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_state_readable_while_painting() {
        let mut desktop = RecordingDesktop::new(Some(ORIGINAL));
        desktop.set_delay = Duration::from_millis(300);
        let h = Harness::with_desktop(&[A], &[Some(A)], desktop);

        let monitor = Arc::clone(&h.monitor);
        let painter = thread::spawn(move || monitor.tick());
        thread::sleep(Duration::from_millis(50));

        let started = std::time::Instant::now();
        assert!(h.monitor.is_enabled());
        assert_eq!(h.monitor.state().current_layout, Some(LayoutId(A)));
        assert!(started.elapsed() < Duration::from_millis(150));

        assert!(painter.join().unwrap());
    }

    #[test]
    fn test_enable_picks_up_change_made_while_paused() {
        let h = Harness::new(&[A, B], &[Some(A)]);
        h.monitor.tick();
        h.monitor.set_enabled(false);
        h.layouts.push(&[Some(B)]);

        assert!(h.monitor.toggle());
        assert_eq!(h.monitor.state().current_layout, Some(LayoutId(B)));
        assert!(h.paints().last().unwrap().ends_with("1036_ff7f0e.png"));
    }

    #[test]
    fn test_spawned_loop_stops() {
        let h = Harness::new(&[A, B], &[Some(A), Some(B)]);
        let handle = h.monitor.spawn().unwrap();

        thread::sleep(Duration::from_millis(50));
        h.monitor.stop();
        handle.join().unwrap();

        assert_eq!(h.monitor.state().current_layout, Some(LayoutId(B)));
        // Startup logo plus one glyph per change
        assert_eq!(*h.tray.icons.lock(), 3);
    }
}
