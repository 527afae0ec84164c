//! In-memory platform doubles for unit tests

use parking_lot::Mutex;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{locale, DesktopBackground, InputLayouts};
use crate::layout::LayoutId;

/// Layout source replaying a scripted sequence of foreground readings
///
/// Each `foreground()` call pops the next reading; once the script runs out the
/// last reading repeats.
pub struct ScriptedLayouts {
    installed: BTreeSet<LayoutId>,
    script: Mutex<VecDeque<Option<LayoutId>>>,
    last: Mutex<Option<LayoutId>>,
    country_lookup: bool,
}

impl ScriptedLayouts {
    pub fn new(installed: &[u16]) -> Self {
        Self {
            installed: installed.iter().copied().map(LayoutId).collect(),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            country_lookup: true,
        }
    }

    pub fn with_script(self, readings: &[Option<u16>]) -> Self {
        self.push(readings);
        self
    }

    pub fn without_country_lookup(mut self) -> Self {
        self.country_lookup = false;
        self
    }

    pub fn push(&self, readings: &[Option<u16>]) {
        self.script
            .lock()
            .extend(readings.iter().map(|reading| reading.map(LayoutId)));
    }
}

impl InputLayouts for ScriptedLayouts {
    fn installed(&self) -> BTreeSet<LayoutId> {
        self.installed.clone()
    }

    fn foreground(&self) -> Option<LayoutId> {
        let mut last = self.last.lock();
        if let Some(next) = self.script.lock().pop_front() {
            *last = next;
        }
        *last
    }

    fn language_name(&self, id: LayoutId) -> String {
        locale::by_id(id)
            .map(|info| info.native_name.to_string())
            .unwrap_or_else(|| format!("Layout {id}"))
    }

    fn country_code(&self, id: LayoutId) -> Option<String> {
        if !self.country_lookup {
            return None;
        }
        locale::by_id(id).map(|info| info.country.to_string())
    }
}

/// Desktop that records every background request
pub struct RecordingDesktop {
    pub accept: bool,
    /// When set, `current()` keeps reporting this path regardless of `set`
    pub pinned: Option<PathBuf>,
    /// Time each `set` takes
    pub set_delay: Duration,
    current: Mutex<Option<PathBuf>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl RecordingDesktop {
    pub fn new(original: Option<&str>) -> Self {
        Self {
            accept: true,
            pinned: None,
            set_delay: Duration::ZERO,
            current: Mutex::new(original.map(PathBuf::from)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Desktop whose every `set` fails and whose background never changes
    pub fn failing(original: &str) -> Self {
        Self {
            accept: false,
            pinned: Some(PathBuf::from(original)),
            ..Self::new(Some(original))
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().clone()
    }
}

impl DesktopBackground for RecordingDesktop {
    fn current(&self) -> Option<PathBuf> {
        if let Some(pinned) = &self.pinned {
            return Some(pinned.clone());
        }
        self.current.lock().clone()
    }

    fn set(&self, path: &Path) -> bool {
        std::thread::sleep(self.set_delay);
        self.calls.lock().push(path.to_path_buf());
        if self.accept {
            *self.current.lock() = Some(path.to_path_buf());
        }
        self.accept
    }

    fn screen_resolution(&self) -> (u32, u32) {
        (8, 4)
    }
}
