use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

use crate::layout::LayoutId;
use crate::platform::InputLayouts;

/// Reports the layout of the focused window, holding the last reading while nothing has focus
pub struct LayoutDetector {
    layouts: Arc<dyn InputLayouts>,
    last: Mutex<Option<LayoutId>>,
}

impl LayoutDetector {
    pub fn new(layouts: Arc<dyn InputLayouts>) -> Self {
        Self {
            layouts,
            last: Mutex::new(None),
        }
    }

    /// Current layout, or the previous reading when no window has focus
    ///
    /// `None` only until the first successful reading.
    pub fn current_layout(&self) -> Option<LayoutId> {
        let mut last = self.last.lock();
        match self.layouts.foreground() {
            Some(id) => *last = Some(id),
            None => trace!(last = ?*last, "No foreground window, keeping last layout"),
        }
        *last
    }

    pub fn installed_layouts(&self) -> BTreeSet<LayoutId> {
        self.layouts.installed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::ScriptedLayouts;

    #[test]
    fn test_no_focus_before_first_reading() {
        let detector = LayoutDetector::new(Arc::new(ScriptedLayouts::new(&[]).with_script(&[None])));
        assert_eq!(detector.current_layout(), None);
    }

    #[test]
    fn test_no_focus_keeps_previous_layout() {
        let layouts = ScriptedLayouts::new(&[1033, 1036])
            .with_script(&[Some(1033), None, None, Some(1036), None]);
        let detector = LayoutDetector::new(Arc::new(layouts));

        let readings: Vec<_> = (0..5).map(|_| detector.current_layout()).collect();
        assert_eq!(
            readings,
            vec![
                Some(LayoutId(1033)),
                Some(LayoutId(1033)),
                Some(LayoutId(1033)),
                Some(LayoutId(1036)),
                Some(LayoutId(1036)),
            ]
        );
    }

    #[test]
    fn test_installed_layouts_passthrough() {
        let detector = LayoutDetector::new(Arc::new(ScriptedLayouts::new(&[1036, 1033])));
        let installed: Vec<_> = detector.installed_layouts().into_iter().collect();
        assert_eq!(installed, vec![LayoutId(1033), LayoutId(1036)]);
    }
}
