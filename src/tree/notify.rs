use super::NodeId;

/// Receives change notifications from a `TreeStore`.
///
/// One observer per store. Calls are synchronous and best-effort; the
/// observer must not assume anything about how many mutations a single
/// `on_tree_changed` covers.
pub trait TreeObserver: Send {
    /// Fired once per flushed batch of mutations.
    fn on_tree_changed(&mut self) {}

    /// Fired on every activation outcome. `is_toggle` is true when only the
    /// expansion state changed.
    fn on_selection_changed(&mut self, _node: NodeId, _is_toggle: bool) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TreeObserver for NullObserver {}

/// A notification captured by `RecordingObserver`.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    TreeChanged,
    SelectionChanged { node: NodeId, is_toggle: bool },
}

/// Test observer that appends every notification to a shared log.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub log: std::sync::Arc<std::sync::Mutex<Vec<Recorded>>>,
}

#[cfg(test)]
impl RecordingObserver {
    pub fn events(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TreeObserver for RecordingObserver {
    fn on_tree_changed(&mut self) {
        self.log.lock().unwrap().push(Recorded::TreeChanged);
    }

    fn on_selection_changed(&mut self, node: NodeId, is_toggle: bool) {
        self.log
            .lock()
            .unwrap()
            .push(Recorded::SelectionChanged { node, is_toggle });
    }
}
