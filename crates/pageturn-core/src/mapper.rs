// ── Input mapper ──
//
// Concurrent key-code -> command table with O(1) lookups and push-based
// change notification. Every mutation rebuilds the sorted snapshot that
// subscribers receive.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::command::LogicalCommand;
use crate::input::KeyCode;

/// Sorted, immutable view of the current bindings.
pub type MappingSnapshot = Arc<BTreeMap<KeyCode, LogicalCommand>>;

/// Runtime-configurable button bindings.
pub struct InputMapper {
    by_code: DashMap<KeyCode, LogicalCommand>,
    snapshot: watch::Sender<MappingSnapshot>,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::with_mappings(default_mappings())
    }
}

/// D-pad left/right turn pages; everything else starts unbound.
pub fn default_mappings() -> impl IntoIterator<Item = (KeyCode, LogicalCommand)> {
    [
        (KeyCode::DPAD_LEFT, LogicalCommand::PreviousPage),
        (KeyCode::DPAD_RIGHT, LogicalCommand::NextPage),
    ]
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table with no bindings.
    pub fn empty() -> Self {
        Self::with_mappings(std::iter::empty())
    }

    pub fn with_mappings(mappings: impl IntoIterator<Item = (KeyCode, LogicalCommand)>) -> Self {
        let by_code: DashMap<KeyCode, LogicalCommand> = mappings.into_iter().collect();
        let (snapshot, _) = watch::channel(Arc::new(BTreeMap::new()));
        let mapper = Self { by_code, snapshot };
        mapper.rebuild_snapshot();
        mapper
    }

    /// Look up the command bound to `code`. Unknown codes resolve to `None`.
    pub fn resolve(&self, code: KeyCode) -> Option<LogicalCommand> {
        self.by_code.get(&code).map(|r| *r.value())
    }

    /// Bind `code` to `command`, or remove its binding when `None`.
    pub fn set_mapping(&self, code: KeyCode, command: Option<LogicalCommand>) {
        match command {
            Some(cmd) => {
                debug!(%code, command = cmd.id(), "binding button");
                self.by_code.insert(code, cmd);
            }
            None => {
                debug!(%code, "unbinding button");
                self.by_code.remove(&code);
            }
        }
        self.rebuild_snapshot();
    }

    /// Drop every binding and restore the defaults.
    pub fn reset_defaults(&self) {
        self.by_code.clear();
        for (code, cmd) in default_mappings() {
            self.by_code.insert(code, cmd);
        }
        self.rebuild_snapshot();
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> MappingSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<MappingSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    fn rebuild_snapshot(&self) {
        let sorted: BTreeMap<KeyCode, LogicalCommand> = self
            .by_code
            .iter()
            .map(|r| (*r.key(), *r.value()))
            .collect();
        self.snapshot.send_replace(Arc::new(sorted));
    }
}
