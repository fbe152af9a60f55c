// ── Wire events ──
//
// KOReader exposes its internal event bus over HTTP as
// `/koreader/event/{Name}/{arg}`. Only the relative-page event is used.
// Paths are case-sensitive and must match exactly.

/// An event the reader understands, rendered to its request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteEvent {
    /// Move `n` pages relative to the current one (negative goes back).
    GotoViewRel(i32),
}

/// Path used by the reachability probe.
pub const PROBE_PATH: &str = "/";

impl RemoteEvent {
    pub fn path(self) -> String {
        match self {
            Self::GotoViewRel(delta) => format!("/koreader/event/GotoViewRel/{delta}"),
        }
    }
}
