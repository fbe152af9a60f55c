// ── Engine state subscriptions ──
//
// What a status line or UI holds on to: the last `EngineState` it rendered
// plus a receiver for the next one.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::state::EngineState;

/// Handle returned by [`Dispatcher::state`](crate::Dispatcher::state).
///
/// Intermediate states may be skipped; a slow renderer only ever sees the
/// newest one.
pub struct StateStream {
    current: EngineState,
    receiver: watch::Receiver<EngineState>,
}

impl StateStream {
    pub(crate) fn new(mut receiver: watch::Receiver<EngineState>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The state this handle last handed out.
    pub fn current(&self) -> &EngineState {
        &self.current
    }

    /// Whatever the dispatcher published most recently, seen or not.
    pub fn latest(&self) -> EngineState {
        self.receiver.borrow().clone()
    }

    /// Next published state, or `None` once the dispatcher is gone.
    pub async fn changed(&mut self) -> Option<EngineState> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// First state (the current one included) satisfying `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&EngineState) -> bool,
    ) -> Option<EngineState> {
        let snap = self.receiver.wait_for(|s| predicate(s)).await.ok()?.clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// For `select!` loops such as `listen`.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// Engine states as a `Stream`, starting with the current one.
pub struct StateWatchStream {
    inner: WatchStream<EngineState>,
}

impl Stream for StateWatchStream {
    type Item = EngineState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
