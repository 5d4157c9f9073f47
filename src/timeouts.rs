//! Deadline scheduling for the engine's per-target timeouts.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::engine::EngineEvent;

/// Which deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    /// The settings surface never rendered a locatable primary control.
    SurfaceOpen,
    /// The confirmation dialog was never resolved after activation.
    Confirmation,
}

/// Schedules at most one pending deadline at a time, bound to the engine's
/// event channel.
///
/// Every schedule or cancel bumps a generation counter, and each fired
/// deadline carries the generation it was scheduled under. The engine drops
/// events with a stale generation, so a deadline can never observably fire
/// after it was cancelled.
pub(crate) struct DeadlineSupervisor {
    events: UnboundedSender<EngineEvent>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl DeadlineSupervisor {
    pub(crate) fn new(events: UnboundedSender<EngineEvent>) -> Self {
        Self {
            events,
            generation: 0,
            pending: None,
        }
    }

    /// Replace any pending deadline with a new one firing after `after`.
    pub(crate) fn schedule(&mut self, after: Duration, kind: DeadlineKind) {
        self.cancel();
        let generation = self.generation;
        let events = self.events.clone();
        trace!(?kind, generation, ?after, "deadline scheduled");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(EngineEvent::DeadlineElapsed { generation, kind });
        }));
    }

    /// Cancel the pending deadline, if any.
    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

impl Drop for DeadlineSupervisor {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
