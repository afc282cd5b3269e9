//! Progress reporting for generation calls.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressKind {
    /// The first attempt is about to be sent.
    Started { max_attempts: u32 },
    /// A rate limit was hit; the call sleeps for `delay` before `next_attempt` (1-based).
    Retrying {
        delay: Duration,
        next_attempt: u32,
        max_attempts: u32,
    },
}

/// A status update for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Identifies the call, so concurrent calls can share one display.
    pub call_id: Uuid,
    pub timestamp: DateTime<Local>,
    pub kind: ProgressKind,
}

impl ProgressEvent {
    pub fn new(call_id: Uuid, kind: ProgressKind) -> Self {
        Self {
            call_id,
            timestamp: Local::now(),
            kind,
        }
    }

    /// Retry delay rounded up to whole seconds.
    pub fn retry_seconds(&self) -> Option<u64> {
        match self.kind {
            ProgressKind::Retrying { delay, .. } => {
                Some(u64::try_from(delay.as_millis().div_ceil(1000)).unwrap_or(u64::MAX))
            }
            ProgressKind::Started { .. } => None,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ProgressKind::Started { .. } => write!(f, "Generating..."),
            ProgressKind::Retrying {
                next_attempt,
                max_attempts,
                ..
            } => write!(
                f,
                "AI is busy. Retrying in {}s... (Attempt {}/{})",
                self.retry_seconds().unwrap_or_default(),
                next_attempt,
                max_attempts
            ),
        }
    }
}

/// Receives progress events. Must not fail or block; the retry loop
/// ignores whatever happens inside.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events into a channel. A closed receiver is ignored.
impl ProgressObserver for mpsc::UnboundedSender<ProgressEvent> {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
