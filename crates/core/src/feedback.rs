//! Fire-and-forget feedback signals (haptics in a mobile front end).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Strength of a feedback signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// A shot was added, edited or removed.
    Light,
    /// A hole was completed or a round started.
    Medium,
    /// A round was finalized.
    Success,
}

/// Receiver of feedback signals. Must not block.
pub trait Feedback {
    /// Deliver one signal.
    fn notify(&self, kind: FeedbackKind);
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn notify(&self, _kind: FeedbackKind) {}
}

/// Writes signals to the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn notify(&self, kind: FeedbackKind) {
        debug!(?kind, "feedback");
    }
}

/// Keeps every signal for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    signals: Arc<Mutex<Vec<FeedbackKind>>>,
}

impl RecordingFeedback {
    /// Signals received so far, oldest first.
    pub fn signals(&self) -> Vec<FeedbackKind> {
        self.signals.lock().clone()
    }
}

impl Feedback for RecordingFeedback {
    fn notify(&self, kind: FeedbackKind) {
        self.signals.lock().push(kind);
    }
}
