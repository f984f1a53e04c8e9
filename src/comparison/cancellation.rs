use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run-level cancellation signal, cheap to clone and share across threads.
///
/// Raising it stops new plugin invocations from being scheduled; in-flight
/// invocations are abandoned at their next poll.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
