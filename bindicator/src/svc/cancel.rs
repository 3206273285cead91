use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stops a long running loop from another thread.
///
/// Clones share the same flag. Once cancelled a token stays cancelled; use a
/// fresh token for the next run.
#[derive(Clone, Default, Debug)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
