use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// cooperative cancellation flag (spec §5). cheap to clone and hand to an
/// external watchdog thread or timeout task; the driver polls it once
/// between sweeps and never blocks on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// signal cancellation. observable by every clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
