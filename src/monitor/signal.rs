use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tells the concurrent offer producer to stop issuing new offers.
///
/// Cloned into both workers at construction. Only the monitor writes it;
/// the producer reads it before every offer. Writes use `Release` and reads
/// use `Acquire`, so a producer that sees the signal raised also sees
/// everything the monitor did before raising it.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    raised: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
