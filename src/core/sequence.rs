use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic token issued per dashboard request; only the latest one may be applied.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}
