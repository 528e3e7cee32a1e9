use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Trailing-edge debouncer: of a burst of calls to [`Debouncer::settle`],
/// only the last one resolves to `true`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
