use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

pub const GEOCODE_QUIET_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    Fresh(T),
    /// A newer call arrived, either during the quiet period or while this
    /// one was in flight.
    Superseded,
}

impl<T> Debounced<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Debounced::Fresh(value) => Some(value),
            Debounced::Superseded => None,
        }
    }
}

/// Collapses bursts of calls into the last one after a quiet period.
///
/// Every call takes a generation number. A call only runs if no newer call
/// arrived while it waited, and its output is only handed back if no newer
/// call arrived while it ran.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn run<F, Fut, T>(&self, task: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.quiet).await;
        if self.generation() != ticket {
            debug!(ticket, "debounced call superseded before running");
            return Debounced::Superseded;
        }

        let output = task().await;
        if self.generation() != ticket {
            debug!(ticket, "discarding stale response");
            return Debounced::Superseded;
        }
        Debounced::Fresh(output)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(GEOCODE_QUIET_PERIOD)
    }
}
