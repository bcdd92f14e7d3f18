//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

/// Cooperative cancellation signal shared between the search driver, the oracle adapter and whoever may stop them.
///
/// The flag only ever goes from clear to set. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token which is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            warn!("cancellation requested");
        }
    }

    /// Whether [`Self::cancel`] was called on this token or any clone of it.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancel this token once `budget` has elapsed, from a detached watchdog thread.
    pub fn cancel_after(&self, budget: Duration) {
        let deadline = Instant::now() + budget;
        let token = self.clone();
        thread::spawn(move || {
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
            token.cancel();
        });
    }
}
