//! Clocks for write bookkeeping.
//!
//! Servers drop sessions that stay silent for too long (RFC 3501 allows
//! 30 minutes), so the connection remembers when it last wrote and
//! [`Connection::keepalive_due`](crate::Connection::keepalive_due) tells the
//! caller when a NOOP is needed. Tests drive a [`ManualClock`] instead of
//! waiting.
//!
//! ```
//! use postbox_imap::time::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let sent = clock.now();
//! clock.advance(Duration::from_secs(29 * 60));
//! assert_eq!(clock.since(sent), Duration::from_secs(29 * 60));
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Where the connection reads the time from.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Time passed since `earlier`, zero if `earlier` is in the future.
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that moves only when advanced.
#[derive(Debug)]
pub struct ManualClock(Mutex<Instant>);

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Frozen at the moment of creation.
    #[must_use]
    pub fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    /// Same clock behind an `Arc`, ready for
    /// [`Connection::with_clock`](crate::Connection::with_clock).
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_accumulates() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(10));
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.since(start), Duration::from_millis(10_500));
    }

    #[test]
    fn future_instants_give_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.since(clock.now() + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn shared_clock_moves_behind_trait_object() {
        let clock = ManualClock::shared();
        let dynamic: Arc<dyn Clock> = clock.clone();
        let start = dynamic.now();
        clock.advance(Duration::from_secs(90));
        assert_eq!(dynamic.since(start), Duration::from_secs(90));
        assert!(SystemClock.now() >= Instant::now() - Duration::from_secs(1));
    }
}
