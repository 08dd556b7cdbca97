//! Per-cycle rate limiting with a timed lockout.
//!
//! The limiter cycles between two states for the lifetime of the
//! process: OPEN (admitting work) and LOCKED (cooldown pending). It
//! locks the instant the completion count reaches the limit and
//! reopens either when the cooldown timer fires or on manual reset.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::AdmissionError;
use crate::models::config::{COOLDOWN, CYCLE_LIMIT};

/// Snapshot of the current processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleState {
    /// Items completed since the last reset.
    pub processed_in_cycle: usize,
    /// Whether the cycle is locked pending cooldown.
    pub locked: bool,
}

/// Rate limiter owning the cycle state and the cooldown timer handle.
///
/// The state lives behind an `Arc<Mutex<_>>` shared only with the
/// spawned cooldown task; it is never ambient global storage.
pub struct RateLimiter {
    limit: usize,
    cooldown: Duration,
    state: Arc<Mutex<CycleState>>,
    timer: Option<JoinHandle<()>>,
}

impl RateLimiter {
    /// Create a limiter with an explicit limit and cooldown duration.
    pub fn new(limit: usize, cooldown: Duration) -> Self {
        Self {
            limit,
            cooldown,
            state: Arc::new(Mutex::new(CycleState::default())),
            timer: None,
        }
    }

    /// Pure admission check for a batch of `count` items.
    ///
    /// Succeeds iff the cycle is open and the batch fits in the
    /// remaining capacity. Nothing is mutated on rejection, so the
    /// check is idempotent.
    pub fn admit(&self, count: usize) -> Result<(), AdmissionError> {
        let state = self.state.lock();

        if state.locked {
            return Err(AdmissionError::Locked);
        }
        if state.processed_in_cycle + count > self.limit {
            return Err(AdmissionError::OverLimit {
                remaining: self.limit - state.processed_in_cycle,
            });
        }

        Ok(())
    }

    /// Record one completed item and return the new cycle count.
    ///
    /// The state flips to LOCKED atomically with the increment that
    /// reaches the limit; no admission can slip in between.
    pub fn record_completion(&self) -> usize {
        let mut state = self.state.lock();

        state.processed_in_cycle += 1;
        if state.processed_in_cycle >= self.limit && !state.locked {
            state.locked = true;
            info!(limit = self.limit, "cycle limit reached, locking");
        }

        state.processed_in_cycle
    }

    /// Arm the cooldown timer: after the fixed duration the cycle
    /// reopens with a zeroed count and `on_expire` runs. Re-arming
    /// cancels any previous timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm_cooldown<F>(&mut self, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel_timer();

        let state = Arc::clone(&self.state);
        let cooldown = self.cooldown;

        debug!(secs = cooldown.as_secs(), "arming cooldown timer");

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            *state.lock() = CycleState::default();
            info!("cooldown finished, cycle reopened");
            on_expire();
        }));
    }

    /// Manual reset: cancel any pending cooldown and reopen the cycle.
    /// Idempotent; resetting twice leaves the same zeroed state.
    pub fn reset(&mut self) {
        self.cancel_timer();
        *self.state.lock() = CycleState::default();
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Current cycle state.
    pub fn state(&self) -> CycleState {
        *self.state.lock()
    }

    /// Per-cycle item limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Cooldown duration applied after lockout.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(CYCLE_LIMIT, COOLDOWN)
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_admit_boundary() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.admit(3).is_ok());
        assert_eq!(limiter.admit(4), Err(AdmissionError::OverLimit { remaining: 3 }));

        limiter.record_completion();
        limiter.record_completion();

        assert!(limiter.admit(1).is_ok());
        assert_eq!(limiter.admit(2), Err(AdmissionError::OverLimit { remaining: 1 }));
    }

    #[test]
    fn test_rejection_mutates_nothing() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        limiter.record_completion();

        let before = limiter.state();
        assert!(limiter.admit(5).is_err());
        assert!(limiter.admit(5).is_err());
        assert_eq!(limiter.state(), before);
        assert!(limiter.admit(1).is_ok());
    }

    #[test]
    fn test_locks_exactly_at_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert_eq!(limiter.record_completion(), 1);
        assert!(!limiter.state().locked);

        assert_eq!(limiter.record_completion(), 2);
        assert!(limiter.state().locked);
        assert_eq!(limiter.admit(1), Err(AdmissionError::Locked));
    }

    #[test]
    fn test_manual_reset_is_idempotent() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.record_completion();
        assert!(limiter.state().locked);

        limiter.reset();
        let once = limiter.state();
        limiter.reset();

        assert_eq!(once, CycleState::default());
        assert_eq!(limiter.state(), once);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expiry_reopens_cycle() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.record_completion();
        assert!(limiter.state().locked);

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        limiter.arm_cooldown(move || flag.store(true, Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(limiter.state(), CycleState::default());
        assert!(limiter.admit(1).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reset_cancels_pending_cooldown() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.record_completion();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        limiter.arm_cooldown(move || flag.store(true, Ordering::SeqCst));

        limiter.reset();
        assert_eq!(limiter.state(), CycleState::default());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
