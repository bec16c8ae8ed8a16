//! In-memory login attempt limiter.
//!
//! Flow Overview:
//! 1) `begin` looks up the client record, resetting it if its window expired.
//! 2) If the failure count already reached the limit the client is blocked and
//!    nothing is recorded.
//! 3) Otherwise the attempt is counted as a failure up front and a permit is
//!    returned. The caller settles it: `fail` keeps the count, `succeed` clears
//!    the record, dropping it unsettled refunds the attempt.
//!
//! Counting up front means two concurrent requests cannot both observe a count
//! below the limit and both get through on the last free slot. A consequence
//! is that a record exists from the first attempt, not the first failure:
//! `succeed` removes it again, and a refunded permit can leave a record with a
//! zero count until its window expires or the sweep drops it.
//!
//! The window is fixed, anchored at the first attempt, not a sliding log: a
//! client can land one burst at the end of a window and another right after
//! it resets. State lives in this process only; it is lost on restart and is
//! not shared between instances.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("too many login attempts, retry in {}s", .retry_after.as_secs())]
pub struct RateLimited {
    pub retry_after: Duration,
}

#[derive(Clone, Copy, Debug)]
struct AttemptRecord {
    failure_count: u32,
    window_reset_at: Instant,
}

impl AttemptRecord {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            failure_count: 0,
            window_reset_at: now + window,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.window_reset_at <= now
    }
}

#[derive(Debug)]
pub struct LoginLimiter {
    attempts: DashMap<String, AttemptRecord>,
    max_attempts: u32,
    window: Duration,
}

impl LoginLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            window,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start a login attempt for `client_id`.
    ///
    /// # Errors
    /// Returns `RateLimited` when the client already used up its attempts in the
    /// current window. The record is left untouched in that case.
    pub fn begin(&self, client_id: &str) -> Result<AttemptPermit<'_>, RateLimited> {
        self.begin_at(client_id, Instant::now())
    }

    fn begin_at(&self, client_id: &str, now: Instant) -> Result<AttemptPermit<'_>, RateLimited> {
        // The entry guard holds the shard lock, so check-and-increment is atomic per key.
        let mut record = self
            .attempts
            .entry(client_id.to_string())
            .or_insert_with(|| AttemptRecord::fresh(now, self.window));

        if record.expired(now) {
            *record = AttemptRecord::fresh(now, self.window);
        }

        if record.failure_count >= self.max_attempts {
            return Err(RateLimited {
                retry_after: record.window_reset_at.saturating_duration_since(now),
            });
        }

        record.failure_count += 1;
        let window_reset_at = record.window_reset_at;
        drop(record);

        Ok(AttemptPermit {
            limiter: self,
            client_id: client_id.to_string(),
            window_reset_at,
            settled: false,
        })
    }

    /// Forget everything about `client_id`.
    pub fn reset(&self, client_id: &str) {
        self.attempts.remove(client_id);
    }

    /// Failures recorded for `client_id` in its current window.
    #[must_use]
    pub fn failure_count(&self, client_id: &str) -> u32 {
        self.failure_count_at(client_id, Instant::now())
    }

    fn failure_count_at(&self, client_id: &str, now: Instant) -> u32 {
        self.attempts
            .get(client_id)
            .filter(|record| !record.expired(now))
            .map_or(0, |record| record.failure_count)
    }

    /// Drop records whose window has passed.
    pub fn sweep_expired(&self) {
        self.sweep_expired_at(Instant::now());
    }

    fn sweep_expired_at(&self, now: Instant) {
        let before = self.attempts.len();
        self.attempts.retain(|_, record| !record.expired(now));
        let removed = before.saturating_sub(self.attempts.len());
        if removed > 0 {
            debug!("Swept {removed} expired login attempt records");
        }
    }

    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.attempts.len()
    }

    fn refund(&self, client_id: &str, window_reset_at: Instant) {
        if let Some(mut record) = self.attempts.get_mut(client_id) {
            // A record from a newer window is not ours to touch.
            if record.window_reset_at == window_reset_at {
                record.failure_count = record.failure_count.saturating_sub(1);
            }
        }
    }
}

/// An admitted login attempt, already counted as a failure.
#[must_use = "an unsettled permit refunds the attempt when dropped"]
#[derive(Debug)]
pub struct AttemptPermit<'a> {
    limiter: &'a LoginLimiter,
    client_id: String,
    window_reset_at: Instant,
    settled: bool,
}

impl AttemptPermit<'_> {
    /// The credentials were wrong; keep the failure on record.
    pub fn fail(mut self) {
        self.settled = true;
    }

    /// The credentials were right; clear the client's history.
    pub fn succeed(mut self) {
        self.settled = true;
        self.limiter.reset(&self.client_id);
    }
}

impl Drop for AttemptPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.limiter.refund(&self.client_id, self.window_reset_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const CLIENT: &str = "192.0.2.10";
    const WINDOW: Duration = Duration::from_secs(15 * 60);

    #[test]
    fn blocks_after_max_failures() {
        let limiter = LoginLimiter::new(5, WINDOW);
        let now = Instant::now();

        for _ in 0..5 {
            let permit = limiter.begin_at(CLIENT, now);
            assert!(permit.is_ok());
            if let Ok(permit) = permit {
                permit.fail();
            }
        }
        assert_eq!(limiter.failure_count_at(CLIENT, now), 5);

        let blocked = limiter.begin_at(CLIENT, now);
        assert!(matches!(blocked, Err(RateLimited { retry_after }) if retry_after == WINDOW));
        // Blocking does not count as another failure.
        assert_eq!(limiter.failure_count_at(CLIENT, now), 5);
    }

    #[test]
    fn success_resets_history() {
        let limiter = LoginLimiter::new(3, WINDOW);
        let now = Instant::now();

        for _ in 0..2 {
            if let Ok(permit) = limiter.begin_at(CLIENT, now) {
                permit.fail();
            }
        }
        assert_eq!(limiter.failure_count_at(CLIENT, now), 2);

        if let Ok(permit) = limiter.begin_at(CLIENT, now) {
            permit.succeed();
        }
        assert_eq!(limiter.failure_count_at(CLIENT, now), 0);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn unsettled_permit_is_refunded() {
        let limiter = LoginLimiter::new(2, WINDOW);
        let now = Instant::now();

        {
            let _permit = limiter.begin_at(CLIENT, now);
            assert_eq!(limiter.failure_count_at(CLIENT, now), 1);
        }
        assert_eq!(limiter.failure_count_at(CLIENT, now), 0);
    }

    #[test]
    fn window_expiry_reopens_the_client() {
        let limiter = LoginLimiter::new(1, WINDOW);
        let start = Instant::now();

        if let Ok(permit) = limiter.begin_at(CLIENT, start) {
            permit.fail();
        }
        assert!(limiter.begin_at(CLIENT, start + WINDOW / 2).is_err());

        let later = start + WINDOW + Duration::from_secs(1);
        assert_eq!(limiter.failure_count_at(CLIENT, later), 0);
        assert!(limiter.begin_at(CLIENT, later).is_ok());
    }

    #[test]
    fn clients_are_tracked_independently() {
        let limiter = LoginLimiter::new(1, WINDOW);
        let now = Instant::now();

        if let Ok(permit) = limiter.begin_at("198.51.100.1", now) {
            permit.fail();
        }
        assert!(limiter.begin_at("198.51.100.1", now).is_err());
        assert!(limiter.begin_at("198.51.100.2", now).is_ok());
    }

    #[test]
    fn refund_ignores_a_newer_window() {
        let limiter = LoginLimiter::new(3, WINDOW);
        let start = Instant::now();

        let stale = limiter.begin_at(CLIENT, start);
        let later = start + WINDOW + Duration::from_secs(1);
        if let Ok(permit) = limiter.begin_at(CLIENT, later) {
            permit.fail();
        }
        drop(stale);
        assert_eq!(limiter.failure_count_at(CLIENT, later), 1);
    }

    #[test]
    fn sweep_removes_only_expired_records() {
        let limiter = LoginLimiter::new(5, WINDOW);
        let start = Instant::now();

        if let Ok(permit) = limiter.begin_at("old", start) {
            permit.fail();
        }
        let later = start + WINDOW / 2;
        if let Ok(permit) = limiter.begin_at("new", later) {
            permit.fail();
        }

        limiter.sweep_expired_at(start + WINDOW + Duration::from_secs(1));
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(
            limiter.failure_count_at("new", start + WINDOW + Duration::from_secs(1)),
            1
        );
    }

    #[test]
    fn concurrent_attempts_never_exceed_the_limit() {
        let limiter = Arc::new(LoginLimiter::new(5, WINDOW));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || match limiter.begin(CLIENT) {
                    Ok(permit) => {
                        permit.fail();
                        true
                    }
                    Err(_) => false,
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 5);
        assert_eq!(limiter.failure_count(CLIENT), 5);
    }
}
