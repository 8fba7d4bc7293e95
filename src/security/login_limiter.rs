/// Login rate limiter
///
/// Process-wide in-memory limiter for authentication attempts, keyed by a
/// normalized login identifier. Failures are counted over a sliding window;
/// reaching the threshold locks the key out for a duration that doubles with
/// each consecutive lockout, capped at a configured maximum.
///
/// State is process-local and volatile: it resets on restart and is not
/// shared across horizontally scaled instances. That is an acknowledged
/// limitation of single-instance deployments; a multi-instance deployment
/// must swap in a shared store behind the same contract.
///
/// The limiter shares no state with the video subsystems and is consumed
/// in-process by the login flow, not over HTTP.
use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a `can_attempt` check.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptDecision {
    pub allowed: bool,
    pub wait_seconds: Option<u64>,
    pub message: Option<String>,
}

impl AttemptDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            wait_seconds: None,
            message: None,
        }
    }

    fn locked(wait: Duration) -> Self {
        let wait_seconds = wait.as_secs().max(1);
        Self {
            allowed: false,
            wait_seconds: Some(wait_seconds),
            message: Some(format!(
                "Too many failed attempts. Try again in {wait_seconds} seconds."
            )),
        }
    }
}

#[derive(Debug, Default)]
struct AttemptEntry {
    /// Failure instants within the sliding window, oldest first. Bounded:
    /// pruned on every failure and cleared when a lockout triggers.
    failures: Vec<Instant>,
    locked_until: Option<Instant>,
    /// Consecutive lockouts for this key; drives the escalation. Cleared
    /// only by a successful attempt or an administrative reset.
    lockouts: u32,
}

pub struct LoginRateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<String, AttemptEntry>>,
}

impl LoginRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an attempt for `key` is currently allowed.
    pub fn can_attempt(&self, key: &str) -> AttemptDecision {
        self.can_attempt_at(key, Instant::now())
    }

    /// Record the outcome of an attempt. Success clears all limiter state
    /// for the key, including the escalation counter.
    pub fn record_attempt(&self, key: &str, success: bool) {
        self.record_attempt_at(key, success, Instant::now());
    }

    /// Administrative override: drop all state for the key unconditionally.
    pub fn reset(&self, key: &str) {
        let mut entries = self.entries.lock().expect("limiter mutex poisoned");
        entries.remove(key);
    }

    /// Remaining lockout in seconds, `None` when the key is not locked.
    pub fn remaining_wait(&self, key: &str) -> Option<u64> {
        let decision = self.can_attempt(key);
        decision.wait_seconds
    }

    fn can_attempt_at(&self, key: &str, now: Instant) -> AttemptDecision {
        let entries = self.entries.lock().expect("limiter mutex poisoned");

        if let Some(entry) = entries.get(key) {
            if let Some(locked_until) = entry.locked_until {
                if locked_until > now {
                    return AttemptDecision::locked(locked_until - now);
                }
            }
        }

        AttemptDecision::allowed()
    }

    fn record_attempt_at(&self, key: &str, success: bool, now: Instant) {
        let mut entries = self.entries.lock().expect("limiter mutex poisoned");

        if success {
            entries.remove(key);
            return;
        }

        let window = Duration::from_secs(self.config.window_seconds);
        let entry = entries.entry(key.to_string()).or_default();

        entry
            .failures
            .retain(|failed_at| now.duration_since(*failed_at) < window);
        entry.failures.push(now);

        if entry.failures.len() >= self.config.max_failures as usize {
            entry.lockouts += 1;
            let lockout = self.lockout_duration(entry.lockouts);
            entry.locked_until = Some(now + lockout);
            entry.failures.clear();

            tracing::warn!(
                key,
                lockouts = entry.lockouts,
                lockout_seconds = lockout.as_secs(),
                "login key locked out"
            );
        }
    }

    /// Escalating lockout: base * 2^(n-1), bounded by the configured maximum.
    fn lockout_duration(&self, consecutive_lockouts: u32) -> Duration {
        let exponent = consecutive_lockouts.saturating_sub(1).min(32);
        let seconds = self
            .config
            .base_lockout_seconds
            .saturating_mul(1u64 << exponent)
            .min(self.config.max_lockout_seconds);

        Duration::from_secs(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> LoginRateLimiter {
        LoginRateLimiter::new(RateLimitConfig {
            max_failures: 3,
            window_seconds: 60,
            base_lockout_seconds: 30,
            max_lockout_seconds: 300,
        })
    }

    #[test]
    fn fresh_key_is_allowed() {
        let limiter = limiter();
        assert!(limiter.can_attempt("alice@example.com").allowed);
    }

    #[test]
    fn threshold_failures_trigger_lockout() {
        let limiter = limiter();
        let now = Instant::now();

        limiter.record_attempt_at("bob", false, now);
        limiter.record_attempt_at("bob", false, now);
        assert!(limiter.can_attempt_at("bob", now).allowed);

        limiter.record_attempt_at("bob", false, now);
        let decision = limiter.can_attempt_at("bob", now);
        assert!(!decision.allowed);
        assert!(decision.wait_seconds.unwrap() > 0);
        assert!(decision.message.is_some());
    }

    #[test]
    fn success_clears_state_immediately() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..3 {
            limiter.record_attempt_at("carol", false, now);
        }
        assert!(!limiter.can_attempt_at("carol", now).allowed);

        limiter.record_attempt_at("carol", true, now);
        assert!(limiter.can_attempt_at("carol", now).allowed);
    }

    #[test]
    fn failures_outside_window_are_evicted() {
        let limiter = limiter();
        let start = Instant::now();

        limiter.record_attempt_at("dave", false, start);
        limiter.record_attempt_at("dave", false, start);

        // Third failure lands after the first two have aged out.
        let later = start + Duration::from_secs(120);
        limiter.record_attempt_at("dave", false, later);

        assert!(limiter.can_attempt_at("dave", later).allowed);
    }

    #[test]
    fn lockout_expires_on_its_own() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..3 {
            limiter.record_attempt_at("erin", false, now);
        }
        assert!(!limiter.can_attempt_at("erin", now).allowed);

        let after = now + Duration::from_secs(31);
        assert!(limiter.can_attempt_at("erin", after).allowed);
    }

    #[test]
    fn second_lockout_is_strictly_longer() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..3 {
            limiter.record_attempt_at("frank", false, now);
        }
        let first = limiter.can_attempt_at("frank", now).wait_seconds.unwrap();

        // Wait out the first lockout, then fail through to a second one.
        let resumed = now + Duration::from_secs(first + 1);
        for _ in 0..3 {
            limiter.record_attempt_at("frank", false, resumed);
        }
        let second = limiter
            .can_attempt_at("frank", resumed)
            .wait_seconds
            .unwrap();

        assert!(second > first, "expected {second} > {first}");
    }

    #[test]
    fn escalation_is_capped() {
        let limiter = limiter();
        assert_eq!(limiter.lockout_duration(1), Duration::from_secs(30));
        assert_eq!(limiter.lockout_duration(2), Duration::from_secs(60));
        assert_eq!(limiter.lockout_duration(4), Duration::from_secs(240));
        assert_eq!(limiter.lockout_duration(5), Duration::from_secs(300));
        assert_eq!(limiter.lockout_duration(40), Duration::from_secs(300));
    }

    #[test]
    fn reset_clears_everything() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..3 {
            limiter.record_attempt_at("grace", false, now);
        }
        assert!(!limiter.can_attempt_at("grace", now).allowed);

        limiter.reset("grace");
        assert!(limiter.can_attempt_at("grace", now).allowed);
        assert_eq!(limiter.remaining_wait("grace"), None);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..3 {
            limiter.record_attempt_at("locked@example.com", false, now);
        }

        assert!(!limiter.can_attempt_at("locked@example.com", now).allowed);
        assert!(limiter.can_attempt_at("free@example.com", now).allowed);
    }
}
