//! # Retry & Backoff Policy
//!
//! Tracks consecutive transient failures and the backoff delay the worker
//! loop waits out before its next automatic attempt.
//!
//! ## Overview
//!
//! The scheduler is owned by the worker task and mutated only from there.
//! Backoff grows linearly by a fixed step on each transient failure and is
//! reset only by a successful handshake, so the delay is monotonically
//! non-decreasing within one failure streak. Once the failure streak
//! reaches a threshold, the current session is presumed stale and the
//! worker rebuilds it instead of retrying the same action indefinitely.

use std::time::Duration;

/// Default increment added to the backoff delay per transient failure.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Default number of consecutive transient failures after which the
/// worker forces a re-handshake.
pub const DEFAULT_REHANDSHAKE_THRESHOLD: u32 = 3;

/// Tunable retry behavior.
///
/// The default preserves the reference behavior: linear growth with no
/// ceiling. Hosts that expect prolonged outages can opt into a cap via
/// [`max_backoff`](RetryPolicy::max_backoff).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Amount added to the backoff delay per transient failure.
    pub backoff_step: Duration,

    /// Upper bound for the backoff delay. `None` lets the delay grow
    /// without limit, matching the reference behavior.
    pub max_backoff: Option<Duration>,

    /// Consecutive transient failures after which the session is presumed
    /// stale and rebuilt.
    pub rehandshake_threshold: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_step: DEFAULT_BACKOFF_STEP,
            max_backoff: None,
            rehandshake_threshold: DEFAULT_REHANDSHAKE_THRESHOLD,
        }
    }
}

impl RetryPolicy {
    /// Validates the policy values.
    pub fn validate(&self) -> Result<(), String> {
        if self.backoff_step.is_zero() {
            return Err("Backoff step must be greater than zero".to_string());
        }
        if self.rehandshake_threshold == 0 {
            return Err("Re-handshake threshold must be greater than zero".to_string());
        }
        if let Some(cap) = self.max_backoff {
            if cap < self.backoff_step {
                return Err("Backoff ceiling must be at least one backoff step".to_string());
            }
        }
        Ok(())
    }
}

/// Consecutive-failure counter plus the computed backoff delay.
#[derive(Debug)]
pub(crate) struct RetryScheduler {
    policy: RetryPolicy,
    consecutive_failures: u32,
    backoff: Duration,
}

impl RetryScheduler {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Record a transient failure: bump the streak and grow the delay by
    /// one step (clamped to the ceiling when one is configured).
    pub(crate) fn on_transient_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let grown = self.backoff.saturating_add(self.policy.backoff_step);
        self.backoff = match self.policy.max_backoff {
            Some(cap) => grown.min(cap),
            None => grown,
        };
    }

    /// Record a successful handshake: the streak and the delay start over.
    pub(crate) fn on_success(&mut self) {
        self.consecutive_failures = 0;
        self.backoff = Duration::ZERO;
    }

    /// Whether the failure streak says the session should be rebuilt
    /// rather than retried again.
    pub(crate) fn should_force_rehandshake(&self) -> bool {
        self.consecutive_failures >= self.policy.rehandshake_threshold
    }

    /// The delay the wait phase must honor, or `None` when the loop may
    /// wait indefinitely for new work.
    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        if self.backoff.is_zero() {
            None
        } else {
            Some(self.backoff)
        }
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub(crate) fn backoff(&self) -> Duration {
        self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_monotonically() {
        let mut retry = RetryScheduler::new(RetryPolicy::default());
        assert_eq!(retry.next_deadline(), None);

        let mut previous = Duration::ZERO;
        for _ in 0..5 {
            retry.on_transient_failure();
            let current = retry.backoff();
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, Duration::from_secs(25));
    }

    #[test]
    fn test_success_resets_everything() {
        let mut retry = RetryScheduler::new(RetryPolicy::default());
        retry.on_transient_failure();
        retry.on_transient_failure();
        assert_eq!(retry.consecutive_failures(), 2);
        assert_eq!(retry.next_deadline(), Some(Duration::from_secs(10)));

        retry.on_success();
        assert_eq!(retry.consecutive_failures(), 0);
        assert_eq!(retry.next_deadline(), None);
    }

    #[test]
    fn test_rehandshake_threshold() {
        let mut retry = RetryScheduler::new(RetryPolicy::default());
        retry.on_transient_failure();
        retry.on_transient_failure();
        assert!(!retry.should_force_rehandshake());

        // Third consecutive failure forces a session rebuild.
        retry.on_transient_failure();
        assert!(retry.should_force_rehandshake());
    }

    #[test]
    fn test_backoff_ceiling_applied() {
        let policy = RetryPolicy {
            backoff_step: Duration::from_secs(5),
            max_backoff: Some(Duration::from_secs(12)),
            rehandshake_threshold: 3,
        };
        let mut retry = RetryScheduler::new(policy);

        retry.on_transient_failure();
        retry.on_transient_failure();
        retry.on_transient_failure();
        retry.on_transient_failure();
        assert_eq!(retry.backoff(), Duration::from_secs(12));
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut retry = RetryScheduler::new(RetryPolicy::default());
        for _ in 0..100 {
            retry.on_transient_failure();
        }
        assert_eq!(retry.backoff(), Duration::from_secs(500));
    }

    #[test]
    fn test_policy_validation() {
        assert!(RetryPolicy::default().validate().is_ok());

        let zero_step = RetryPolicy {
            backoff_step: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert!(zero_step.validate().is_err());

        let zero_threshold = RetryPolicy {
            rehandshake_threshold: 0,
            ..RetryPolicy::default()
        };
        assert!(zero_threshold.validate().is_err());

        let tiny_cap = RetryPolicy {
            max_backoff: Some(Duration::from_secs(1)),
            ..RetryPolicy::default()
        };
        assert!(tiny_cap.validate().is_err());
    }
}
