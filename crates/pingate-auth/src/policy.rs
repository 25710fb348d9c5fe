//! Escalating lockout policy.
//!
//! Failures are grouped into repeating cycles of `increment` attempts. The
//! threshold table says which attempt numbers lock and for how long; past the
//! end of the table every cycle boundary re-applies the largest penalty.

use std::num::NonZeroU32;

use pingate_core::config::LockoutConfig;
use serde::Serialize;

use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Threshold {
    pub attempt_count: u32,
    pub penalty_secs: u64,
}

/// Validated threshold table. Immutable once built.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    increment: NonZeroU32,
    thresholds: Vec<Threshold>,
}

impl ThresholdRule {
    /// Validate and build. Attempt counts must be positive and strictly
    /// increasing; penalties positive and non-decreasing.
    pub fn new(increment: u32, thresholds: Vec<Threshold>) -> AuthResult<Self> {
        let increment = NonZeroU32::new(increment).ok_or_else(|| {
            AuthError::PolicyMisconfiguration("increment must be greater than zero".into())
        })?;
        if thresholds.is_empty() {
            return Err(AuthError::PolicyMisconfiguration(
                "at least one threshold is required".into(),
            ));
        }

        let mut previous: Option<&Threshold> = None;
        for t in &thresholds {
            if t.attempt_count == 0 {
                return Err(AuthError::PolicyMisconfiguration(
                    "threshold attempt count must be greater than zero".into(),
                ));
            }
            if t.penalty_secs == 0 {
                return Err(AuthError::PolicyMisconfiguration(format!(
                    "threshold at attempt {} has a zero penalty",
                    t.attempt_count
                )));
            }
            if let Some(prev) = previous {
                if t.attempt_count <= prev.attempt_count {
                    return Err(AuthError::PolicyMisconfiguration(format!(
                        "attempt counts must strictly increase ({} after {})",
                        t.attempt_count, prev.attempt_count
                    )));
                }
                if t.penalty_secs < prev.penalty_secs {
                    return Err(AuthError::PolicyMisconfiguration(format!(
                        "penalty at attempt {} ({}s) is shorter than at attempt {} ({}s)",
                        t.attempt_count, t.penalty_secs, prev.attempt_count, prev.penalty_secs
                    )));
                }
            }
            previous = Some(t);
        }

        Ok(Self {
            increment,
            thresholds,
        })
    }

    pub fn from_config(config: &LockoutConfig) -> AuthResult<Self> {
        let thresholds = config
            .thresholds
            .iter()
            .map(|t| Threshold {
                attempt_count: t.attempts,
                penalty_secs: t.penalty_secs,
            })
            .collect();
        Self::new(config.increment, thresholds)
    }

    pub fn increment(&self) -> u32 {
        self.increment.get()
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }
}

/// What a failure count calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PenaltyDecision {
    None,
    /// The next failure locks the user out.
    WarnOneMoreAttempt,
    Lock(u64),
}

#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    rule: ThresholdRule,
}

impl LockoutPolicy {
    pub fn new(rule: ThresholdRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &ThresholdRule {
        &self.rule
    }

    /// Attempts left before the end of the current cycle. Never zero: at a
    /// cycle boundary the whole next cycle remains.
    pub fn attempts_remaining_in_cycle(&self, attempt_count: u32) -> u32 {
        let increment = self.rule.increment();
        let position = match attempt_count % increment {
            0 => increment,
            r => r,
        };
        match (increment - position) % increment {
            0 => increment,
            n => n,
        }
    }

    /// Lock duration for this failure count, if any.
    pub fn penalty_for(&self, attempt_count: u32) -> Option<u64> {
        if let Some(t) = self
            .rule
            .thresholds
            .iter()
            .find(|t| t.attempt_count == attempt_count)
        {
            return Some(t.penalty_secs);
        }
        let last = self.rule.thresholds.last()?;
        (attempt_count > last.attempt_count && attempt_count % self.rule.increment() == 0)
            .then_some(last.penalty_secs)
    }

    /// A lock always wins over the last-try warning.
    pub fn evaluate(&self, attempt_count: u32) -> PenaltyDecision {
        if let Some(secs) = self.penalty_for(attempt_count) {
            PenaltyDecision::Lock(secs)
        } else if self.attempts_remaining_in_cycle(attempt_count) == 1 {
            PenaltyDecision::WarnOneMoreAttempt
        } else {
            PenaltyDecision::None
        }
    }

    pub fn next_failure_locks(&self, attempt_count: u32) -> bool {
        self.penalty_for(attempt_count.saturating_add(1)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(attempt_count: u32, penalty_secs: u64) -> Threshold {
        Threshold {
            attempt_count,
            penalty_secs,
        }
    }

    fn reference_policy() -> LockoutPolicy {
        LockoutPolicy::new(ThresholdRule::new(5, vec![t(5, 30), t(10, 120), t(15, 600)]).unwrap())
    }

    #[test]
    fn single_threshold_cycle() {
        let policy = LockoutPolicy::new(ThresholdRule::new(5, vec![t(5, 30)]).unwrap());
        assert_eq!(policy.evaluate(1), PenaltyDecision::None);
        assert_eq!(policy.attempts_remaining_in_cycle(1), 4);
        assert_eq!(policy.evaluate(2), PenaltyDecision::None);
        assert_eq!(policy.attempts_remaining_in_cycle(2), 3);
        assert_eq!(policy.evaluate(3), PenaltyDecision::None);
        assert_eq!(policy.attempts_remaining_in_cycle(3), 2);
        assert_eq!(policy.evaluate(4), PenaltyDecision::WarnOneMoreAttempt);
        assert_eq!(policy.attempts_remaining_in_cycle(4), 1);
        assert_eq!(policy.evaluate(5), PenaltyDecision::Lock(30));
    }

    #[test]
    fn every_configured_threshold_locks_exactly() {
        let policy = reference_policy();
        for th in policy.rule().thresholds() {
            assert_eq!(
                policy.evaluate(th.attempt_count),
                PenaltyDecision::Lock(th.penalty_secs)
            );
        }
    }

    #[test]
    fn never_locks_below_first_threshold() {
        let policy = LockoutPolicy::new(ThresholdRule::new(3, vec![t(9, 60)]).unwrap());
        for count in 0..9 {
            assert!(
                !matches!(policy.evaluate(count), PenaltyDecision::Lock(_)),
                "count {count} locked"
            );
        }
    }

    #[test]
    fn remaining_is_clamped_at_cycle_boundary() {
        let policy = reference_policy();
        assert_eq!(policy.attempts_remaining_in_cycle(0), 5);
        assert_eq!(policy.attempts_remaining_in_cycle(5), 5);
        assert_eq!(policy.attempts_remaining_in_cycle(10), 5);
        assert_eq!(policy.attempts_remaining_in_cycle(6), 4);
    }

    #[test]
    fn lock_takes_precedence_over_warning() {
        // Attempt 4 is both the last try of its cycle and a configured lock.
        let policy = LockoutPolicy::new(ThresholdRule::new(5, vec![t(4, 45)]).unwrap());
        assert_eq!(policy.attempts_remaining_in_cycle(4), 1);
        assert_eq!(policy.evaluate(4), PenaltyDecision::Lock(45));
    }

    #[test]
    fn beyond_table_repeats_largest_penalty_at_boundaries() {
        let policy = reference_policy();
        assert_eq!(policy.evaluate(16), PenaltyDecision::None);
        assert_eq!(policy.evaluate(19), PenaltyDecision::WarnOneMoreAttempt);
        assert_eq!(policy.evaluate(20), PenaltyDecision::Lock(600));
        assert_eq!(policy.evaluate(25), PenaltyDecision::Lock(600));
        assert_eq!(policy.evaluate(26), PenaltyDecision::None);
    }

    #[test]
    fn escalation_after_reset_cycle() {
        let policy = reference_policy();
        assert_eq!(policy.evaluate(6), PenaltyDecision::None);
        assert_eq!(policy.evaluate(9), PenaltyDecision::WarnOneMoreAttempt);
        assert_eq!(policy.evaluate(10), PenaltyDecision::Lock(120));
    }

    #[test]
    fn next_failure_locks_flags_warning() {
        let policy = reference_policy();
        assert!(!policy.next_failure_locks(3));
        assert!(policy.next_failure_locks(4));
        assert!(policy.next_failure_locks(9));
        assert!(!policy.next_failure_locks(10));
    }

    #[test]
    fn rejects_zero_increment() {
        assert!(matches!(
            ThresholdRule::new(0, vec![t(5, 30)]),
            Err(AuthError::PolicyMisconfiguration(_))
        ));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(ThresholdRule::new(5, vec![]).is_err());
    }

    #[test]
    fn rejects_non_increasing_attempts() {
        let err = ThresholdRule::new(5, vec![t(10, 30), t(10, 60)]).unwrap_err();
        assert!(matches!(err, AuthError::PolicyMisconfiguration(ref m) if m.contains("strictly")));
        assert!(ThresholdRule::new(5, vec![t(10, 30), t(5, 60)]).is_err());
    }

    #[test]
    fn rejects_decreasing_penalty() {
        let err = ThresholdRule::new(5, vec![t(5, 120), t(10, 30)]).unwrap_err();
        assert!(matches!(err, AuthError::PolicyMisconfiguration(ref m) if m.contains("shorter")));
    }

    #[test]
    fn accepts_equal_penalties() {
        assert!(ThresholdRule::new(5, vec![t(5, 60), t(10, 60)]).is_ok());
    }

    #[test]
    fn rejects_zero_attempt_and_zero_penalty() {
        assert!(ThresholdRule::new(5, vec![t(0, 30)]).is_err());
        assert!(ThresholdRule::new(5, vec![t(5, 0)]).is_err());
    }

    #[test]
    fn from_default_config() {
        let rule = ThresholdRule::from_config(&LockoutConfig::default()).unwrap();
        assert_eq!(rule.increment(), 5);
        assert_eq!(rule.thresholds()[2], t(15, 600));
    }
}
