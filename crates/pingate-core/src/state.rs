//! Persisted authentication state and the lockout state machine.
//!
//! `AuthPolicyState` is owned by the authenticator and written through a
//! store after every mutation. Transitions here are pure: callers supply
//! the `now` snapshot so a single verification never sees two clocks.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive failed verifications since the last success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    pub consecutive_failures: u32,
    /// A lockout elapsed and the user has not yet resumed entry.
    pub served_penalty: bool,
}

impl AttemptState {
    /// Record one more failure and return the new count.
    pub fn increment(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_count(&self) -> u32 {
        self.consecutive_failures
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutState {
    pub active: bool,
    pub until: Option<DateTime<Utc>>,
    /// The user must be told why they are re-entering their PIN.
    pub display_notification: bool,
}

impl LockoutState {
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.until.is_some_and(|until| now < until)
    }
}

/// Where the gate currently stands, derived from state plus a clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockoutPhase {
    Unlocked,
    PendingNotification,
    Locked { until: DateTime<Utc> },
}

/// Everything the authenticator persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPolicyState {
    #[serde(default)]
    pub attempts: AttemptState,
    #[serde(default)]
    pub lockout: LockoutState,
}

impl AuthPolicyState {
    pub fn phase(&self, now: DateTime<Utc>) -> LockoutPhase {
        match self.lockout.until {
            Some(until) if self.lockout.is_locked_at(now) => LockoutPhase::Locked { until },
            _ if self.lockout.display_notification => LockoutPhase::PendingNotification,
            _ => LockoutPhase::Unlocked,
        }
    }

    /// Lazy expiry. Returns the unlock time while the lockout still holds;
    /// otherwise clears an elapsed lockout, marks the penalty served and
    /// returns `None`.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.lockout.is_locked_at(now) {
            return self.lockout.until;
        }
        if self.lockout.active {
            tracing::info!("Lockout expired");
            self.lockout.active = false;
            self.lockout.until = None;
            self.attempts.served_penalty = true;
        }
        None
    }

    /// Start a lockout of `penalty_secs` from `now`. Returns the unlock time.
    pub fn engage_lockout(&mut self, now: DateTime<Utc>, penalty_secs: u64) -> DateTime<Utc> {
        let until = i64::try_from(penalty_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.lockout = LockoutState {
            active: true,
            until: Some(until),
            display_notification: true,
        };
        self.attempts.served_penalty = false;
        until
    }

    /// The authentication screen was presented again after a lockout.
    pub fn mark_notification_pending(&mut self) {
        self.lockout.display_notification = true;
    }

    /// First keystroke of a new entry. Unmarks a served penalty and drops the
    /// pending notification; returns whether anything changed.
    pub fn begin_entry(&mut self) -> bool {
        if !self.attempts.served_penalty {
            return false;
        }
        self.attempts.served_penalty = false;
        self.lockout.display_notification = false;
        true
    }

    pub fn record_success(&mut self) {
        self.attempts.reset();
        self.lockout = LockoutState::default();
    }
}
