//! The authentication orchestrator.
//!
//! `Authenticator` owns the gate's state behind one async mutex. A
//! verification holds that mutex from the clock reading until the store
//! write, so two submissions can never read the same failure count. Every
//! call works on a copy of the state and commits it only after the store
//! accepted the write.

use std::sync::mpsc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pingate_core::{AuthEvent, AuthPolicyState, LockoutPhase, UnlockMethod};
use pingate_store::PolicyStore;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, AuthResult, VerifierError};
use crate::pin::Pin;
use crate::policy::{LockoutPolicy, PenaltyDecision};
use crate::verifier::CredentialVerifier;

/// Message to show inline after a wrong PIN. The caller localizes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureMessage {
    IncorrectPin,
    LastTryBeforeLockout,
}

impl FailureMessage {
    pub fn key(self) -> &'static str {
        match self {
            FailureMessage::IncorrectPin => "PINEnter.IncorrectPINTries",
            FailureMessage::LastTryBeforeLockout => "PINEnter.LastTryBeforeTimeout",
        }
    }
}

/// Result of one verification. Exactly one of these reaches the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Success,
    Failure {
        message: FailureMessage,
        attempts_remaining_in_cycle: u32,
    },
    LockedOut {
        until: DateTime<Utc>,
    },
}

/// Read-only view for presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub phase: LockoutPhase,
    pub consecutive_failures: u32,
    pub attempts_remaining_in_cycle: u32,
    /// The next wrong PIN starts a lockout.
    pub next_failure_locks: bool,
    pub display_notification: bool,
}

pub struct Authenticator {
    state: Mutex<AuthPolicyState>,
    policy: LockoutPolicy,
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn PolicyStore>,
    clock: Arc<dyn Clock>,
    events: Option<mpsc::Sender<AuthEvent>>,
}

impl Authenticator {
    /// Restore persisted state and build the gate.
    pub async fn open(
        policy: LockoutPolicy,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn PolicyStore>,
    ) -> AuthResult<Self> {
        let state = store.load_state().await?;
        tracing::debug!(
            "Restored auth state: {} consecutive failures, lockout active: {}",
            state.attempts.consecutive_failures,
            state.lockout.active
        );
        Ok(Self {
            state: Mutex::new(state),
            policy,
            verifier,
            store,
            clock: Arc::new(SystemClock),
            events: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<AuthEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Verify a PIN. A second call while one is outstanding waits its turn.
    pub async fn verify(&self, candidate: &Pin) -> AuthResult<VerificationOutcome> {
        let mut state = self.state.lock().await;
        self.verify_locked(&mut state, candidate).await
    }

    /// Verify a PIN, refusing instead of waiting if one is already outstanding.
    pub async fn try_verify(&self, candidate: &Pin) -> AuthResult<VerificationOutcome> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| AuthError::VerificationInProgress)?;
        self.verify_locked(&mut state, candidate).await
    }

    async fn verify_locked(
        &self,
        current: &mut AuthPolicyState,
        candidate: &Pin,
    ) -> AuthResult<VerificationOutcome> {
        let now = self.clock.now();
        let mut next = current.clone();

        if let Some(until) = next.expire_if_due(now) {
            tracing::debug!("PIN entry refused, locked out until {until}");
            return Ok(VerificationOutcome::LockedOut { until });
        }
        let served = next.begin_entry();

        let verified = self
            .verifier
            .verify_pin(candidate)
            .await
            .map_err(Self::backend_failure)?;

        let (outcome, event) = if verified {
            next.record_success();
            tracing::info!("PIN accepted");
            (
                VerificationOutcome::Success,
                AuthEvent::LoginSuccess(UnlockMethod::Pin),
            )
        } else {
            let count = next.attempts.increment();
            match self.policy.evaluate(count) {
                PenaltyDecision::Lock(secs) => {
                    let until = next.engage_lockout(now, secs);
                    tracing::warn!("Incorrect PIN (attempt {count}); locked out for {secs}s until {until}");
                    (
                        VerificationOutcome::LockedOut { until },
                        AuthEvent::AccountLocked { until },
                    )
                }
                decision => {
                    let remaining = self.policy.attempts_remaining_in_cycle(count);
                    let last_try = decision == PenaltyDecision::WarnOneMoreAttempt;
                    let message = if last_try {
                        FailureMessage::LastTryBeforeLockout
                    } else {
                        FailureMessage::IncorrectPin
                    };
                    tracing::warn!("Incorrect PIN (attempt {count}); {remaining} left in cycle");
                    (
                        VerificationOutcome::Failure {
                            message,
                            attempts_remaining_in_cycle: remaining,
                        },
                        AuthEvent::LoginFailed {
                            attempts_remaining: remaining,
                            last_try,
                        },
                    )
                }
            }
        };

        self.commit(current, next).await?;
        if served {
            self.emit(AuthEvent::PenaltyServed);
        }
        self.emit(event);
        Ok(outcome)
    }

    /// Unlock through the biometric prompt. Only offered while biometric
    /// unlock is enabled; a declined prompt is not a failed attempt.
    pub async fn unlock_with_biometrics(&self) -> AuthResult<VerificationOutcome> {
        let mut current = self.state.lock().await;
        // Read under the lock so a revocation that landed while queued wins.
        if !self.store.biometry_enabled().await? {
            return Err(AuthError::BiometryUnavailable);
        }
        let now = self.clock.now();
        let mut next = current.clone();
        if let Some(until) = next.expire_if_due(now) {
            return Ok(VerificationOutcome::LockedOut { until });
        }

        let accepted = self
            .verifier
            .unlock_with_biometrics()
            .await
            .map_err(Self::backend_failure)?;
        if !accepted {
            tracing::info!("Biometric prompt declined");
            return Err(AuthError::BiometricDeclined);
        }

        next.record_success();
        self.commit(&mut current, next).await?;
        tracing::info!("Biometric unlock accepted");
        self.emit(AuthEvent::LoginSuccess(UnlockMethod::Biometric));
        Ok(VerificationOutcome::Success)
    }

    /// Check a PIN for a settings change. Leaves the attempt counter and
    /// lockout state alone.
    pub async fn reconfirm_pin(&self, candidate: &Pin) -> AuthResult<bool> {
        let _serialized = self.state.lock().await;
        self.verifier
            .verify_pin(candidate)
            .await
            .map_err(Self::backend_failure)
    }

    /// Switch biometric unlock back on. Requires the current PIN.
    pub async fn enable_biometrics(&self, candidate: &Pin) -> AuthResult<bool> {
        if !self.reconfirm_pin(candidate).await? {
            tracing::warn!("Biometric enable refused: PIN mismatch");
            return Ok(false);
        }
        self.store.set_biometry_enabled(true).await?;
        tracing::info!("Biometric unlock enabled");
        self.emit(AuthEvent::BiometryEnabled);
        Ok(true)
    }

    /// The authentication screen was presented again after a lockout.
    pub async fn mark_notification_pending(&self) -> AuthResult<()> {
        let mut current = self.state.lock().await;
        let mut next = current.clone();
        next.mark_notification_pending();
        self.commit(&mut current, next).await
    }

    /// First keystroke of a new entry. Returns whether a served penalty was
    /// unmarked.
    pub async fn begin_entry(&self) -> AuthResult<bool> {
        let mut current = self.state.lock().await;
        let mut next = current.clone();
        next.expire_if_due(self.clock.now());
        let served = next.begin_entry();
        self.commit(&mut current, next).await?;
        if served {
            self.emit(AuthEvent::PenaltyServed);
        }
        Ok(served)
    }

    /// Administrative reset of the failure counter and any lockout.
    pub async fn reset_attempts(&self) -> AuthResult<()> {
        let mut current = self.state.lock().await;
        let mut next = current.clone();
        next.record_success();
        self.commit(&mut current, next).await?;
        tracing::info!("Attempt counter reset");
        Ok(())
    }

    pub async fn status(&self) -> AuthStatus {
        let state = self.state.lock().await;
        let count = state.attempts.current_count();
        AuthStatus {
            phase: state.phase(self.clock.now()),
            consecutive_failures: count,
            attempts_remaining_in_cycle: self.policy.attempts_remaining_in_cycle(count),
            next_failure_locks: self.policy.next_failure_locks(count),
            display_notification: state.lockout.display_notification,
        }
    }

    async fn commit(&self, current: &mut AuthPolicyState, next: AuthPolicyState) -> AuthResult<()> {
        if *current != next {
            self.store.save_state(&next).await?;
            *current = next;
        }
        Ok(())
    }

    fn backend_failure(e: VerifierError) -> AuthError {
        tracing::error!("Credential backend failed, attempt not counted: {e}");
        AuthError::VerificationBackendFailure(e)
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = tx.send(event);
        }
    }
}
