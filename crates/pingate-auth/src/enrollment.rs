use std::sync::mpsc;
use std::sync::Arc;

use pingate_core::AuthEvent;
use pingate_store::PolicyStore;
use serde::Serialize;

use crate::error::AuthResult;
use crate::verifier::CredentialVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub biometry_revoked: bool,
}

/// Revokes biometric unlock when the device's enrolled biometrics changed
/// since it was switched on.
///
/// Touches only the biometry preference, so it may run while a PIN
/// verification is in flight.
pub struct BiometricEnrollmentGuard {
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn PolicyStore>,
    events: Option<mpsc::Sender<AuthEvent>>,
}

impl BiometricEnrollmentGuard {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, store: Arc<dyn PolicyStore>) -> Self {
        Self {
            verifier,
            store,
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::Sender<AuthEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run once when the authentication screen becomes active. A platform
    /// error during the check counts as "not usable". Recovery needs the
    /// user to re-enable biometrics with their PIN.
    pub async fn check_and_reconcile(&self) -> AuthResult<Reconciliation> {
        if !self.store.biometry_enabled().await? {
            return Ok(Reconciliation {
                biometry_revoked: false,
            });
        }

        let usable = match self.verifier.is_biometrics_active().await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!("Biometric availability check failed, treating as changed: {e}");
                false
            }
        };
        if usable {
            return Ok(Reconciliation {
                biometry_revoked: false,
            });
        }

        if let Err(e) = self.verifier.disable_biometrics().await {
            tracing::warn!("Platform could not disable biometrics: {e}");
        }
        self.store.set_biometry_enabled(false).await?;
        tracing::info!("Biometric enrollment changed; biometric unlock disabled");

        if let Some(tx) = &self.events {
            let _ = tx.send(AuthEvent::BiometryRevoked);
        }
        Ok(Reconciliation {
            biometry_revoked: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::mock::MockVerifier;
    use crate::orchestrator::Authenticator;
    use crate::policy::{LockoutPolicy, Threshold, ThresholdRule};
    use pingate_core::AuthPolicyState;
    use pingate_store::MemoryStore;

    fn setup(biometry_enabled: bool) -> (Arc<MockVerifier>, Arc<MemoryStore>) {
        let verifier = Arc::new(MockVerifier::new("135790"));
        let store = Arc::new(MemoryStore::with_state(
            AuthPolicyState::default(),
            biometry_enabled,
        ));
        (verifier, store)
    }

    #[tokio::test]
    async fn disabled_preference_is_a_no_op() {
        let (verifier, store) = setup(false);
        verifier.set_biometrics_active(false);
        let guard = BiometricEnrollmentGuard::new(verifier.clone(), store.clone());
        let result = guard.check_and_reconcile().await.unwrap();
        assert!(!result.biometry_revoked);
        assert_eq!(verifier.disable_calls(), 0);
    }

    #[tokio::test]
    async fn unchanged_enrollment_keeps_biometry() {
        let (verifier, store) = setup(true);
        let guard = BiometricEnrollmentGuard::new(verifier.clone(), store.clone());
        assert!(!guard.check_and_reconcile().await.unwrap().biometry_revoked);
        assert!(store.biometry_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn scenario_c_changed_enrollment_revokes() {
        let (verifier, store) = setup(true);
        verifier.set_biometrics_active(false);
        let (tx, rx) = mpsc::channel();
        let guard =
            BiometricEnrollmentGuard::new(verifier.clone(), store.clone()).with_events(tx);

        assert!(guard.check_and_reconcile().await.unwrap().biometry_revoked);
        assert!(!store.biometry_enabled().await.unwrap());
        assert_eq!(verifier.disable_calls(), 1);
        assert_eq!(rx.try_recv().unwrap(), AuthEvent::BiometryRevoked);

        // The biometric path is no longer offered.
        let rule = ThresholdRule::new(
            5,
            vec![Threshold {
                attempt_count: 5,
                penalty_secs: 30,
            }],
        )
        .unwrap();
        let auth = Authenticator::open(LockoutPolicy::new(rule), verifier.clone(), store.clone())
            .await
            .unwrap();
        assert!(matches!(
            auth.unlock_with_biometrics().await,
            Err(AuthError::BiometryUnavailable)
        ));
        assert_eq!(verifier.biometric_prompts(), 0);
    }

    #[tokio::test]
    async fn platform_error_revokes_conservatively() {
        let (verifier, store) = setup(true);
        verifier.set_biometrics_check_fails(true);
        let guard = BiometricEnrollmentGuard::new(verifier.clone(), store.clone());
        assert!(guard.check_and_reconcile().await.unwrap().biometry_revoked);
        assert!(!store.biometry_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn revocation_leaves_attempt_state_alone() {
        let mut state = AuthPolicyState::default();
        state.attempts.consecutive_failures = 2;
        let verifier = Arc::new(MockVerifier::new("135790"));
        verifier.set_biometrics_active(false);
        let store = Arc::new(MemoryStore::with_state(state.clone(), true));

        let guard = BiometricEnrollmentGuard::new(verifier, store.clone());
        guard.check_and_reconcile().await.unwrap();
        assert_eq!(store.load_state().await.unwrap(), state);
    }
}
