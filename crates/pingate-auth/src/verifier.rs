use async_trait::async_trait;

use crate::error::VerifierError;
use crate::pin::Pin;

/// The sealed secret store and the platform biometric prompt.
///
/// `Ok(false)` means "wrong credential"; `Err` means the check itself could
/// not run and must not be counted against the user.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_pin(&self, candidate: &Pin) -> Result<bool, VerifierError>;

    /// Whether the biometrics enrolled on the device still match the ones
    /// recorded when biometric unlock was switched on.
    async fn is_biometrics_active(&self) -> Result<bool, VerifierError>;

    async fn disable_biometrics(&self) -> Result<(), VerifierError>;

    /// Show the biometric prompt. `Ok(false)` when the user declines or the
    /// match fails.
    async fn unlock_with_biometrics(&self) -> Result<bool, VerifierError>;
}
