use pingate_store::StoreError;
use thiserror::Error;

/// Failures reported by the credential collaborator itself, as opposed to a
/// wrong guess.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Biometric platform error: {0}")]
    Platform(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    /// Not counted as a failed attempt; the caller should offer a retry.
    #[error("Verification backend failure: {0}")]
    VerificationBackendFailure(#[from] VerifierError),

    #[error("Lockout policy misconfigured: {0}")]
    PolicyMisconfiguration(String),

    #[error("A verification is already in progress")]
    VerificationInProgress,

    #[error("Biometric unlock is not enabled")]
    BiometryUnavailable,

    #[error("Biometric prompt was declined")]
    BiometricDeclined,

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

pub type AuthResult<T> = Result<T, AuthError>;
