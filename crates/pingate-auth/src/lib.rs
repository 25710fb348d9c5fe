pub mod clock;
pub mod enrollment;
pub mod error;
pub mod orchestrator;
pub mod pin;
pub mod policy;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use clock::{Clock, SystemClock};
pub use enrollment::{BiometricEnrollmentGuard, Reconciliation};
pub use error::{AuthError, AuthResult, VerifierError};
pub use orchestrator::{AuthStatus, Authenticator, FailureMessage, VerificationOutcome};
pub use pin::{Pin, PinPolicy};
pub use policy::{LockoutPolicy, PenaltyDecision, Threshold, ThresholdRule};
pub use verifier::CredentialVerifier;
