use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which factor unlocked the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnlockMethod {
    Pin,
    Biometric,
}

/// Events emitted by the authentication system for the UI to handle.
///
/// Delivered over a single-consumer channel; the presentation layer decides
/// how to render each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoginSuccess(UnlockMethod),
    LoginFailed { attempts_remaining: u32, last_try: bool },
    AccountLocked { until: DateTime<Utc> },
    /// A lockout elapsed and the user resumed entering a PIN.
    PenaltyServed,
    /// Enrolled biometrics changed; biometric unlock was switched off.
    BiometryRevoked,
    BiometryEnabled,
}
