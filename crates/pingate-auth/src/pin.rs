use std::fmt;

use pingate_core::config::PinConfig;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AuthError, AuthResult};

/// Accepted PIN shape.
#[derive(Debug, Clone)]
pub struct PinPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl PinPolicy {
    pub fn from_config(config: &PinConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
        }
    }

    /// Shape check only. Correctness is the verifier's business.
    pub fn validate(&self, raw: &str) -> AuthResult<()> {
        if raw.is_empty() {
            return Err(AuthError::InvalidCredentialFormat("PIN is empty".into()));
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidCredentialFormat(
                "PIN must contain digits only".into(),
            ));
        }
        let len = raw.len();
        if len < self.min_length {
            return Err(AuthError::InvalidCredentialFormat(format!(
                "At least {} digits",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(AuthError::InvalidCredentialFormat(format!(
                "At most {} digits",
                self.max_length
            )));
        }
        Ok(())
    }
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self::from_config(&PinConfig::default())
    }
}

/// A candidate PIN that passed the shape check. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Pin(String);

impl Pin {
    pub fn parse(raw: &str, policy: &PinPolicy) -> AuthResult<Self> {
        policy.validate(raw)?;
        Ok(Self(raw.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_six_digits() {
        let pin = Pin::parse("123456", &PinPolicy::default()).unwrap();
        assert_eq!(pin.expose(), "123456");
    }

    #[test]
    fn rejects_short() {
        let err = Pin::parse("1234", &PinPolicy::default()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentialFormat(ref m) if m.contains('6')));
    }

    #[test]
    fn rejects_long() {
        let err = Pin::parse("1234567890123", &PinPolicy::default()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentialFormat(_)));
    }

    #[test]
    fn rejects_non_digits() {
        assert!(Pin::parse("12a456", &PinPolicy::default()).is_err());
        assert!(Pin::parse("١٢٣٤٥٦", &PinPolicy::default()).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(Pin::parse("", &PinPolicy::default()).is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let pin = Pin::parse("987654", &PinPolicy::default()).unwrap();
        assert_eq!(format!("{pin:?}"), "Pin(***)");
    }
}
