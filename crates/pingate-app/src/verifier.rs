//! Credential verifier backed by the config file.
//!
//! The PIN is checked against a salted SHA-256 digest; biometric
//! availability is whatever `biometrics.device_enrolled` says. A shell has no
//! sensor, so an enrolled device accepts the biometric prompt.

use async_trait::async_trait;
use base64::Engine;
use pingate_auth::{CredentialVerifier, Pin, VerifierError};
use pingate_core::config::AppConfig;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Base64 SHA-256 of `salt || pin`.
pub fn digest_pin(salt: &str, pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(pin.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

pub struct ConfiguredVerifier {
    pin_digest: String,
    salt: String,
    device_enrolled: bool,
}

impl ConfiguredVerifier {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            pin_digest: config.credential.pin_digest.clone(),
            salt: config.credential.salt.clone(),
            device_enrolled: config.biometrics.device_enrolled,
        }
    }
}

#[async_trait]
impl CredentialVerifier for ConfiguredVerifier {
    async fn verify_pin(&self, candidate: &Pin) -> Result<bool, VerifierError> {
        if self.pin_digest.is_empty() {
            return Err(VerifierError::Storage("no PIN has been set".into()));
        }
        let candidate = digest_pin(&self.salt, candidate.expose());
        Ok(candidate
            .as_bytes()
            .ct_eq(self.pin_digest.as_bytes())
            .into())
    }

    async fn is_biometrics_active(&self) -> Result<bool, VerifierError> {
        Ok(self.device_enrolled)
    }

    async fn disable_biometrics(&self) -> Result<(), VerifierError> {
        Ok(())
    }

    async fn unlock_with_biometrics(&self) -> Result<bool, VerifierError> {
        Ok(self.device_enrolled)
    }
}
