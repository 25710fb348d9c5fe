//! Test doubles for the verifier and clock.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::Clock;
use crate::error::VerifierError;
use crate::pin::Pin;
use crate::verifier::CredentialVerifier;

/// In-memory verifier with switches for every collaborator behaviour.
pub struct MockVerifier {
    pin: String,
    biometrics_active: AtomicBool,
    biometrics_check_fails: AtomicBool,
    biometric_accepts: AtomicBool,
    backend_down: AtomicBool,
    delay_ms: AtomicU64,
    pin_checks: AtomicUsize,
    biometric_prompts: AtomicUsize,
    disable_calls: AtomicUsize,
}

impl MockVerifier {
    pub fn new(pin: &str) -> Self {
        Self {
            pin: pin.to_owned(),
            biometrics_active: AtomicBool::new(true),
            biometrics_check_fails: AtomicBool::new(false),
            biometric_accepts: AtomicBool::new(true),
            backend_down: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            pin_checks: AtomicUsize::new(0),
            biometric_prompts: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_biometrics_active(&self, active: bool) {
        self.biometrics_active.store(active, Ordering::SeqCst);
    }

    pub fn set_biometrics_check_fails(&self, fails: bool) {
        self.biometrics_check_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_biometric_accepts(&self, accepts: bool) {
        self.biometric_accepts.store(accepts, Ordering::SeqCst);
    }

    pub fn set_backend_down(&self, down: bool) {
        self.backend_down.store(down, Ordering::SeqCst);
    }

    /// Suspend inside `verify_pin` for this long.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn pin_checks(&self) -> usize {
        self.pin_checks.load(Ordering::SeqCst)
    }

    pub fn biometric_prompts(&self) -> usize {
        self.biometric_prompts.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify_pin(&self, candidate: &Pin) -> Result<bool, VerifierError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.pin_checks.fetch_add(1, Ordering::SeqCst);
        if self.backend_down.load(Ordering::SeqCst) {
            return Err(VerifierError::Storage("keychain unreadable".into()));
        }
        Ok(candidate.expose() == self.pin)
    }

    async fn is_biometrics_active(&self) -> Result<bool, VerifierError> {
        if self.biometrics_check_fails.load(Ordering::SeqCst) {
            return Err(VerifierError::Platform("sensor unavailable".into()));
        }
        Ok(self.biometrics_active.load(Ordering::SeqCst))
    }

    async fn disable_biometrics(&self) -> Result<(), VerifierError> {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn unlock_with_biometrics(&self) -> Result<bool, VerifierError> {
        self.biometric_prompts.fetch_add(1, Ordering::SeqCst);
        if self.backend_down.load(Ordering::SeqCst) {
            return Err(VerifierError::Storage("keychain unreadable".into()));
        }
        Ok(self.biometric_accepts.load(Ordering::SeqCst))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
