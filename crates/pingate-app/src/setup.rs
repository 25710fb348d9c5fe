use std::sync::mpsc;
use std::sync::Arc;

use anyhow::Result;
use pingate_auth::{
    Authenticator, BiometricEnrollmentGuard, CredentialVerifier, LockoutPolicy, ThresholdRule,
};
use pingate_core::config::AppConfig;
use pingate_core::AuthEvent;
use pingate_store::{JsonFileStore, MemoryStore, PolicyStore};

use crate::verifier::ConfiguredVerifier;

/// Everything a command needs, wired from one config.
pub struct Gate {
    pub authenticator: Authenticator,
    pub guard: BiometricEnrollmentGuard,
    pub events: mpsc::Receiver<AuthEvent>,
}

pub fn create_store(config: &AppConfig) -> Arc<dyn PolicyStore> {
    match config.store.mode.as_str() {
        "memory" => Arc::new(MemoryStore::new()),
        _ => Arc::new(JsonFileStore::new(&config.store.path)),
    }
}

/// Fails fast on a malformed threshold table.
pub fn create_policy(config: &AppConfig) -> Result<LockoutPolicy> {
    let rule = ThresholdRule::from_config(&config.lockout)?;
    Ok(LockoutPolicy::new(rule))
}

pub async fn open_gate(config: &AppConfig) -> Result<Gate> {
    let policy = create_policy(config)?;
    let store = create_store(config);
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(ConfiguredVerifier::from_config(config));
    let (tx, rx) = mpsc::channel();

    let authenticator = Authenticator::open(policy, verifier.clone(), store.clone())
        .await?
        .with_events(tx.clone());
    let guard = BiometricEnrollmentGuard::new(verifier, store).with_events(tx);

    Ok(Gate {
        authenticator,
        guard,
        events: rx,
    })
}

impl Gate {
    /// Log whatever the gate reported during the command.
    pub fn drain_events(&self) {
        for event in self.events.try_iter() {
            tracing::info!("Auth event: {event:?}");
        }
    }
}
