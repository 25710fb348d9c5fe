use anyhow::Result;
use pingate_auth::{PenaltyDecision, Pin, PinPolicy};
use pingate_core::config::AppConfig;

use crate::setup::{create_policy, open_gate};
use crate::verifier::digest_pin;

pub fn check_config(config: &AppConfig) -> Result<()> {
    let policy = create_policy(config)?;
    let rule = policy.rule();
    println!("increment\t{}", rule.increment());
    for t in rule.thresholds() {
        println!("attempt {}\tlock {}s", t.attempt_count, t.penalty_secs);
    }
    println!("({} thresholds)", rule.thresholds().len());
    Ok(())
}

pub fn evaluate(config: &AppConfig, attempts: u32) -> Result<()> {
    let policy = create_policy(config)?;
    for count in 1..=attempts {
        let decision = match policy.evaluate(count) {
            PenaltyDecision::None => "none".to_string(),
            PenaltyDecision::WarnOneMoreAttempt => "warn".to_string(),
            PenaltyDecision::Lock(secs) => format!("lock {secs}s"),
        };
        println!(
            "{count}\t{decision}\t{} left",
            policy.attempts_remaining_in_cycle(count)
        );
    }
    Ok(())
}

pub async fn verify(config: &AppConfig, pin: &str) -> Result<()> {
    let pin = Pin::parse(pin, &PinPolicy::from_config(&config.pin))?;
    let gate = open_gate(config).await?;
    let outcome = gate.authenticator.verify(&pin).await?;
    gate.drain_events();
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn unlock_biometric(config: &AppConfig) -> Result<()> {
    let gate = open_gate(config).await?;
    let reconciliation = gate.guard.check_and_reconcile().await?;
    if reconciliation.biometry_revoked {
        gate.drain_events();
        anyhow::bail!("Biometrics changed on this device; enter your PIN");
    }
    let outcome = gate.authenticator.unlock_with_biometrics().await?;
    gate.drain_events();
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn reconcile_biometrics(config: &AppConfig) -> Result<()> {
    let gate = open_gate(config).await?;
    let reconciliation = gate.guard.check_and_reconcile().await?;
    gate.drain_events();
    println!("{}", serde_json::to_string_pretty(&reconciliation)?);
    Ok(())
}

pub async fn enable_biometrics(config: &AppConfig, pin: &str) -> Result<()> {
    let pin = Pin::parse(pin, &PinPolicy::from_config(&config.pin))?;
    let gate = open_gate(config).await?;
    if !gate.authenticator.enable_biometrics(&pin).await? {
        anyhow::bail!("Incorrect PIN; biometric unlock unchanged");
    }
    gate.drain_events();
    println!("Biometric unlock enabled");
    Ok(())
}

pub async fn status(config: &AppConfig) -> Result<()> {
    let gate = open_gate(config).await?;
    let status = gate.authenticator.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub async fn reset(config: &AppConfig) -> Result<()> {
    let gate = open_gate(config).await?;
    gate.authenticator.reset_attempts().await?;
    println!("Attempt counter reset");
    Ok(())
}

pub fn hash_pin(config: &AppConfig, pin: &str, salt: &str) -> Result<()> {
    let pin = Pin::parse(pin, &PinPolicy::from_config(&config.pin))?;
    println!("{}", digest_pin(salt, pin.expose()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.store.mode = "memory".into();
        config.credential.salt = "s".into();
        config.credential.pin_digest = digest_pin("s", "123456");
        config
    }

    #[test]
    fn check_config_accepts_defaults() {
        assert!(check_config(&test_config()).is_ok());
    }

    #[test]
    fn check_config_rejects_shrinking_penalty() {
        let mut config = test_config();
        config.lockout.thresholds[1].penalty_secs = 1;
        assert!(check_config(&config).is_err());
    }

    #[test]
    fn evaluate_runs() {
        assert!(evaluate(&test_config(), 20).is_ok());
    }

    #[tokio::test]
    async fn verify_rejects_malformed_pin() {
        assert!(verify(&test_config(), "12").await.is_err());
    }

    #[tokio::test]
    async fn verify_correct_pin() {
        assert!(verify(&test_config(), "123456").await.is_ok());
    }

    #[tokio::test]
    async fn verify_without_stored_pin_fails() {
        let mut config = test_config();
        config.credential.pin_digest.clear();
        assert!(verify(&config, "123456").await.is_err());
    }

    #[tokio::test]
    async fn biometric_unlock_not_offered_by_default() {
        assert!(unlock_biometric(&test_config()).await.is_err());
    }

    #[tokio::test]
    async fn status_and_reset_succeed() {
        let config = test_config();
        assert!(status(&config).await.is_ok());
        assert!(reset(&config).await.is_ok());
    }

    #[test]
    fn hash_pin_validates_shape() {
        let config = test_config();
        assert!(hash_pin(&config, "654321", "x").is_ok());
        assert!(hash_pin(&config, "65a321", "x").is_err());
    }
}
