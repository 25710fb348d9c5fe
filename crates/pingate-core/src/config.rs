use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub lockout: LockoutConfig,
    #[serde(default)]
    pub pin: PinConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub credential: CredentialConfig,
    #[serde(default)]
    pub biometrics: BiometricsConfig,
}

/// Attempt threshold table. Validated into a policy at startup; never
/// changed while the process runs.
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    /// Length of the repeating attempt cycle.
    #[serde(default = "default_increment")]
    pub increment: u32,
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<ThresholdConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThresholdConfig {
    /// Consecutive failure count that triggers the penalty.
    pub attempts: u32,
    /// Lockout duration in seconds.
    pub penalty_secs: u64,
}

fn default_increment() -> u32 {
    5
}
fn default_thresholds() -> Vec<ThresholdConfig> {
    vec![
        ThresholdConfig { attempts: 5, penalty_secs: 30 },
        ThresholdConfig { attempts: 10, penalty_secs: 120 },
        ThresholdConfig { attempts: 15, penalty_secs: 600 },
    ]
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            increment: default_increment(),
            thresholds: default_thresholds(),
        }
    }
}

/// Accepted PIN shape. Checked before a candidate reaches the verifier.
#[derive(Debug, Clone, Deserialize)]
pub struct PinConfig {
    #[serde(default = "default_pin_min_length")]
    pub min_length: usize,
    #[serde(default = "default_pin_max_length")]
    pub max_length: usize,
}

fn default_pin_min_length() -> usize {
    6
}
fn default_pin_max_length() -> usize {
    12
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            min_length: default_pin_min_length(),
            max_length: default_pin_max_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `"persistent"` (JSON file) or `"memory"`.
    #[serde(default = "default_store_mode")]
    pub mode: String,
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_mode() -> String {
    "persistent".into()
}
fn default_store_path() -> String {
    "data/pingate-state.json".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: default_store_mode(),
            path: default_store_path(),
        }
    }
}

/// Sealed PIN reference used by the command-line verifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialConfig {
    /// Base64 SHA-256 of `salt || pin`. Empty means no PIN is set.
    #[serde(default)]
    pub pin_digest: String,
    #[serde(default)]
    pub salt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiometricsConfig {
    /// Whether the device still has the biometrics recorded at enable time.
    #[serde(default)]
    pub device_enrolled: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the config for a run. An explicit path must load cleanly;
    /// without one, fall back to `./config/default.toml`, then defaults.
    pub fn resolve(explicit_path: Option<&Path>) -> anyhow::Result<Self> {
        match explicit_path {
            Some(path) => Self::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(Self::load_or_default()),
        }
    }

    /// Load config with fallback chain: ./config/default.toml → hardcoded defaults.
    pub fn load_or_default() -> Self {
        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
