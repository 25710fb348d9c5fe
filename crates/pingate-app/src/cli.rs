use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pingate", about = "pingate: PIN unlock with escalating lockout")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the lockout table and print it
    CheckConfig,

    /// Show the policy decision for each failure count up to N
    Evaluate {
        #[arg(long)]
        attempts: u32,
    },

    /// Submit a PIN
    Verify {
        #[arg(long)]
        pin: String,
    },

    /// Unlock with the biometric factor
    UnlockBiometric,

    /// Revoke biometric unlock if the device enrollment changed
    ReconcileBiometrics,

    /// Turn biometric unlock back on (requires the PIN)
    EnableBiometrics {
        #[arg(long)]
        pin: String,
    },

    /// Print attempt and lockout status
    Status,

    /// Clear the failure counter and any lockout
    Reset,

    /// Print the salted digest to store as `credential.pin_digest`
    HashPin {
        #[arg(long)]
        pin: String,
        #[arg(long, default_value = "")]
        salt: String,
    },
}
