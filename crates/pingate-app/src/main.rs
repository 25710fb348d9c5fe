mod cli;
mod commands;
mod setup;
mod verifier;

use anyhow::Result;
use clap::Parser;
use pingate_core::config::AppConfig;
use pingate_core::lifecycle;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();
    lifecycle::log_startup();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::CheckConfig => commands::check_config(&config)?,
        Commands::Evaluate { attempts } => commands::evaluate(&config, attempts)?,
        Commands::Verify { pin } => commands::verify(&config, &pin).await?,
        Commands::UnlockBiometric => commands::unlock_biometric(&config).await?,
        Commands::ReconcileBiometrics => commands::reconcile_biometrics(&config).await?,
        Commands::EnableBiometrics { pin } => commands::enable_biometrics(&config, &pin).await?,
        Commands::Status => commands::status(&config).await?,
        Commands::Reset => commands::reset(&config).await?,
        Commands::HashPin { pin, salt } => commands::hash_pin(&config, &pin, &salt)?,
    }

    lifecycle::log_shutdown();
    Ok(())
}
