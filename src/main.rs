//! Kapittel CLI entry point.

use anyhow::Result;
use clap::Parser;
use kapittel::cli::{commands, Cli, Commands};
use kapittel::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("kapittel={},tower_http={}", log_level, log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_override = cli.config.as_ref().map(std::path::PathBuf::from);
    let config_path = Settings::resolve_config_path(config_override.as_ref());
    let settings = Settings::load_from(Some(&config_path))?;

    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.as_deref(), *port, settings).await?;
        }

        Commands::Generate {
            url,
            language,
            json,
        } => {
            commands::run_generate(url, language.clone(), *json, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
