//! recap - Summarize long transcripts with a local LLM
//!
//! Entry point for the recap CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recap::cli::{Cli, Commands};
use recap::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            recap::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            // Execute command
            match command {
                Commands::Summarize {
                    input,
                    url,
                    output_dir,
                    json,
                    skip_check,
                } => {
                    recap::cli::commands::summarize(
                        &settings, input, url, output_dir, json, skip_check,
                    )
                    .await?;
                }
                Commands::Parse { file, json } => {
                    recap::cli::commands::parse_output(&settings, file, json)?;
                }
                Commands::Chunks { file } => {
                    recap::cli::commands::preview_chunks(&settings, file)?;
                }
                Commands::Doctor { json } => {
                    recap::cli::commands::run_doctor(&settings, json).await?;
                }
                Commands::Config(config_cmd) => {
                    recap::cli::commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
