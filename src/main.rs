//! Notewise CLI entry point.

use anyhow::Result;
use clap::Parser;
use notewise::cli::{commands, Cli, Commands};
use notewise::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first; it supplies the default log level
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("notewise={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Process {
            content_id,
            transcript,
            task_id,
        } => {
            commands::run_process(*content_id, transcript, task_id.clone(), settings).await?;
        }

        Commands::Job { file } => {
            commands::run_job(file, settings).await?;
        }

        Commands::Ask {
            content_id,
            question,
            model,
        } => {
            commands::run_ask(*content_id, question, model.clone(), settings).await?;
        }

        Commands::Chat { content_id, model } => {
            commands::run_chat(*content_id, model.clone(), settings).await?;
        }

        Commands::Search {
            content_id,
            query,
            limit,
            min_score,
        } => {
            commands::run_search(*content_id, query, *limit, *min_score, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
