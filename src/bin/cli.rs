//! Divar notifier CLI
//!
//! `run` starts the periodic checker and the chat command shell;
//! the other subcommands are one-shot.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use divar_notifier::{
    error::{AppError, Result},
    handler::CommandShell,
    models::Config,
    pipeline::{CrawlEngine, EngineSettings, Scheduler},
    services::{DivarClient, TelegramClient},
    storage::{LocalSeenStore, SeenStore},
    utils::redact_token,
};
use tokio_util::sync::CancellationToken;

/// Divar Post Notifier - new rental listings straight to Telegram
#[derive(Parser, Debug)]
#[command(
    name = "divar-notifier",
    version,
    about = "Polls Divar for new listings and sends them to Telegram"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check periodically and answer chat commands until Ctrl-C
    Run,

    /// Run a single check and exit
    Check {
        /// Print the full delivery report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and credentials
    Validate,

    /// Show effective configuration and state
    Info,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_engine(config: &Config, telegram: Arc<TelegramClient>) -> Result<CrawlEngine> {
    let store = Arc::new(LocalSeenStore::new(&config.paths.state_file));
    let source = Arc::new(DivarClient::new(config.search.clone())?);
    Ok(CrawlEngine::new(
        store,
        source,
        telegram,
        EngineSettings::from_config(config),
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Divar notifier starting...");
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            config.require_credentials()?;

            let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
            match telegram.get_me().await {
                Ok(name) => log::info!("Connected to Telegram as @{}", name),
                Err(e) => log::warn!("Could not verify bot token: {}", e),
            }

            let engine = Arc::new(build_engine(&config, Arc::clone(&telegram))?);
            log::info!(
                "Sending to {} chat(s), state file {}",
                engine.recipients().len(),
                config.paths.state_file.display()
            );

            let cancel = CancellationToken::new();
            let scheduler = Scheduler::new(Arc::clone(&engine), &config.schedule);
            let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

            let shell_task = if config.telegram.poll_commands {
                let shell = CommandShell::new(telegram, Arc::clone(&engine), &config);
                Some(tokio::spawn(shell.run(cancel.clone())))
            } else {
                log::info!("Command polling disabled");
                None
            };

            tokio::signal::ctrl_c().await?;
            log::info!("Shutdown requested, waiting for in-flight work...");
            cancel.cancel();

            if let Err(e) = scheduler_task.await {
                log::error!("Scheduler task panicked: {}", e);
            }
            if let Some(task) = shell_task {
                if let Err(e) = task.await {
                    log::error!("Command shell task panicked: {}", e);
                }
            }
        }

        Command::Check { json } => {
            config.validate()?;
            config.require_credentials()?;

            let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
            let engine = build_engine(&config, telegram)?;
            let report = engine.try_run_cycle().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary());
            }
            if report.is_failure() {
                return Err(AppError::fetch(
                    1,
                    report.fetch_error.unwrap_or_else(|| "unknown error".into()),
                ));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if let Err(e) = config.require_credentials() {
                log::error!("Credentials missing: {}", e);
                return Err(e);
            }
            log::info!("✓ Credentials present");

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Bot token: {}", redact_token(&config.telegram.bot_token));
            log::info!("Chats: {}", config.telegram.chat_ids.join(", "));
            log::info!("Search API: {}", config.search.api_url);
            log::info!(
                "Interval: {}s (first check after {}s)",
                config.schedule.interval_secs,
                config.schedule.initial_delay_secs
            );
            log::info!(
                "Max pages: {}",
                config
                    .search
                    .max_pages
                    .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
            );

            let store = LocalSeenStore::new(&config.paths.state_file);
            let seen = store.load().await;
            log::info!(
                "State file: {} ({} listings seen)",
                store.path().display(),
                seen.len()
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
