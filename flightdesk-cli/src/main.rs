// flightdesk-cli/src/main.rs
mod models;
mod rendering;
mod repl;
mod web;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use flightdesk_core::{AppConfig, FlightAssistant, Secrets};
use models::cli::{Cli, Commands};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use time::macros::format_description;
use tracing::{Level, debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE_NAME: &str = "flightdesk.log";

fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn log_directory() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::runtime_dir)
        .unwrap_or_else(env::temp_dir)
        .join("flightdesk")
}

/// Installs stderr and file logging. The returned guard flushes the file
/// writer on drop and must outlive the program's work.
fn init_logging(verbose: u8) -> Result<(WorkerGuard, PathBuf)> {
    let default_level = level_for_verbosity(verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(local_timer.clone())
        .with_target(false)
        .with_level(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_timer(local_timer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok((guard, log_dir.join(LOG_FILE_NAME)))
}

/// Loads config and keys and builds the assistant. Missing keys stop here.
fn build_assistant(cli: &Cli) -> Result<(FlightAssistant, AppConfig)> {
    let (config, config_path) = AppConfig::load(cli.config.as_deref())?;
    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No Flightdesk.toml found; using default configuration."),
    }
    let secrets = Secrets::from_env(&config)?;
    let assistant = FlightAssistant::from_config(config.clone(), &secrets)?;
    Ok((assistant, config))
}

/// The one line shown to the user when a run fails.
fn failure_message(e: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red(), e)
}

async fn run(cli: Cli) -> Result<()> {
    let (assistant, config) = build_assistant(&cli)?;

    match (&cli.command, &cli.ask) {
        (Some(Commands::Serve { bind }), _) => {
            let bind = bind.clone().unwrap_or_else(|| config.server.bind.clone());
            let session_ttl = Duration::from_secs(config.server.session_ttl_secs);
            web::serve(assistant, &bind, session_ttl).await
        }
        (None, Some(question)) => repl::run_single_turn(&assistant, question).await,
        (None, None) => repl::run_interactive(&assistant).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    colored::control::set_override(true);
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (_guard, log_path) = match init_logging(cli.verbose) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            return ExitCode::FAILURE;
        }
    };
    colored::control::unset_override();

    info!(
        "Logging initialized. Level determined by RUST_LOG or -v flags (default: {}). Logging to stderr and {}",
        level_for_verbosity(cli.verbose),
        log_path.display()
    );

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The stderr layer would repeat the message shown below.
            debug!(error = ?e, "Operation failed");
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
        assert_eq!(level_for_verbosity(1), Level::INFO);
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
        assert_eq!(level_for_verbosity(7), Level::TRACE);
    }

    #[test]
    fn test_missing_key_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Flightdesk.toml");
        fs::write(
            &path,
            "[model]\napi_key_env_var = \"FLIGHTDESK_TEST_UNSET_LLM_KEY\"\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["flightdesk", "--config", path.to_str().unwrap()]).unwrap();

        let Err(e) = build_assistant(&cli) else {
            panic!("build_assistant should fail without an LLM key");
        };
        let message = failure_message(&e);
        assert!(message.contains("Missing API key"), "{}", message);
        assert_eq!(message.matches("FLIGHTDESK_TEST_UNSET_LLM_KEY").count(), 1);
    }
}
