//! deploy-state CLI
//!
//! Loads a deployment-state file and prints the merged values of one
//! environment, or summaries of the releases and environments it declares.

use anyhow::{Result, anyhow};
use clap::Parser;
use deploy_state::cli::env::{EnvArgs, run_env, run_environments, run_releases};
use deploy_state::cli::{Cli, Command, format_error};
use deploy_state::config::Settings;
use deploy_state::format::OutputFormat;
use deploy_state::logging::{LogLevel, LogLevelFilter, Logger, log_level_to_tracing};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::FmtSubscriber;

fn min_level(cli: &Cli) -> LogLevel {
    if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = log_level_to_tracing(min_level(cli));
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let output = OutputFormat::from_str(&cli.output)
        .ok_or_else(|| anyhow!("unknown output format `{}` (expected yaml or json)", cli.output))?;

    let mut settings = Settings::load_layered(cli.config.as_deref().map(Path::new))?;
    cli.apply_overrides(&mut settings);
    debug!(
        state_file = %settings.state_file.display(),
        environment = %settings.environment,
        helm_binary = %settings.helm_binary,
        "Resolved settings"
    );

    let logger = Logger::new()
        .with_name("deploy-state")
        .with_level_filter(Arc::new(LogLevelFilter::new(min_level(cli))));

    match &cli.command {
        None => run_env(&EnvArgs::default(), &settings, output, &logger),
        Some(Command::Env(args)) => run_env(args, &settings, output, &logger),
        Some(Command::Releases) => run_releases(&settings, output, &logger),
        Some(Command::Environments) => run_environments(&settings, output, &logger),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli) {
        eprintln!("error: failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", format_error(&err));
            ExitCode::FAILURE
        }
    }
}
