//! Subcommands that load a state file and print what it resolves to.

use crate::capability::Collaborators;
use crate::config::Settings;
use crate::format::{self, OutputFormat};
use crate::logging::Logger;
use crate::state::{self, State};
use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::path::Path;

/// Arguments for the env subcommand
#[derive(Args, Debug, Default)]
pub struct EnvArgs {
    /// Print only the value at this dotted path (e.g. `db.host`)
    #[arg(short, long, value_name = "PATH")]
    pub key: Option<String>,
}

fn read_state_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load the state file and resolve the configured environment.
pub fn run_env(
    args: &EnvArgs,
    settings: &Settings,
    output: OutputFormat,
    logger: &Logger,
) -> Result<String> {
    let content = read_state_file(&settings.state_file)?;
    let collaborators = Collaborators::os(&settings.helm_binary, logger);
    let state = state::create_from_yaml(
        &content,
        &settings.state_file,
        &settings.environment,
        logger.named("state"),
        &collaborators,
    )?;
    let env = state
        .env()
        .ok_or_else(|| anyhow!("environment was not attached to the loaded state"))?;

    match &args.key {
        Some(key) => {
            let value = env.get(key).ok_or_else(|| {
                anyhow!("key `{}` is not set in environment \"{}\"", key, env.name)
            })?;
            match (output, value) {
                (OutputFormat::Yaml, serde_json::Value::String(s)) => Ok(format!("{}\n", s)),
                (OutputFormat::Yaml, other) => Ok(serde_yaml::to_string(other)?),
                (OutputFormat::Json, other) => {
                    Ok(format!("{}\n", serde_json::to_string_pretty(other)?))
                }
            }
        }
        None => format::format_environment(env, output),
    }
}

/// Load the state file without resolving an environment.
fn load_state(settings: &Settings, logger: &Logger) -> Result<State> {
    let content = read_state_file(&settings.state_file)?;
    Ok(State::from_yaml(&content, &settings.state_file, logger.named("state"))?)
}

/// List release names after migration.
pub fn run_releases(settings: &Settings, output: OutputFormat, logger: &Logger) -> Result<String> {
    let state = load_state(settings, logger)?;
    format::format_releases(&state, output)
}

/// List declared environment names.
pub fn run_environments(
    settings: &Settings,
    output: OutputFormat,
    logger: &Logger,
) -> Result<String> {
    let state = load_state(settings, logger)?;
    format::format_environment_names(&state, output)
}
