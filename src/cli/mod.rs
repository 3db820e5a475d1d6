//! CLI command definitions for deploy-state
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod env;

use crate::config::Settings;
use crate::error::StateError;
use clap::{Parser, Subcommand};
use env::EnvArgs;

/// Resolve environment values from a deployment-state file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the deployment-state file (overrides settings)
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    /// Environment to resolve (overrides settings)
    #[arg(short, long, global = true)]
    pub environment: Option<String>,

    /// Output format: yaml or json
    #[arg(short, long, default_value = "yaml", global = true)]
    pub output: String,

    /// Helm executable used to decrypt secrets (overrides settings)
    #[arg(long, global = true)]
    pub helm_binary: Option<String>,

    /// Path to a settings file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply CLI overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(file) = &self.file {
            settings.state_file = file.into();
        }
        if let Some(environment) = &self.environment {
            settings.environment = environment.clone();
        }
        if let Some(helm_binary) = &self.helm_binary {
            settings.helm_binary = helm_binary.clone();
        }
    }
}

/// Render a command failure for stderr.
///
/// Domain errors carry their code as `error[CODE]: message`; anything else is
/// printed with its full context chain.
pub fn format_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<StateError>() {
        Some(state_err) => format!("error[{}]: {state_err}", state_err.code()),
        None => format!("error: {err:#}"),
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged values of the environment (default if no subcommand given)
    Env(EnvArgs),

    /// List release names after migrating deprecated `charts`
    Releases,

    /// List the environments declared in the state file
    Environments,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["deploy-state"]).unwrap();
        assert_eq!(cli.output, "yaml");
        assert_eq!(cli.log, "2");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_apply_to_settings() {
        let cli = Cli::try_parse_from([
            "deploy-state",
            "--file",
            "deploy/helmfile.yaml",
            "-e",
            "production",
            "--helm-binary",
            "helm3",
        ])
        .unwrap();

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.state_file, PathBuf::from("deploy/helmfile.yaml"));
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.helm_binary, "helm3");
    }

    #[test]
    fn test_format_error_state_error_has_code() {
        let err = anyhow::Error::from(StateError::undefined_env("qa"));
        assert_eq!(
            format_error(&err),
            "error[UNDEFINED_ENVIRONMENT]: environment \"qa\" is not defined"
        );

        let err = anyhow::Error::from(StateError::load(
            "failed to parse helmfile.yaml",
            crate::error::LoadCause::ConflictingReleases,
        ));
        assert_eq!(
            format_error(&err),
            "error[CONFLICTING_RELEASES]: failed to parse helmfile.yaml: \
             you can't specify both `charts` and `releases` sections"
        );
    }

    #[test]
    fn test_format_error_other_error_shows_context_chain() {
        let err = anyhow::anyhow!("no such file").context("failed to read helmfile.yaml");
        assert_eq!(format_error(&err), "error: failed to read helmfile.yaml: no such file");
    }

    #[test]
    fn test_env_subcommand_with_key() {
        let cli = Cli::try_parse_from(["deploy-state", "env", "--key", "db.host"]).unwrap();
        match cli.command {
            Some(Command::Env(args)) => assert_eq!(args.key.as_deref(), Some("db.host")),
            other => panic!("expected env subcommand, got {other:?}"),
        }
    }
}
