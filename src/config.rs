//! Tool settings: which state file to load, which environment, which helm.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User settings file (`~/.deploy-state.yaml`)
//! 3. Explicit settings file (`--config`)
//! 4. Environment variables
//!
//! Settings files are deep-merged field by field. CLI flags are applied on
//! top by the binary.
//!
//! ## Environment Variables
//! - `DEPLOY_STATE_HELM_BINARY` - helm executable used to decrypt secrets
//! - `DEPLOY_STATE_FILE` - state file to load
//! - `DEPLOY_STATE_ENVIRONMENT` - environment to resolve

use crate::state::{DEFAULT_ENV, deep_merge};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the user-level settings file in the home directory.
pub const USER_SETTINGS_FILE: &str = ".deploy-state.yaml";

/// Resolved tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Helm executable used for `helm secrets dec`.
    #[serde(default = "default_helm_binary")]
    pub helm_binary: String,

    /// Deployment-state document to load.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Environment to resolve.
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            helm_binary: default_helm_binary(),
            state_file: default_state_file(),
            environment: default_environment(),
        }
    }
}

fn default_helm_binary() -> String {
    "helm".to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from("helmfile.yaml")
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

impl Settings {
    /// Load settings from every tier: defaults, user file, explicit file, environment.
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self> {
        let user_file = dirs::home_dir().map(|home| home.join(USER_SETTINGS_FILE));
        Self::load_from(user_file.as_deref(), explicit, |name| std::env::var(name).ok())
    }

    /// Layered load with explicit file locations and environment lookup.
    pub fn load_from(
        user_file: Option<&Path>,
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut merged = serde_json::to_value(Settings::default())?;

        if let Some(path) = user_file.filter(|p| p.exists()) {
            debug!(path = %path.display(), "Applying user settings file");
            merged = deep_merge(merged, read_settings_value(path)?);
        }

        // An explicit file must exist.
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Applying explicit settings file");
            merged = deep_merge(merged, read_settings_value(path)?);
        }

        let mut settings: Settings =
            serde_json::from_value(merged).context("invalid settings")?;
        settings.apply_env_overrides(env);
        Ok(settings)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(helm_binary) = env("DEPLOY_STATE_HELM_BINARY") {
            self.helm_binary = helm_binary;
        }

        if let Some(state_file) = env("DEPLOY_STATE_FILE") {
            self.state_file = PathBuf::from(state_file);
        }

        if let Some(environment) = env("DEPLOY_STATE_ENVIRONMENT") {
            self.environment = environment;
        }
    }
}

fn read_settings_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_only() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml");
        let settings = Settings::load_from(Some(missing.as_path()), None, no_env).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.helm_binary, "helm");
        assert_eq!(settings.state_file, PathBuf::from("helmfile.yaml"));
        assert_eq!(settings.environment, "default");
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user.yaml");
        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&user, "helm_binary: helm3\nenvironment: staging\n").unwrap();
        std::fs::write(&explicit, "environment: production\n").unwrap();

        let settings =
            Settings::load_from(Some(user.as_path()), Some(explicit.as_path()), no_env).unwrap();
        assert_eq!(settings.helm_binary, "helm3");
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.state_file, PathBuf::from("helmfile.yaml"));
    }

    #[test]
    fn test_env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&explicit, "state_file: deploy/state.yaml\n").unwrap();

        let vars: HashMap<&str, &str> = [
            ("DEPLOY_STATE_FILE", "other.yaml"),
            ("DEPLOY_STATE_ENVIRONMENT", "qa"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::load_from(None, Some(explicit.as_path()), |name| {
            vars.get(name).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(settings.state_file, PathBuf::from("other.yaml"));
        assert_eq!(settings.environment, "qa");
        assert_eq!(settings.helm_binary, "helm");
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&explicit, "helm_bianry: helm3\n").unwrap();

        assert!(Settings::load_from(None, Some(explicit.as_path()), no_env).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let result = Settings::load_from(None, Some(missing.as_path()), no_env);
        assert!(result.is_err());
    }
}
