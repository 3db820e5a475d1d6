//! Strict document loading and release migration.

use super::State;
use super::document::StateDocument;
use crate::capability::Collaborators;
use crate::error::{LoadCause, StateError, StateResult};
use crate::logging::Logger;
use std::path::{Path, PathBuf};

impl State {
    /// Parse `content`, read from `file`, into a validated state.
    ///
    /// Unknown fields are rejected. A populated `charts` section is moved onto
    /// `releases`; populating both is an error.
    pub fn from_yaml(content: &[u8], file: impl AsRef<Path>, logger: Logger) -> StateResult<Self> {
        let file = file.as_ref();
        let base_dir = absolute_parent(file);
        logger.debug(&format!(
            "Loading state file {} (base directory {})",
            file.display(),
            base_dir.display()
        ));

        let mut document = parse_document(content)
            .map_err(|e| StateError::load(format!("failed to read {}", file.display()), e))?;

        let migrated = migrate_releases(&mut document)
            .map_err(|e| StateError::load(format!("failed to parse {}", file.display()), e))?;
        if migrated {
            logger.warning(&format!(
                "{}: `charts` is deprecated, rename it to `releases`",
                file.display()
            ));
        }

        Ok(Self {
            base_dir,
            file_path: file.to_path_buf(),
            context: document.context,
            namespace: document.namespace,
            repositories: document.repositories,
            helm_defaults: document.helm_defaults,
            helmfiles: document.helmfiles,
            environments: document.environments,
            releases: document.releases,
            env: None,
            logger,
        })
    }
}

/// Load a state document and resolve environment `env` against it.
///
/// The returned state carries the resolved environment. Every failure is a
/// load error in the context of `file`. An undeclared non-default environment
/// is wrapped as [`LoadCause::UndefinedEnv`] and is still reachable through
/// [`StateError::undefined_env_name`].
pub fn create_from_yaml(
    content: &[u8],
    file: impl AsRef<Path>,
    env: &str,
    logger: Logger,
    collaborators: &Collaborators,
) -> StateResult<State> {
    let mut state = State::from_yaml(content, file, logger)?;
    let environment = state
        .load_env(env, collaborators)
        .map_err(|err| match err {
            StateError::UndefinedEnv { name } => StateError::load(
                format!("failed to read {}", state.file_path().display()),
                LoadCause::UndefinedEnv { name },
            ),
            other => other,
        })?;
    state.env = Some(environment);
    Ok(state)
}

fn parse_document(content: &[u8]) -> Result<StateDocument, LoadCause> {
    if is_blank_document(content) {
        return Ok(StateDocument::default());
    }
    Ok(serde_yaml::from_slice(content)?)
}

/// Fold the deprecated `charts` section into `releases`.
///
/// Returns whether anything was moved. Idempotent: once migrated, `charts` is
/// empty and a second pass is a no-op.
fn migrate_releases(document: &mut StateDocument) -> Result<bool, LoadCause> {
    if document.deprecated_releases.is_empty() {
        return Ok(false);
    }
    if !document.releases.is_empty() {
        return Err(LoadCause::ConflictingReleases);
    }
    document.releases = std::mem::take(&mut document.deprecated_releases);
    Ok(true)
}

/// Whether a YAML document has no content besides comments and markers.
pub(crate) fn is_blank_document(content: &[u8]) -> bool {
    String::from_utf8_lossy(content).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn absolute_parent(file: &Path) -> PathBuf {
    let parent = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
}
