//! Error types for state loading and environment resolution.
//!
//! Every failure surfaces as one of two kinds: a [`StateError::Load`] carrying
//! a context message and the typed cause, or a [`StateError::UndefinedEnv`]
//! naming an environment the document never declared.

use crate::capability::DecryptError;
use crate::render::RenderError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Document errors
    InvalidDocument,
    ConflictingReleases,

    // Value layer errors
    ValuesFile,

    // Secret layer errors
    SecretNotFound,
    SecretDecrypt,
    SecretsFile,

    // Lookup errors
    UndefinedEnvironment,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::ConflictingReleases => "CONFLICTING_RELEASES",
            ErrorCode::ValuesFile => "VALUES_FILE",
            ErrorCode::SecretNotFound => "SECRET_NOT_FOUND",
            ErrorCode::SecretDecrypt => "SECRET_DECRYPT",
            ErrorCode::SecretsFile => "SECRETS_FILE",
            ErrorCode::UndefinedEnvironment => "UNDEFINED_ENVIRONMENT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain error returned by the loader and the environment resolver.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document, or one of the layers it references, could not be loaded.
    #[error("{context}: {source}")]
    Load {
        context: String,
        #[source]
        source: LoadCause,
    },

    /// A non-default environment was requested but never declared.
    #[error("environment \"{name}\" is not defined")]
    UndefinedEnv { name: String },
}

impl StateError {
    pub fn load(context: impl Into<String>, source: impl Into<LoadCause>) -> Self {
        Self::Load {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn undefined_env(name: &str) -> Self {
        Self::UndefinedEnv {
            name: name.to_string(),
        }
    }

    /// The underlying cause of a load error.
    pub fn cause(&self) -> Option<&LoadCause> {
        match self {
            StateError::Load { source, .. } => Some(source),
            StateError::UndefinedEnv { .. } => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StateError::Load { source, .. } => source.code(),
            StateError::UndefinedEnv { .. } => ErrorCode::UndefinedEnvironment,
        }
    }

    /// Name of the undeclared environment, whether raised directly by
    /// [`State::load_env`](crate::state::State::load_env) or wrapped in a
    /// load error by [`create_from_yaml`](crate::state::create_from_yaml).
    pub fn undefined_env_name(&self) -> Option<&str> {
        match self {
            StateError::UndefinedEnv { name } => Some(name),
            StateError::Load {
                source: LoadCause::UndefinedEnv { name },
                ..
            } => Some(name),
            StateError::Load { .. } => None,
        }
    }
}

/// Typed cause wrapped by [`StateError::Load`].
#[derive(Debug, Error)]
pub enum LoadCause {
    /// The state document itself failed strict parsing.
    #[error(transparent)]
    Parse(#[from] serde_yaml::Error),

    #[error("you can't specify both `charts` and `releases` sections")]
    ConflictingReleases,

    #[error("failed to load environment values file \"{file}\": {source}")]
    ValuesFile {
        file: String,
        #[source]
        source: LayerError,
    },

    /// The secret file is absent. Carries an `io::ErrorKind::NotFound` error.
    #[error("secret file {} does not exist: {source}", .path.display())]
    SecretNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decrypt environment secrets file \"{file}\": {source}")]
    Decrypt {
        file: String,
        #[source]
        source: DecryptError,
    },

    #[error("failed to load environment secrets file \"{file}\": {source}")]
    SecretsFile {
        file: String,
        #[source]
        source: LayerError,
    },

    /// The requested environment is not declared in the document.
    #[error("environment \"{name}\" is not defined")]
    UndefinedEnv { name: String },
}

impl LoadCause {
    pub fn code(&self) -> ErrorCode {
        match self {
            LoadCause::Parse(_) => ErrorCode::InvalidDocument,
            LoadCause::ConflictingReleases => ErrorCode::ConflictingReleases,
            LoadCause::ValuesFile { .. } => ErrorCode::ValuesFile,
            LoadCause::SecretNotFound { .. } => ErrorCode::SecretNotFound,
            LoadCause::Decrypt { .. } => ErrorCode::SecretDecrypt,
            LoadCause::SecretsFile { .. } => ErrorCode::SecretsFile,
            LoadCause::UndefinedEnv { .. } => ErrorCode::UndefinedEnvironment,
        }
    }
}

/// Failure while turning one value or secret file into a mapping.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] serde_yaml::Error),

    #[error("expected a mapping at the document root, found {found}")]
    NotAMapping { found: &'static str },

    #[error("value at `{key}` is not a finite number")]
    NonFiniteNumber { key: String },

    #[error("mapping key at `{key}` must be a scalar, found {found}")]
    UnsupportedKey { key: String, found: &'static str },
}

/// Result type for state operations.
pub type StateResult<T> = std::result::Result<T, StateError>;
