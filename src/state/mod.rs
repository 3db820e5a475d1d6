//! Deployment state: loading, release migration and environment resolution.
//!
//! ## Flow
//! 1. [`State::from_yaml`] strictly parses the document and migrates the
//!    deprecated `charts` section onto `releases`
//! 2. [`State::load_env`] locates the requested environment and merges its
//!    value files, then its secret files, into one mapping
//! 3. [`create_from_yaml`] does both and attaches the resolved [`Environment`]
//!
//! ## Merge order
//! Values files first, in declared order, then secrets files, in declared
//! order. The last layer to define a key wins; mappings merge recursively,
//! a null never erases an earlier value, and anything else is replaced whole.

mod document;
mod environment;
mod load;
mod merge;

pub use document::{EnvironmentSpec, HelmSpec, ReleaseSpec, ReleaseValues, RepositorySpec, SetValue};
pub use environment::{DEFAULT_ENV, Environment};
pub use load::create_from_yaml;
pub use merge::{deep_merge, merge_into};

use crate::logging::Logger;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A loaded, validated deployment-state document.
///
/// Only the canonical `releases` section survives loading; the deprecated
/// `charts` spelling is folded in by the loader.
#[derive(Debug, Clone)]
pub struct State {
    base_dir: PathBuf,
    file_path: PathBuf,
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub repositories: Vec<RepositorySpec>,
    pub helm_defaults: HelmSpec,
    pub helmfiles: Vec<String>,
    pub environments: BTreeMap<String, EnvironmentSpec>,
    pub releases: Vec<ReleaseSpec>,
    env: Option<Environment>,
    logger: Logger,
}

impl State {
    /// Absolute directory every relative reference resolves against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the document this state was loaded from.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The resolved environment, once attached by [`create_from_yaml`].
    pub fn env(&self) -> Option<&Environment> {
        self.env.as_ref()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Names of the declared environments, sorted.
    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Resolve `relative` against the base directory.
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }
}
