//! Injected I/O capabilities used during environment resolution.
//!
//! Resolution never touches the filesystem or spawns processes directly.
//! It goes through a [`FileReader`], a [`Renderer`] and a [`Decryptor`],
//! bundled into [`Collaborators`], so tests can swap in in-memory fakes.

use crate::helmexec::HelmSecretsDecryptor;
use crate::logging::Logger;
use crate::render::{RenderError, ValuesRenderer};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Read-by-path access to files.
pub trait FileReader: Send + Sync {
    /// Read the full contents of `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileReader;

impl FileReader for OsFileReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Expands template expressions in a values file, returning the rendered bytes.
pub trait Renderer: Send + Sync {
    fn render_to_bytes(&self, path: &Path) -> Result<Vec<u8>, RenderError>;
}

/// Turns an encrypted secrets file into a readable plaintext file.
///
/// Implementations return the path of the decrypted file; the resolver then
/// reads it through its [`FileReader`].
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, path: &Path) -> Result<PathBuf, DecryptError>;
}

/// Failure reported by a [`Decryptor`].
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

/// The capabilities an environment resolution runs against.
///
/// When no renderer is set, a [`ValuesRenderer`] over the same reader is built
/// for each resolution, rooted at the state's base directory.
#[derive(Clone)]
pub struct Collaborators {
    reader: Arc<dyn FileReader>,
    decryptor: Arc<dyn Decryptor>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Collaborators {
    pub fn new(reader: Arc<dyn FileReader>, decryptor: Arc<dyn Decryptor>) -> Self {
        Self {
            reader,
            decryptor,
            renderer: None,
        }
    }

    /// Local filesystem plus `helm secrets` decryption.
    pub fn os(helm_binary: impl Into<String>, logger: &Logger) -> Self {
        Self::new(
            Arc::new(OsFileReader),
            Arc::new(HelmSecretsDecryptor::new(helm_binary, logger.named("helmexec"))),
        )
    }

    /// Replace the default values renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn reader(&self) -> &dyn FileReader {
        self.reader.as_ref()
    }

    pub fn decryptor(&self) -> &dyn Decryptor {
        self.decryptor.as_ref()
    }

    /// The renderer to use for a state rooted at `base_dir`.
    pub fn renderer_for(&self, base_dir: &Path) -> Arc<dyn Renderer> {
        match &self.renderer {
            Some(renderer) => Arc::clone(renderer),
            None => Arc::new(ValuesRenderer::new(Arc::clone(&self.reader), base_dir)),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("custom_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
