//! Secret decryption through the `helm secrets` plugin.

use crate::capability::{DecryptError, Decryptor};
use crate::logging::Logger;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Suffix the helm-secrets plugin appends to a decrypted file.
pub const DECRYPTED_SUFFIX: &str = ".dec";

/// [`Decryptor`] that shells out to `<helm> secrets dec <path>`.
///
/// The plugin writes the plaintext next to the input as `<path>.dec`.
#[derive(Debug, Clone)]
pub struct HelmSecretsDecryptor {
    helm_binary: String,
    logger: Logger,
}

impl HelmSecretsDecryptor {
    pub fn new(helm_binary: impl Into<String>, logger: Logger) -> Self {
        Self {
            helm_binary: helm_binary.into(),
            logger,
        }
    }
}

/// Path of the plaintext file produced for `path`.
pub fn decrypted_path(path: &Path) -> PathBuf {
    let mut decrypted = OsString::from(path.as_os_str());
    decrypted.push(DECRYPTED_SUFFIX);
    PathBuf::from(decrypted)
}

impl Decryptor for HelmSecretsDecryptor {
    fn decrypt(&self, path: &Path) -> Result<PathBuf, DecryptError> {
        self.logger
            .info(&format!("Decrypting secret {}", path.display()));

        let command = format!("{} secrets dec {}", self.helm_binary, path.display());
        let output = Command::new(&self.helm_binary)
            .arg("secrets")
            .arg("dec")
            .arg(path)
            .output()
            .map_err(|source| DecryptError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DecryptError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let decrypted = decrypted_path(path);
        self.logger
            .debug(&format!("Decrypted secret to {}", decrypted.display()));
        Ok(decrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypted_path_appends_suffix() {
        assert_eq!(
            decrypted_path(Path::new("/deploy/env/secrets.yaml")),
            PathBuf::from("/deploy/env/secrets.yaml.dec")
        );
    }

    #[test]
    fn test_missing_helm_binary_is_spawn_error() {
        let decryptor =
            HelmSecretsDecryptor::new("/nonexistent/bin/helm-for-tests", Logger::new());
        let err = decryptor
            .decrypt(Path::new("secrets.yaml"))
            .unwrap_err();

        match err {
            DecryptError::Spawn { command, .. } => {
                assert_eq!(command, "/nonexistent/bin/helm-for-tests secrets dec secrets.yaml");
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }
}
