//! Values-file rendering.
//!
//! Expands `{{ function "argument" }}` expressions before a values file is
//! parsed. Supported functions:
//! - `readFile "path"` - contents of a file relative to the state's base directory
//! - `env "NAME"` - environment variable, empty when unset
//! - `requiredEnv "NAME"` - environment variable, an error when unset or empty
//!
//! Files without any `{{` pass through unchanged.

use crate::capability::{FileReader, Renderer};
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("expression pattern is valid"));

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z][A-Za-z0-9]*)\s+"([^"]*)"$"#).expect("call pattern is valid")
});

/// Failure while rendering a values file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8 and contains template expressions", .path.display())]
    NotUtf8 { path: PathBuf },

    #[error("unsupported template expression `{{{{{expression}}}}}` in {}", .path.display())]
    UnsupportedExpression { path: PathBuf, expression: String },

    #[error("required environment variable `{name}` is not set")]
    MissingEnv { name: String },
}

/// Default [`Renderer`] reading through an injected [`FileReader`].
pub struct ValuesRenderer {
    reader: Arc<dyn FileReader>,
    base_dir: PathBuf,
}

impl ValuesRenderer {
    pub fn new(reader: Arc<dyn FileReader>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            base_dir: base_dir.into(),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, RenderError> {
        self.reader.read(path).map_err(|source| RenderError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render already-read `content` that came from `path`.
    pub fn render(&self, path: &Path, content: Vec<u8>) -> Result<Vec<u8>, RenderError> {
        if !content.windows(2).any(|w| w == b"{{") {
            return Ok(content);
        }

        let text = String::from_utf8(content).map_err(|_| RenderError::NotUtf8 {
            path: path.to_path_buf(),
        })?;

        let mut rendered = String::with_capacity(text.len());
        let mut last = 0;
        for caps in EXPRESSION.captures_iter(&text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            rendered.push_str(&text[last..whole.start()]);
            rendered.push_str(&self.evaluate(path, inner.as_str().trim())?);
            last = whole.end();
        }
        rendered.push_str(&text[last..]);

        Ok(rendered.into_bytes())
    }

    fn evaluate(&self, path: &Path, expression: &str) -> Result<String, RenderError> {
        let unsupported = || RenderError::UnsupportedExpression {
            path: path.to_path_buf(),
            expression: expression.to_string(),
        };

        let caps = CALL.captures(expression).ok_or_else(unsupported)?;
        let (Some(function), Some(argument)) = (caps.get(1), caps.get(2)) else {
            return Err(unsupported());
        };
        let argument = argument.as_str();

        match function.as_str() {
            "readFile" => {
                let target = self.base_dir.join(argument);
                let bytes = self.read(&target)?;
                String::from_utf8(bytes).map_err(|_| RenderError::NotUtf8 { path: target })
            }
            "env" => Ok(std::env::var(argument).unwrap_or_default()),
            "requiredEnv" => match std::env::var(argument) {
                Ok(value) if !value.is_empty() => Ok(value),
                _ => Err(RenderError::MissingEnv {
                    name: argument.to_string(),
                }),
            },
            _ => Err(unsupported()),
        }
    }
}

impl Renderer for ValuesRenderer {
    fn render_to_bytes(&self, path: &Path) -> Result<Vec<u8>, RenderError> {
        let content = self.read(path)?;
        self.render(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    struct MapReader(HashMap<PathBuf, Vec<u8>>);

    impl FileReader for MapReader {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
        }

        fn exists(&self, path: &Path) -> bool {
            self.0.contains_key(path)
        }
    }

    fn renderer(files: &[(&str, &str)]) -> ValuesRenderer {
        let files = files
            .iter()
            .map(|(path, content)| (PathBuf::from(path), content.as_bytes().to_vec()))
            .collect();
        ValuesRenderer::new(Arc::new(MapReader(files)), "/deploy")
    }

    #[test]
    fn test_plain_file_passes_through() {
        let r = renderer(&[("/deploy/env/prod.yaml", "replicas: 3\n")]);
        let out = r.render_to_bytes(Path::new("/deploy/env/prod.yaml")).unwrap();
        assert_eq!(out, b"replicas: 3\n");
    }

    #[test]
    fn test_read_file_expands_relative_to_base_dir() {
        let r = renderer(&[
            ("/deploy/env/prod.yaml", "cert: {{ readFile \"certs/ca.pem\" }}\n"),
            ("/deploy/certs/ca.pem", "PEMDATA"),
        ]);
        let out = r.render_to_bytes(Path::new("/deploy/env/prod.yaml")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "cert: PEMDATA\n");
    }

    #[test]
    fn test_missing_values_file_is_read_error() {
        let r = renderer(&[]);
        let err = r.render_to_bytes(Path::new("/deploy/missing.yaml")).unwrap_err();
        match err {
            RenderError::Read { path, source } => {
                assert_eq!(path, PathBuf::from("/deploy/missing.yaml"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_of_unset_variable_is_empty() {
        let r = renderer(&[(
            "/deploy/v.yaml",
            "token: \"{{ env \"DEPLOY_STATE_TEST_SURELY_UNSET_VARIABLE\" }}\"\n",
        )]);
        let out = r.render_to_bytes(Path::new("/deploy/v.yaml")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "token: \"\"\n");
    }

    #[test]
    fn test_required_env_fails_when_unset() {
        let r = renderer(&[(
            "/deploy/v.yaml",
            "token: {{ requiredEnv \"DEPLOY_STATE_TEST_SURELY_UNSET_VARIABLE\" }}\n",
        )]);
        let err = r.render_to_bytes(Path::new("/deploy/v.yaml")).unwrap_err();
        match err {
            RenderError::MissingEnv { name } => {
                assert_eq!(name, "DEPLOY_STATE_TEST_SURELY_UNSET_VARIABLE");
            }
            other => panic!("expected missing env, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_expression_is_rejected() {
        let r = renderer(&[("/deploy/v.yaml", "name: {{ .Environment.Name }}\n")]);
        let err = r.render_to_bytes(Path::new("/deploy/v.yaml")).unwrap_err();
        match err {
            RenderError::UnsupportedExpression { expression, .. } => {
                assert_eq!(expression, ".Environment.Name");
            }
            other => panic!("expected unsupported expression, got {other:?}"),
        }
    }
}
