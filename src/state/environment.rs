//! Environment lookup and layered value/secret merging.

use super::State;
use super::document::EnvironmentSpec;
use super::load::is_blank_document;
use super::merge::merge_into;
use crate::capability::{Collaborators, Renderer};
use crate::error::{LayerError, LoadCause, StateError, StateResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;

/// Name of the environment that resolves even when not declared.
pub const DEFAULT_ENV: &str = "default";

/// A resolved environment: its name and the fully merged values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub name: String,
    pub values: Map<String, Value>,
}

impl Environment {
    /// An environment with no values.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Map::new(),
        }
    }

    /// Look up a value by dotted path, e.g. `db.host`.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut parts = dotted.split('.');
        let first = parts.next()?;
        parts.try_fold(self.values.get(first)?, |value, key| value.get(key))
    }
}

impl State {
    /// Resolve environment `name` into its merged values.
    ///
    /// A declared environment merges its values files, then its secrets files.
    /// An undeclared `default` resolves to no values; any other undeclared
    /// name is [`StateError::UndefinedEnv`].
    pub fn load_env(&self, name: &str, collaborators: &Collaborators) -> StateResult<Environment> {
        let Some(spec) = self.environments.get(name) else {
            if name != DEFAULT_ENV {
                return Err(StateError::undefined_env(name));
            }
            self.logger
                .debug("Environment \"default\" is not declared, using empty values");
            return Ok(Environment::empty(name));
        };

        let context = || format!("failed to read {}", self.file_path.display());
        let values = self
            .merge_environment(name, spec, collaborators)
            .map_err(|e| StateError::load(context(), e))?;

        Ok(Environment {
            name: name.to_string(),
            values,
        })
    }

    fn merge_environment(
        &self,
        name: &str,
        spec: &EnvironmentSpec,
        collaborators: &Collaborators,
    ) -> Result<Map<String, Value>, LoadCause> {
        let mut acc = Map::new();

        let renderer = collaborators.renderer_for(&self.base_dir);
        for file in &spec.values {
            let layer = self
                .load_values_file(renderer.as_ref(), file)
                .map_err(|source| LoadCause::ValuesFile {
                    file: file.clone(),
                    source,
                })?;
            merge_into(&mut acc, layer);
        }

        for file in &spec.secrets {
            let layer = self.load_secrets_file(collaborators, file)?;
            merge_into(&mut acc, layer);
        }

        self.logger.debug(&format!(
            "Resolved environment \"{}\" from {} values and {} secrets files",
            name,
            spec.values.len(),
            spec.secrets.len()
        ));
        Ok(acc)
    }

    fn load_values_file(
        &self,
        renderer: &dyn Renderer,
        file: &str,
    ) -> Result<Map<String, Value>, LayerError> {
        let path = self.resolve_path(file);
        self.logger
            .debug(&format!("Loading environment values file {}", path.display()));
        let bytes = renderer.render_to_bytes(&path)?;
        parse_layer(&bytes)
    }

    fn load_secrets_file(
        &self,
        collaborators: &Collaborators,
        file: &str,
    ) -> Result<Map<String, Value>, LoadCause> {
        let path = self.resolve_path(file);
        if !collaborators.reader().exists(&path) {
            return Err(LoadCause::SecretNotFound {
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("stat {}: no such file or directory", path.display()),
                ),
                path,
            });
        }

        let decrypted = collaborators
            .decryptor()
            .decrypt(&path)
            .map_err(|source| LoadCause::Decrypt {
                file: file.to_string(),
                source,
            })?;

        let secrets_file = |source: LayerError| LoadCause::SecretsFile {
            file: file.to_string(),
            source,
        };
        let bytes = collaborators
            .reader()
            .read(&decrypted)
            .map_err(|source| {
                secrets_file(LayerError::Read {
                    path: decrypted.clone(),
                    source,
                })
            })?;
        parse_layer(&bytes).map_err(secrets_file)
    }
}

/// Parse one layer as a generic mapping.
///
/// Only the first YAML document is read. A blank document is an empty layer.
fn parse_layer(bytes: &[u8]) -> Result<Map<String, Value>, LayerError> {
    if is_blank_document(bytes) {
        return Ok(Map::new());
    }
    let Some(document) = serde_yaml::Deserializer::from_slice(bytes).next() else {
        return Ok(Map::new());
    };
    match yaml_to_json(serde_yaml::Value::deserialize(document)?, "")? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(LayerError::NotAMapping {
            found: value_kind(&other),
        }),
    }
}

/// Convert a YAML value into the generic value model.
///
/// Scalar keys become strings. `.nan` and `.inf` have no JSON counterpart and
/// are rejected rather than collapsed to null.
fn yaml_to_json(value: serde_yaml::Value, at: &str) -> Result<Value, LayerError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| LayerError::NonFiniteNumber {
                        key: display_key(at),
                    })?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| yaml_to_json(item, &format!("{at}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, item) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Number(n) => n.to_string(),
                    other => {
                        return Err(LayerError::UnsupportedKey {
                            key: display_key(at),
                            found: yaml_kind(&other),
                        });
                    }
                };
                let nested = if at.is_empty() {
                    key.clone()
                } else {
                    format!("{at}.{key}")
                };
                map.insert(key, yaml_to_json(item, &nested)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value, at)?,
    })
}

fn display_key(at: &str) -> String {
    if at.is_empty() {
        "<root>".to_string()
    } else {
        at.to_string()
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
        _ => "a scalar",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
