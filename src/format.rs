//! Output formatting for resolved environments and state summaries.

use crate::state::{Environment, State};
use anyhow::Result;
use serde_json::Value;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Format the merged values of an environment.
pub fn format_environment(env: &Environment, format: OutputFormat) -> Result<String> {
    format_value(&Value::Object(env.values.clone()), format)
}

/// Format the release names of a state, one per line or as a sequence.
pub fn format_releases(state: &State, format: OutputFormat) -> Result<String> {
    let names: Vec<Value> = state
        .releases
        .iter()
        .map(|r| Value::String(r.name.clone()))
        .collect();
    format_value(&Value::Array(names), format)
}

/// Format the declared environment names of a state.
pub fn format_environment_names(state: &State, format: OutputFormat) -> Result<String> {
    let names: Vec<Value> = state
        .environment_names()
        .map(|name| Value::String(name.to_string()))
        .collect();
    format_value(&Value::Array(names), format)
}

fn format_value(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(value)?;
            out.push('\n');
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> Environment {
        let Value::Object(values) = json!({"b": {"y": 2, "x": 1}, "a": [1, 2]}) else {
            panic!("literal is an object");
        };
        Environment {
            name: "prod".to_string(),
            values,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("YAML"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_str("yml"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("toml"), None);
    }

    #[test]
    fn test_format_environment_json_sorted_keys() {
        let out = format_environment(&env(), OutputFormat::Json).unwrap();
        let a = out.find("\"a\"").unwrap();
        let b = out.find("\"b\"").unwrap();
        let x = out.find("\"x\"").unwrap();
        let y = out.find("\"y\"").unwrap();
        assert!(a < b && x < y);
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_format_environment_yaml() {
        let out = format_environment(&env(), OutputFormat::Yaml).unwrap();
        let parsed: Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"a": [1, 2], "b": {"x": 1, "y": 2}}));
    }
}
