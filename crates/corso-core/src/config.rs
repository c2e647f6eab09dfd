use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorsoError, Result};

/// Top-level Corso configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub flows: FlowsConfig,
}

/// Interpreter tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum steps a single run may execute before it is aborted.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Caller identity used when the host does not supply one.
    #[serde(default)]
    pub default_caller: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            default_caller: None,
        }
    }
}

fn default_max_steps() -> usize {
    64
}

/// Where flow definitions are loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowsConfig {
    /// Directory of `*.toml` / `*.json` flow files.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| CorsoError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| CorsoError::Config(e.to_string()))
    }
}

fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine.max_steps, 64);
        assert!(config.engine.default_caller.is_none());
        assert!(config.flows.dir.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[engine]
max_steps = 16
default_caller = "desk-01"

[flows]
dir = "flows"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_steps, 16);
        assert_eq!(config.engine.default_caller.as_deref(), Some("desk-01"));
        assert_eq!(config.flows.dir.as_deref(), Some(Path::new("flows")));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("CORSO_TEST_CALLER", "agent-7");
        let expanded = expand_env_vars("default_caller = \"${CORSO_TEST_CALLER}\"");
        assert_eq!(expanded, "default_caller = \"agent-7\"");

        // Unset vars are preserved verbatim
        let expanded = expand_env_vars("x = \"${CORSO_TEST_UNSET_VAR}\"");
        assert_eq!(expanded, "x = \"${CORSO_TEST_UNSET_VAR}\"");
    }
}
