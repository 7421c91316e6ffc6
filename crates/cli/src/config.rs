//! Configuration loading from toolwire.toml.

use policy::Policy;
use protocol::Template;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    /// Sentinel overrides for models with a different chat template.
    pub template: Template,
    pub policy: Policy,
}

/// llama.cpp server settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            max_tokens: 512,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Persona placed after the tool list.
    pub system_prompt: String,

    /// Send tool responses back to the model for a final answer.
    pub feedback: bool,

    /// Tool list JSON to advertise instead of the built-in farm tools.
    pub catalog: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            feedback: false,
            catalog: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("sensors-json.db"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.policy.validate()?;
        if let Some(marker) = config.template.blank_marker() {
            return Err(ConfigError::BlankMarker(marker));
        }
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error("template marker `{0}` must not be empty")]
    BlankMarker(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::ExtraArguments;

    #[test]
    fn empty_file_is_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:8080");
        assert_eq!(config.backend.max_tokens, 512);
        assert!(!config.session.feedback);
        assert_eq!(config.storage.database, PathBuf::from("sensors-json.db"));
        assert_eq!(config.template, Template::default());
        assert_eq!(config.policy, Policy::lenient());
    }

    #[test]
    fn blank_template_marker_is_rejected() {
        let err = Config::parse("[template]\ntool_call_start = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::BlankMarker("tool_call_start")));

        let config = Config::parse("[template]\ntool_call_start = \"<call>\"").unwrap();
        assert_eq!(config.template.tool_call_start, "<call>");
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
[backend]
url = "http://gpu-box:9000"
temperature = 0.1

[session]
feedback = true
catalog = "tools.json"

[template]
tool_call_start = "<call>"
tool_call_end = "</call>"

[policy]
extra_arguments = "reject"
tool_timeout_ms = 2000
"#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://gpu-box:9000");
        assert_eq!(config.backend.max_tokens, 512);
        assert!(config.session.feedback);
        assert_eq!(config.session.catalog, Some(PathBuf::from("tools.json")));
        assert_eq!(config.template.tool_call_start, "<call>");
        assert_eq!(config.template.tool_response_start, "<|tool_response_start|>");
        assert_eq!(config.policy.extra_arguments, ExtraArguments::Reject);
        assert_eq!(config.policy.tool_timeout_ms, Some(2000));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        assert!(matches!(
            Config::parse("[policy]\ntool_timeout_ms = 0"),
            Err(ConfigError::Policy(_))
        ));
        assert!(matches!(
            Config::parse("[backend]\nmax_tokens = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_defaults() {
        let config = Config::load_or_default("/nonexistent/toolwire.toml").unwrap();
        assert_eq!(config.session.system_prompt, "You are a helpful assistant.");
    }
}
