//! Agent configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! | Variable                    | Field                     |
//! |-----------------------------|---------------------------|
//! | `STRATEGY_CATALOG_PATH`     | `catalog_path`            |
//! | `HOST`                      | `host`                    |
//! | `PORT`                      | `port`                    |
//! | `STRATEGY_MAX_BODY_BYTES`   | `max_body_bytes`          |
//! | `STRATEGY_EVENT_SINK_URL`   | `telemetry.event_sink_url`|
//! | `STRATEGY_EMIT_EVENTS`      | `telemetry.emit_events`   |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AgentError, Result};

pub const ENV_CATALOG_PATH: &str = "STRATEGY_CATALOG_PATH";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_MAX_BODY_BYTES: &str = "STRATEGY_MAX_BODY_BYTES";
pub const ENV_EVENT_SINK_URL: &str = "STRATEGY_EVENT_SINK_URL";
pub const ENV_EMIT_EVENTS: &str = "STRATEGY_EMIT_EVENTS";

/// Top-level agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Catalog file; the built-in matrix is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// DecisionEvent emission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_true")]
    pub emit_events: bool,

    /// HTTP endpoint receiving events; events are only logged when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_sink_url: Option<String>,

    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_true() -> bool {
    true
}

fn default_queue_size() -> usize {
    1000
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            emit_events: true,
            event_sink_url: None,
            queue_size: default_queue_size(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_path: None,
            max_body_bytes: default_max_body_bytes(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl AgentConfig {
    /// Load from an optional TOML file, then apply process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::file_error(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CATALOG_PATH).filter(|v| !v.trim().is_empty()) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = parse_var(ENV_PORT, &port)?;
        }
        if let Some(limit) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes = parse_var(ENV_MAX_BODY_BYTES, &limit)?;
        }
        if let Some(url) = lookup(ENV_EVENT_SINK_URL).filter(|v| !v.trim().is_empty()) {
            self.telemetry.event_sink_url = Some(url);
        }
        if let Some(flag) = lookup(ENV_EMIT_EVENTS) {
            self.telemetry.emit_events = parse_var(ENV_EMIT_EVENTS, &flag)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes == 0 {
            return Err(AgentError::config_error("max_body_bytes must be positive"));
        }
        if self.telemetry.queue_size == 0 {
            return Err(AgentError::config_error("telemetry.queue_size must be positive"));
        }
        Ok(())
    }

    /// Socket address string for the HTTP server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AgentError::config_error(format!("{} has invalid value '{}'", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.port, 8085);
        assert!(config.catalog_path.is_none());
        assert!(config.telemetry.emit_events);
        assert_eq!(config.bind_address(), "0.0.0.0:8085");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AgentConfig::from_toml(
            r#"
port = 9000
catalog_path = "/etc/strategy/catalog.yaml"

[telemetry]
event_sink_url = "http://sink:8080"
"#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(
            config.catalog_path.as_deref(),
            Some(Path::new("/etc/strategy/catalog.yaml"))
        );
        assert_eq!(config.telemetry.queue_size, 1000);
        assert_eq!(config.telemetry.event_sink_url.as_deref(), Some("http://sink:8080"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AgentConfig::from_toml("port = 9000").unwrap();
        config
            .apply_overrides(lookup(&[
                (ENV_PORT, "7000"),
                (ENV_CATALOG_PATH, "catalog.json"),
                (ENV_MAX_BODY_BYTES, "2048"),
                (ENV_EMIT_EVENTS, "false"),
            ]))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.catalog_path, Some(PathBuf::from("catalog.json")));
        assert_eq!(config.max_body_bytes, 2048);
        assert!(!config.telemetry.emit_events);
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let mut config = AgentConfig::default();
        let err = config.apply_overrides(lookup(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        assert!(AgentConfig::from_toml("max_body_bytes = 0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "host = \"127.0.0.1\"\n").unwrap();

        let config = AgentConfig::from_file(&path).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert!(AgentConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
