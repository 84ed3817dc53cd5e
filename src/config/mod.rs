//! Configuration management for the Baton client
//!
//! Handles loading, parsing, and validating the YAML configuration file.

use crate::codec::CodecKind;
use crate::profiles::{default_greetings, Profile, Tables};
use crate::session::Endpoint;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub codec: CodecKind,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default = "default_greetings")]
    pub greetings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

/// WebSocket relay connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            codec: CodecKind::default(),
            profile: Profile::default(),
            greetings: default_greetings(),
            flags: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&content).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parse and validate configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &str) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.server.connect_timeout_ms == 0 {
            anyhow::bail!("server.connect_timeout_ms must be greater than 0");
        }

        if self.profile == Profile::Greeter && self.greetings.is_empty() {
            anyhow::bail!("Profile 'greeter' requires at least one greeting");
        }
        if !self.flags.is_empty() && self.flags.len() != self.greetings.len() {
            anyhow::bail!(
                "flags has {} entries but greetings has {} (must match)",
                self.flags.len(),
                self.greetings.len()
            );
        }

        Ok(())
    }

    /// WebSocket endpoint built from the server section
    pub fn endpoint(&self) -> Result<Endpoint> {
        let endpoint = Endpoint::new(self.server.host.clone(), self.server.port)
            .context("Invalid server address")?
            .secure(self.server.secure);
        Ok(endpoint)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.server.connect_timeout_ms)
    }

    /// Greeter lookup tables
    pub fn tables(&self) -> Tables {
        Tables {
            greetings: self.greetings.clone(),
            flags: self.flags.clone(),
        }
    }
}

// Default value functions
fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 8081 }
fn default_connect_timeout_ms() -> u64 { 5000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.endpoint().unwrap().url(), "ws://localhost:8081/");
        assert_eq!(config.greetings[3], "Bonjour");
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
server:
  host: 10.10.0.159
  port: 9000
  secure: true
  connect_timeout_ms: 250
codec: json
profile: display
greetings: ["-", "Hi"]
flags: ["a", "b"]
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.codec, CodecKind::Json);
        assert_eq!(config.profile, Profile::Display);
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.endpoint().unwrap().url(), "wss://10.10.0.159:9000/");
        assert_eq!(config.tables().flags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_validation_errors() {
        assert!(AppConfig::from_yaml("server: { port: 0 }").is_err());
        assert!(AppConfig::from_yaml("server: { host: '' }").is_err());
        assert!(AppConfig::from_yaml("server: { connect_timeout_ms: 0 }").is_err());
        assert!(AppConfig::from_yaml("profile: greeter\ngreetings: []").is_err());
        assert!(AppConfig::from_yaml("flags: [one]").is_err());
        assert!(AppConfig::from_yaml("profile: unknown").is_err());
    }

    #[test]
    fn test_monitor_needs_no_greetings() {
        let config = AppConfig::from_yaml("profile: monitor\ngreetings: []").unwrap();
        assert_eq!(config.profile, Profile::Monitor);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let path = path.to_str().unwrap();

        let mut config = AppConfig::default();
        config.server.port = 9001;
        config.profile = Profile::Monitor;
        config.save(path).await.unwrap();

        let loaded = AppConfig::load(path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/baton.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
