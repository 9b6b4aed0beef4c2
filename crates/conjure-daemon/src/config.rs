//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TLS configuration (optional - enables HTTPS when present)
    ///
    /// Browsers only expose immersive AR to secure origins, so phones on the
    /// LAN need this.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the keyword catalog (built-in catalog when missing)
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String {
    "./catalog.toml".to_string()
}

/// OpenAI-compatible text completion service used for descriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API base URL (the `/chat/completions` path is appended)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_max_tokens() -> u32 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Directory holding the built web front end
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Directory of locally hosted model files, served under /models
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            models_dir: default_models_dir(),
        }
    }
}

fn default_static_dir() -> String {
    "./web".to_string()
}

fn default_models_dir() -> String {
    "./assets/models".to_string()
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        daemon: DaemonConfig {
            bind: default_bind(),
            tls: Some(TlsConfig {
                cert: "./certs/cert.pem".to_string(),
                key: "./certs/key.pem".to_string(),
            }),
        },
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("conjure.toml")).unwrap();
        assert_eq!(config.daemon.bind, "0.0.0.0:8080");
        assert!(config.daemon.tls.is_none());
        assert_eq!(config.completion.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conjure.toml");
        std::fs::write(
            &path,
            r#"
[daemon]
bind = "127.0.0.1:9000"

[completion]
model = "local-model"
timeout_secs = 3
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.daemon.bind, "127.0.0.1:9000");
        assert_eq!(config.completion.model, "local-model");
        assert_eq!(config.completion.timeout_secs, 3);
        assert_eq!(config.completion.max_tokens, 120);
        assert_eq!(config.catalog.path, "./catalog.toml");
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conjure.toml");
        std::fs::write(&path, "[daemon\nbind = ").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_save_default_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conjure.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        let tls = config.daemon.tls.unwrap();
        assert_eq!(tls.cert, "./certs/cert.pem");
        assert_eq!(config.web.models_dir, "./assets/models");
    }
}
