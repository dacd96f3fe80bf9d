//! Configuration for the Daemon backend.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DAEMON_*)
//! 2. Config file (YAML, path in DAEMON_CONFIG)
//! 3. Defaults

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub gcp: Option<GcpConfig>,
    #[serde(default)]
    pub webhook_base_url: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GcpConfig {
    pub project_id: Option<String>,
    pub bucket: Option<String>,
    pub collection: Option<String>,
    pub secret_prefix: Option<String>,
}

/// Which backend implementations the server wires up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Google Cloud REST backends (production)
    Gcp,

    /// In-process backends (local development, tests)
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gcp" => Ok(Self::Gcp),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown backend '{}': expected 'gcp' or 'memory'", other),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Backend selection
    pub backend: BackendKind,

    /// Google Cloud project id
    pub project_id: String,

    /// Bucket holding workflow code blobs
    pub bucket: String,

    /// Metadata collection holding deployment records
    pub collection: String,

    /// Prefix applied to secret ids
    pub secret_prefix: String,

    /// Base URL webhook paths are appended to
    pub webhook_base_url: String,

    /// Gemini model used for code generation
    pub gemini_model: String,
}

impl Config {
    /// Load configuration from environment, optional config file, and
    /// defaults, in that order of precedence.
    pub fn load() -> Result<Self> {
        let file = match std::env::var("DAEMON_CONFIG") {
            Ok(path) => load_config_file(Path::new(&path))?,
            Err(_) => ConfigFile::default(),
        };
        Self::resolve(file)
    }

    fn resolve(file: ConfigFile) -> Result<Self> {
        let gcp = file.gcp.unwrap_or_default();

        let backend = env_or("DAEMON_BACKEND", file.backend, "gcp")
            .parse::<BackendKind>()?;

        Ok(Self {
            bind_addr: env_or("DAEMON_BIND_ADDR", file.bind_addr, "0.0.0.0:8080"),
            backend,
            project_id: env_or("DAEMON_GCP_PROJECT", gcp.project_id, "daemon-mvp"),
            bucket: env_or("DAEMON_GCS_BUCKET", gcp.bucket, "daemon-mvp-workflows"),
            collection: env_or("DAEMON_FIRESTORE_COLLECTION", gcp.collection, "workflows"),
            secret_prefix: env_or("DAEMON_SECRET_PREFIX", gcp.secret_prefix, "daemon-mvp"),
            webhook_base_url: env_or(
                "DAEMON_WEBHOOK_BASE_URL",
                file.webhook_base_url,
                "https://daemon-executor.example.com",
            ),
            gemini_model: env_or("DAEMON_GEMINI_MODEL", file.gemini_model, "gemini-1.5-flash"),
        })
    }
}

/// env var > config file value > default
fn env_or(var: &str, file_value: Option<String>, default: &str) -> String {
    std::env::var(var)
        .ok()
        .or(file_value)
        .unwrap_or_else(|| default.to_string())
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(ConfigFile::default()).unwrap();

        assert_eq!(config.collection, "workflows");
        assert_eq!(config.secret_prefix, "daemon-mvp");
        assert_eq!(config.backend, BackendKind::Gcp);
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("daemon.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
bind_addr: "127.0.0.1:9000"
backend: memory
gcp:
  project_id: my-project
  bucket: my-bucket
webhook_base_url: "https://hooks.example.net"
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.bind_addr, Some("127.0.0.1:9000".to_string()));
        assert_eq!(parsed.backend, Some("memory".to_string()));

        let config = Config::resolve(parsed).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.project_id, "my-project");
        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.webhook_base_url, "https://hooks.example.net");
        // Unset file values fall through to defaults
        assert_eq!(config.collection, "workflows");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let file = ConfigFile {
            backend: Some("redis".to_string()),
            ..ConfigFile::default()
        };

        assert!(Config::resolve(file).is_err());
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("gcp".parse::<BackendKind>().unwrap(), BackendKind::Gcp);
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert!("".parse::<BackendKind>().is_err());
    }
}
