use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "content-workflow.toml";
pub const DEFAULT_JSON_PATH: &str = ".content-workflow/store.json";
pub const DEFAULT_SQLITE_URL: &str = "sqlite://content-workflow.db";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentWorkflowConfig {
    /// Where content items, users and the audit log live
    pub store: StoreConfig,
    /// Logging and metrics settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Single JSON document
    Json,
    /// SQLite database (requires the `database` feature)
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON file path, or SQLite database URL; defaults per backend when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Maximum connections in the SQLite pool
    pub max_connections: u32,
    /// Run embedded migrations when opening SQLite
    pub auto_migrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: None,
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub json_logs: bool,
    /// Log workflow counters on exit
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
            metrics_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Configured path, or the default location for the selected backend
    pub fn location(&self) -> &str {
        match (&self.path, self.backend) {
            (Some(path), _) => path,
            (None, StoreBackend::Json) => DEFAULT_JSON_PATH,
            (None, StoreBackend::Sqlite) => DEFAULT_SQLITE_URL,
        }
    }
}

impl ContentWorkflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`explicit`, or content-workflow.toml if present)
    /// 3. Environment variables (CONTENT_WORKFLOW_STORE__PATH, ...)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, true)
    }

    /// Like [`load`](Self::load), but an explicit file may be missing when
    /// `required` is false (`init` is about to create it)
    pub fn load_with(explicit: Option<&Path>, required: bool) -> Result<Self> {
        let mut builder = Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(required));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CONTENT_WORKFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(self.store.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_json_store() {
        let config = ContentWorkflowConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Json);
        assert_eq!(config.store.location(), DEFAULT_JSON_PATH);
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.toml");
        std::fs::write(&path, "[store]\nbackend = \"sqlite\"\npath = \"sqlite://content.db\"\n").unwrap();

        let config = ContentWorkflowConfig::load(Some(&path)).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.location(), "sqlite://content.db");
        assert_eq!(config.store.max_connections, 5);
        assert_eq!(config.observability.log_level, "warn");
    }

    #[test]
    fn test_sqlite_backend_without_path_uses_database_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.toml");
        std::fs::write(&path, "[store]\nbackend = \"sqlite\"\n").unwrap();

        let config = ContentWorkflowConfig::load(Some(&path)).unwrap();
        assert_eq!(config.store.path, None);
        assert_eq!(config.store.location(), DEFAULT_SQLITE_URL);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = ContentWorkflowConfig::default();
        config.observability.json_logs = true;
        config.save_to_file(&path).unwrap();

        let loaded = ContentWorkflowConfig::load(Some(&path)).unwrap();
        assert!(loaded.observability.json_logs);
    }
}
