use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use content_workflow::config::DEFAULT_CONFIG_FILE;
use content_workflow::{ContentWorkflowConfig, JsonFileStore, StoreBackend};

use super::Command;

pub struct InitCommand {
    config: ContentWorkflowConfig,
    force: bool,
    config_file: PathBuf,
}

impl InitCommand {
    pub fn new(config: ContentWorkflowConfig, force: bool) -> Self {
        Self {
            config,
            force,
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Write the configuration to `path` instead of content-workflow.toml
    pub fn with_config_file(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.config_file = path.to_path_buf();
        }
        self
    }
}

impl Command for InitCommand {
    async fn execute(&self) -> Result<()> {
        let config_path = self.config_file.as_path();
        if tokio::fs::try_exists(config_path).await? && !self.force {
            println!("ℹ️  {} already exists, keeping it", config_path.display());
        } else {
            if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            self.config
                .save_to_file(config_path)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("✅ Wrote {}", config_path.display());
        }

        match self.config.store.backend {
            StoreBackend::Json => {
                let store = JsonFileStore::new(self.config.store_path());
                let created = store
                    .initialize(self.force)
                    .await
                    .with_context(|| format!("Failed to create store at {}", store.path().display()))?;
                if created {
                    println!("✅ Created empty store at {}", store.path().display());
                } else {
                    println!("ℹ️  Store {} already exists, keeping it", store.path().display());
                }
            }
            StoreBackend::Sqlite => {
                super::open_store(&self.config).await?;
                println!("✅ Database ready at {}", self.config.store.location());
            }
        }

        println!();
        println!("Next steps:");
        println!("  content-workflow user add <id> --role admin --name \"...\"");
        println!("  content-workflow item add --type post --title \"...\" --as <id>");
        Ok(())
    }
}
