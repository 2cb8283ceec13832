use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use content_workflow::{ContentStore, ContentWorkflowConfig, JsonFileStore, StoreBackend, WorkflowEngine};

pub mod history;
pub mod init;
pub mod item;
pub mod permissions;
pub mod queue;
pub mod stats;
pub mod transition;
pub mod user;

use super::{Commands, ItemCommands, UserCommands};

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Open the configured store backend
pub async fn open_store(config: &ContentWorkflowConfig) -> Result<Arc<dyn ContentStore>> {
    match config.store.backend {
        StoreBackend::Json => Ok(Arc::new(JsonFileStore::new(config.store_path()))),
        StoreBackend::Sqlite => open_sqlite(config).await,
    }
}

#[cfg(feature = "database")]
async fn open_sqlite(config: &ContentWorkflowConfig) -> Result<Arc<dyn ContentStore>> {
    let url = config.store.location();
    if !url.starts_with("sqlite:") {
        anyhow::bail!("The sqlite store backend needs a sqlite: database URL, got '{url}'");
    }
    let store = content_workflow::SqliteStore::connect(
        url,
        config.store.max_connections,
        config.store.auto_migrate,
    )
    .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "database"))]
async fn open_sqlite(_config: &ContentWorkflowConfig) -> Result<Arc<dyn ContentStore>> {
    anyhow::bail!("The sqlite store backend requires building with the `database` feature")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(config: &ContentWorkflowConfig) -> Result<WorkflowEngine> {
    Ok(WorkflowEngine::new(open_store(config).await?))
}

/// Dispatch a parsed command
pub async fn run(
    command: Commands,
    config: &ContentWorkflowConfig,
    config_file: Option<&Path>,
    json: bool,
) -> Result<()> {
    match command {
        Commands::Init { force } => {
            init::InitCommand::new(config.clone(), force)
                .with_config_file(config_file)
                .execute()
                .await
        }
        Commands::Permissions { role } => permissions::PermissionsCommand::new(role, json).execute().await,
        Commands::User {
            command: UserCommands::Add { id, roles, name },
        } => {
            user::UserAddCommand::new(connect(config).await?, id, roles, name)
                .execute()
                .await
        }
        Commands::Item {
            command: ItemCommands::Add {
                content_type,
                title,
                actor,
            },
        } => {
            item::ItemAddCommand::new(connect(config).await?, content_type, title, actor)
                .with_json(json)
                .execute()
                .await
        }
        Commands::Item {
            command: ItemCommands::Show { id, actor },
        } => {
            item::ItemShowCommand::new(connect(config).await?, id, actor)
                .with_json(json)
                .execute()
                .await
        }
        Commands::Transition { id, to, actor, notes } => {
            transition::TransitionCommand::new(connect(config).await?, id, to, actor, notes)
                .with_json(json)
                .execute()
                .await
        }
        Commands::Queue { role } => {
            queue::QueueCommand::new(connect(config).await?, role)
                .with_json(json)
                .execute()
                .await
        }
        Commands::History { id } => {
            history::HistoryCommand::new(connect(config).await?, id)
                .with_json(json)
                .execute()
                .await
        }
        Commands::Verify { id } => {
            history::VerifyCommand::new(connect(config).await?, id)
                .with_json(json)
                .execute()
                .await
        }
        Commands::Stats => {
            stats::StatsCommand::new(connect(config).await?)
                .with_json(json)
                .execute()
                .await
        }
    }
}
