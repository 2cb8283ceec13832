use anyhow::Result;
use clap::Parser;

use content_workflow::{init_telemetry, workflow_metrics, ContentWorkflowConfig};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    ContentWorkflowConfig::load_env_file()?;
    let initializing = matches!(cli.command, Commands::Init { .. });
    let mut config = ContentWorkflowConfig::load_with(cli.config.as_deref(), !initializing)?;
    if let Some(store) = cli.store {
        config.store.path = Some(store);
    }

    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("Warning: could not initialize logging: {e}");
    }

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        cli::commands::run(cli.command, &config, cli.config.as_deref(), cli.json).await
    });

    if config.observability.metrics_enabled {
        workflow_metrics().log_stats();
    }
    result
}
