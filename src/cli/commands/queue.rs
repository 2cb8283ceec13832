use anyhow::Result;

use content_workflow::{Role, WorkflowEngine};

use super::{print_json, Command};

pub struct QueueCommand {
    engine: WorkflowEngine,
    role: Role,
    json: bool,
}

impl QueueCommand {
    pub fn new(engine: WorkflowEngine, role: Role) -> Self {
        Self {
            engine,
            role,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for QueueCommand {
    async fn execute(&self) -> Result<()> {
        let entries = self.engine.list_pending(self.role).await?;

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("📭 Nothing waiting for {}", self.role);
            return Ok(());
        }

        println!("📋 Waiting for {} ({}):", self.role, entries.len());
        for entry in &entries {
            let submitted = entry
                .submitted_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {}  {:<5}  {:<16}  {}  {}",
                submitted, entry.content_type.as_str(), entry.submitter_name, entry.id, entry.title
            );
        }
        Ok(())
    }
}
