use anyhow::Result;
use std::collections::BTreeMap;

use content_workflow::WorkflowEngine;

use super::{print_json, Command};

pub struct StatsCommand {
    engine: WorkflowEngine,
    json: bool,
}

impl StatsCommand {
    pub fn new(engine: WorkflowEngine) -> Self {
        Self { engine, json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for StatsCommand {
    async fn execute(&self) -> Result<()> {
        let counts = self.engine.status_counts().await?;

        if self.json {
            let by_status: BTreeMap<&str, usize> =
                counts.iter().map(|(status, count)| (status.as_str(), count)).collect();
            return print_json(&serde_json::json!({
                "total": counts.total(),
                "by_status": by_status,
            }));
        }

        println!("📊 Content by validation status");
        for (status, count) in counts.iter() {
            println!("   {:<15} {:>5}", status.as_str(), count);
        }
        println!("   {:<15} {:>5}", "total", counts.total());
        Ok(())
    }
}
