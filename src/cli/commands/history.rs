use anyhow::Result;

use content_workflow::workflow::HistoryAnomaly;
use content_workflow::{ContentId, WorkflowEngine};

use super::{print_json, Command};

pub struct HistoryCommand {
    engine: WorkflowEngine,
    id: String,
    json: bool,
}

impl HistoryCommand {
    pub fn new(engine: WorkflowEngine, id: String) -> Self {
        Self {
            engine,
            id,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for HistoryCommand {
    async fn execute(&self) -> Result<()> {
        let id = ContentId::new(self.id.as_str());
        // Fails with NotFound for unknown ids instead of printing an empty trail
        self.engine.load_item(&id).await?;
        let entries = self.engine.audit_trail(&id).await?;

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("📭 No transitions recorded for {}", id);
            return Ok(());
        }

        println!("🕘 History of {}:", id);
        for entry in &entries {
            println!(
                "   {}  {} -> {}  by {}",
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.from_status,
                entry.to_status,
                entry.action_by
            );
            if let Some(notes) = &entry.notes {
                println!("      {}", notes);
            }
        }
        Ok(())
    }
}

pub struct VerifyCommand {
    engine: WorkflowEngine,
    id: String,
    json: bool,
}

impl VerifyCommand {
    pub fn new(engine: WorkflowEngine, id: String) -> Self {
        Self {
            engine,
            id,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for VerifyCommand {
    async fn execute(&self) -> Result<()> {
        let report = self.engine.verify_history(&ContentId::new(self.id.as_str())).await?;

        if self.json {
            print_json(&report)?;
        } else if report.is_consistent() {
            println!(
                "✅ {}: {} entries replay to {}",
                report.content_id, report.entries, report.current_status
            );
        } else {
            println!("❌ {}: audit trail does not match the stored status", report.content_id);
            println!("   Stored:   {}", report.current_status);
            println!("   Replayed: {}", report.replayed_status);
            for anomaly in &report.anomalies {
                match anomaly {
                    HistoryAnomaly::Gap {
                        entry_id,
                        expected_from,
                        recorded_from,
                    } => println!(
                        "   • entry {} starts at {} but the trail was at {}",
                        entry_id, recorded_from, expected_from
                    ),
                    HistoryAnomaly::IllegalStep { entry_id, from, to } => {
                        println!("   • entry {} records {} -> {}, which is not a workflow move", entry_id, from, to)
                    }
                }
            }
        }

        if !report.is_consistent() {
            anyhow::bail!("Audit trail of {} needs reconciliation", report.content_id);
        }
        Ok(())
    }
}
