use anyhow::Result;

use content_workflow::{ContentId, UserId, ValidationStatus, WorkflowEngine};

use super::{print_json, Command};

pub struct TransitionCommand {
    engine: WorkflowEngine,
    id: String,
    to: ValidationStatus,
    actor: String,
    notes: Option<String>,
    json: bool,
}

impl TransitionCommand {
    pub fn new(
        engine: WorkflowEngine,
        id: String,
        to: ValidationStatus,
        actor: String,
        notes: Option<String>,
    ) -> Self {
        Self {
            engine,
            id,
            to,
            actor,
            notes,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for TransitionCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.engine.resolve_actor(&UserId::new(self.actor.as_str())).await?;
        let outcome = self
            .engine
            .request_transition(&ContentId::new(self.id.as_str()), self.to, &actor, self.notes.as_deref())
            .await?;

        if self.json {
            return print_json(&serde_json::json!({
                "item": outcome.item,
                "audit_entry": outcome.entry,
                "audit": outcome.audit,
            }));
        }

        println!(
            "✅ {} moved {} -> {}",
            outcome.item.id(),
            outcome.entry.from_status,
            outcome.entry.to_status
        );
        println!("   By: {} ({})", actor.id, actor.role);
        println!("   Public status: {}", outcome.item.status());
        if let Some(notes) = &outcome.entry.notes {
            println!("   Notes: {}", notes);
        }
        if !outcome.audit_recorded() {
            println!();
            println!("⚠️  The status was saved but its audit entry was not.");
            println!("   Run 'content-workflow verify {}' and reconcile the trail.", outcome.item.id());
        }
        Ok(())
    }
}
