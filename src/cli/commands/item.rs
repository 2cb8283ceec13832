use anyhow::Result;

use content_workflow::workflow::available_transitions;
use content_workflow::{ContentId, ContentItem, ContentType, UserId, WorkflowEngine};

use super::{print_json, Command};

pub struct ItemAddCommand {
    engine: WorkflowEngine,
    content_type: ContentType,
    title: String,
    actor: String,
    json: bool,
}

impl ItemAddCommand {
    pub fn new(engine: WorkflowEngine, content_type: ContentType, title: String, actor: String) -> Self {
        Self {
            engine,
            content_type,
            title,
            actor,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for ItemAddCommand {
    async fn execute(&self) -> Result<()> {
        let author = self.engine.resolve_actor(&UserId::new(self.actor.as_str())).await?;
        let item = self.engine.create_item(self.content_type, &self.title, &author).await?;

        if self.json {
            return print_json(&item);
        }
        println!("✅ Created {} draft {}", item.content_type(), item.id());
        println!("   Title: {}", item.title());
        Ok(())
    }
}

pub struct ItemShowCommand {
    engine: WorkflowEngine,
    id: String,
    actor: Option<String>,
    json: bool,
}

impl ItemShowCommand {
    pub fn new(engine: WorkflowEngine, id: String, actor: Option<String>) -> Self {
        Self {
            engine,
            id,
            actor,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

fn print_item(item: &ContentItem) {
    println!("📄 {} {}", item.content_type(), item.id());
    println!("   Title:             {}", item.title());
    println!("   Author:            {}", item.author_id());
    println!("   Validation status: {}", item.validation_status());
    println!("   Public status:     {}", item.status());

    let stamps = [
        ("Submitted", item.submitted_by(), item.submitted_at()),
        ("Reviewed", item.reviewed_by(), item.reviewed_at()),
        ("Validated", item.validated_by(), item.validated_at()),
    ];
    for (label, by, at) in stamps {
        if let (Some(by), Some(at)) = (by, at) {
            println!("   {:<18} {} at {}", format!("{label}:"), by, at.to_rfc3339());
        }
    }
    if let Some(published_at) = item.published_at() {
        println!("   Published at:      {}", published_at.to_rfc3339());
    }
    if let Some(notes) = item.review_notes() {
        println!("   Review notes:      {}", notes);
    }
    if let Some(reason) = item.rejection_reason() {
        println!("   Rejection reason:  {}", reason);
    }
}

impl Command for ItemShowCommand {
    async fn execute(&self) -> Result<()> {
        let item = self.engine.load_item(&ContentId::new(self.id.as_str())).await?;

        if self.json {
            return print_json(&item);
        }
        print_item(&item);

        if let Some(actor) = &self.actor {
            let actor = self.engine.resolve_actor(&UserId::new(actor.as_str())).await?;
            let moves = available_transitions(item.validation_status(), actor.role);
            if moves.is_empty() {
                println!("   No moves available to {} ({})", actor.id, actor.role);
            } else {
                let names: Vec<&str> = moves.iter().map(|status| status.as_str()).collect();
                println!("   Moves for {} ({}): {}", actor.id, actor.role, names.join(", "));
            }
        }
        Ok(())
    }
}
