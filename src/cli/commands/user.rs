use anyhow::Result;

use content_workflow::{Role, UserRecord, WorkflowEngine};

use super::Command;

pub struct UserAddCommand {
    engine: WorkflowEngine,
    id: String,
    roles: Vec<Role>,
    name: Option<String>,
}

impl UserAddCommand {
    pub fn new(engine: WorkflowEngine, id: String, roles: Vec<Role>, name: Option<String>) -> Self {
        Self {
            engine,
            id,
            roles,
            name,
        }
    }
}

impl Command for UserAddCommand {
    async fn execute(&self) -> Result<()> {
        let record = UserRecord::new(self.id.as_str(), self.name.clone(), self.roles.clone());
        self.engine.store().upsert_user(&record).await?;

        let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        println!("✅ User {} saved with roles: {}", self.id, roles.join(", "));
        if let Some(primary) = record.primary_role() {
            println!("   Acts in the workflow as: {}", primary);
        }
        Ok(())
    }
}
