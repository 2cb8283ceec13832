use anyhow::Result;
use std::collections::BTreeMap;

use content_workflow::permissions::{grants, Module, Permission};
use content_workflow::Role;

use super::{print_json, Command};

pub struct PermissionsCommand {
    role: Option<Role>,
    json: bool,
}

impl PermissionsCommand {
    pub fn new(role: Option<Role>, json: bool) -> Self {
        Self { role, json }
    }

    fn roles(&self) -> Vec<Role> {
        match self.role {
            Some(role) => vec![role],
            None => Role::ALL.to_vec(),
        }
    }
}

fn by_module(role: Role) -> BTreeMap<Module, Vec<Permission>> {
    let mut modules: BTreeMap<Module, Vec<Permission>> = BTreeMap::new();
    for (module, permission) in grants(role) {
        modules.entry(module).or_default().push(permission);
    }
    modules
}

impl Command for PermissionsCommand {
    async fn execute(&self) -> Result<()> {
        if self.json {
            let matrix: BTreeMap<&str, BTreeMap<Module, Vec<Permission>>> = self
                .roles()
                .into_iter()
                .map(|role| (role.as_str(), by_module(role)))
                .collect();
            return print_json(&matrix);
        }

        for role in self.roles() {
            println!("🔐 {}", role);
            let modules = by_module(role);
            if modules.is_empty() {
                println!("   (no access)");
            }
            for (module, permissions) in modules {
                let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
                println!("   {:<13} {}", module.as_str(), names.join(", "));
            }
        }
        Ok(())
    }
}
