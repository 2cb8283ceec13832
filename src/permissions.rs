// Back-office permission matrix (role x module x permission)
//
// Advisory for screens and menus. Validation moves are decided by
// `workflow::guard`, never by this table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflow::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Posts,
    Events,
    Activities,
    Testimonials,
    Navigation,
    Users,
    Validation,
}

impl Module {
    pub const ALL: [Module; 7] = [
        Module::Posts,
        Module::Events,
        Module::Activities,
        Module::Testimonials,
        Module::Navigation,
        Module::Users,
        Module::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Posts => "posts",
            Module::Events => "events",
            Module::Activities => "activities",
            Module::Testimonials => "testimonials",
            Module::Navigation => "navigation",
            Module::Users => "users",
            Module::Validation => "validation",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    View,
    Create,
    Edit,
    Delete,
    Publish,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::View,
        Permission::Create,
        Permission::Edit,
        Permission::Delete,
        Permission::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Create => "create",
            Permission::Edit => "edit",
            Permission::Delete => "delete",
            Permission::Publish => "publish",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn can(role: Role, module: Module, permission: Permission) -> bool {
    use Module::*;
    use Permission::*;

    match role {
        Role::Admin => true,
        Role::Editor => match module {
            Posts | Events | Activities | Testimonials => true,
            Navigation => matches!(permission, View | Edit),
            Validation => matches!(permission, View | Publish),
            Users => permission == View,
        },
        Role::Animator => match module {
            Events | Activities => matches!(permission, View | Create | Edit),
            Posts => matches!(permission, View | Create),
            Testimonials => permission == View,
            Navigation | Users | Validation => false,
        },
        Role::Viewer => matches!(module, Posts | Events | Activities | Testimonials) && permission == View,
    }
}

/// Every (module, permission) pair granted to `role`, in table order
pub fn grants(role: Role) -> Vec<(Module, Permission)> {
    Module::ALL
        .into_iter()
        .flat_map(|module| Permission::ALL.into_iter().map(move |permission| (module, permission)))
        .filter(|(module, permission)| can(role, *module, *permission))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        assert_eq!(grants(Role::Admin).len(), Module::ALL.len() * Permission::ALL.len());
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(grants(Role::Viewer).iter().all(|(_, p)| *p == Permission::View));
        assert!(!can(Role::Viewer, Module::Users, Permission::View));
    }

    #[test]
    fn test_animator_cannot_publish_or_manage_users() {
        for module in Module::ALL {
            assert!(!can(Role::Animator, module, Permission::Publish));
            assert!(!can(Role::Animator, module, Permission::Delete));
        }
        assert!(can(Role::Animator, Module::Events, Permission::Create));
    }

    #[test]
    fn test_editor_reviews_but_does_not_administer_users() {
        assert!(can(Role::Editor, Module::Validation, Permission::Publish));
        assert!(!can(Role::Editor, Module::Users, Permission::Edit));
    }
}
