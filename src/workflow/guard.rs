// Transition guard - which validation moves each role may make
//
// The table is fixed at compile time. Anything not listed is denied.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{Role, ValidationStatus};

/// Who may fire a listed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any user holding a role
    AnyAuthenticated,
    /// Only the listed roles
    Roles(&'static [Role]),
}

impl Requirement {
    pub fn admits(&self, role: Role) -> bool {
        match self {
            Requirement::AnyAuthenticated => true,
            Requirement::Roles(roles) => roles.contains(&role),
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        match self {
            Requirement::AnyAuthenticated => Role::ALL.to_vec(),
            Requirement::Roles(roles) => roles.to_vec(),
        }
    }
}

const REVIEWERS: &[Role] = &[Role::Editor, Role::Admin];
const ADMINS: &[Role] = &[Role::Admin];

/// Look up the transition table.
///
/// There is no `pending_admin -> pending_editor` edge: an admin
/// who disagrees rejects, and the submitter resubmits from draft.
pub fn rule(from: ValidationStatus, to: ValidationStatus) -> Option<Requirement> {
    use ValidationStatus::*;

    match (from, to) {
        (Draft, PendingEditor) => Some(Requirement::AnyAuthenticated),
        (PendingEditor, PendingAdmin) | (PendingEditor, Rejected) => Some(Requirement::Roles(REVIEWERS)),
        (PendingAdmin, Published) | (PendingAdmin, Rejected) => Some(Requirement::Roles(ADMINS)),
        (Rejected, Draft) => Some(Requirement::AnyAuthenticated),
        (Published, Draft) => Some(Requirement::Roles(ADMINS)),
        _ => None,
    }
}

/// Why the guard refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// The move exists but the actor's role is not among `required`
    MissingRole { required: Vec<Role> },
    /// The item already has the requested status
    AlreadyInStatus,
    /// The move is not part of the workflow at all
    NotInTable,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::MissingRole { required } => {
                let names: Vec<&str> = required.iter().map(Role::as_str).collect();
                write!(f, "requires role {}", names.join(" or "))
            }
            DenyReason::AlreadyInStatus => write!(f, "content already has that status"),
            DenyReason::NotInTable => write!(f, "transition is not part of the workflow"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny(DenyReason),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Decide whether `role` may move an item from `from` to `to`
pub fn check(from: ValidationStatus, to: ValidationStatus, role: Role) -> GuardDecision {
    if from == to {
        return GuardDecision::Deny(DenyReason::AlreadyInStatus);
    }

    match rule(from, to) {
        Some(requirement) if requirement.admits(role) => GuardDecision::Allow,
        Some(requirement) => GuardDecision::Deny(DenyReason::MissingRole {
            required: requirement.roles(),
        }),
        None => GuardDecision::Deny(DenyReason::NotInTable),
    }
}

/// Roles allowed to fire a transition, or `None` when it is not in the table
pub fn allowed_roles(from: ValidationStatus, to: ValidationStatus) -> Option<Vec<Role>> {
    rule(from, to).map(|requirement| requirement.roles())
}

/// Target statuses `role` may request from `from`, for building action menus
pub fn available_transitions(from: ValidationStatus, role: Role) -> Vec<ValidationStatus> {
    ValidationStatus::ALL
        .into_iter()
        .filter(|to| check(from, *to, role).is_allowed())
        .collect()
}
