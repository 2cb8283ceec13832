use thiserror::Error;

use super::guard::DenyReason;
use super::types::{Role, UserId, ValidationStatus};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Permission denied: {role} cannot move content from {from} to {to} ({reason})")]
    PermissionDenied {
        from: ValidationStatus,
        to: ValidationStatus,
        role: Role,
        reason: DenyReason,
    },
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ValidationStatus,
        to: ValidationStatus,
    },
    #[error("User {user} has no role assignment")]
    UnknownActor { user: UserId },
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl WorkflowError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, WorkflowError::PermissionDenied { .. })
    }
}
