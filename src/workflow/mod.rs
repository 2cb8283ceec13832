// Content validation workflow
//
// draft -> pending_editor -> pending_admin -> published, with rejected as the
// way back. The guard decides, the engine applies, the audit log remembers.

pub mod engine;
pub mod errors;
pub mod guard;
pub mod history;
pub mod queue;
pub mod types;

pub use engine::{Clock, SystemClock, TransitionOutcome, WorkflowEngine};
pub use errors::WorkflowError;
pub use guard::{available_transitions, check, DenyReason, GuardDecision};
pub use history::{HistoryAnomaly, HistoryReport};
pub use queue::{QueueEntry, StatusCounts};
pub use types::{
    Actor, AuditEntry, ContentId, ContentItem, ContentType, PublicStatus, Role, UserId, UserRecord,
    ValidationStatus,
};
