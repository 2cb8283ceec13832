// Content Workflow Library - validation pipeline for association content
// Posts and events move draft -> pending_editor -> pending_admin -> published

pub mod workflow;
pub mod store;
pub mod permissions;
pub mod telemetry;
pub mod observability;
pub mod config;
pub mod database;

// Re-export key types for easy access
pub use workflow::{
    Actor, AuditEntry, ContentId, ContentItem, ContentType, PublicStatus, Role, TransitionOutcome, UserId,
    UserRecord, ValidationStatus, WorkflowEngine, WorkflowError,
};
pub use store::{AuditWrite, ContentStore, InMemoryStore, JsonFileStore, StoreError};
pub use telemetry::{init_telemetry, generate_correlation_id};
pub use observability::{workflow_metrics, WorkflowMetrics, OperationTimer};
pub use config::{ContentWorkflowConfig, StoreBackend};
#[cfg(feature = "database")]
pub use database::SqliteStore;
