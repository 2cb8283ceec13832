//! Persistence collaborator for the validation workflow.
//!
//! The engine only talks to [`ContentStore`]. Backends:
//!
//! - [`InMemoryStore`] for embedding and tests
//! - [`JsonFileStore`] for the command-line tool
//! - `SqliteStore` (feature `database`, see [`crate::database`])
//!
//! # Testing with Mocks
//!
//! ```rust,ignore
//! use content_workflow::store::{MockContentStore, StoreError};
//!
//! let mut store = MockContentStore::new();
//! store
//!     .expect_load_item()
//!     .returning(|id| Err(StoreError::NotFound(id.clone())));
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::workflow::types::{AuditEntry, ContentId, ContentItem, Role, UserId, UserRecord, ValidationStatus};

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::InMemoryStore;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content item {0} not found")]
    NotFound(ContentId),

    #[error("Content item {0} already exists")]
    AlreadyExists(ContentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored data is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Whether the audit entry of a committed transition reached the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditWrite {
    Recorded,
    /// The item was saved but its audit entry was not; needs reconciliation
    Failed { reason: String },
}

impl AuditWrite {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditWrite::Recorded)
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a freshly created item
    async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError>;

    /// Read one item by id
    async fn load_item(&self, id: &ContentId) -> Result<ContentItem, StoreError>;

    /// Overwrite the status and side fields of an existing item
    async fn save_item(&self, item: &ContentItem) -> Result<(), StoreError>;

    /// Append one audit entry
    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    /// All audit entries of an item in insertion order
    async fn audit_trail(&self, id: &ContentId) -> Result<Vec<AuditEntry>, StoreError>;

    async fn items_with_status(&self, status: ValidationStatus) -> Result<Vec<ContentItem>, StoreError>;

    async fn list_items(&self) -> Result<Vec<ContentItem>, StoreError>;

    /// Create or replace a user directory entry
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError>;

    /// Role rows of a user, primary first. Unknown users have none.
    async fn role_assignments(&self, user: &UserId) -> Result<Vec<Role>, StoreError>;

    async fn display_name(&self, user: &UserId) -> Result<Option<String>, StoreError>;

    /// Persist a transition: the updated item and its audit entry.
    ///
    /// Backends that can write both in one unit override this. The default
    /// writes the item first and only then the audit entry; an audit failure
    /// after a successful item write comes back as [`AuditWrite::Failed`]
    /// rather than an error, since the status change already happened.
    async fn commit_transition(&self, item: &ContentItem, entry: &AuditEntry) -> Result<AuditWrite, StoreError> {
        self.save_item(item).await?;

        match self.append_audit(entry).await {
            Ok(()) => Ok(AuditWrite::Recorded),
            Err(e) => {
                warn!(
                    content_id = %entry.content_id,
                    audit_id = %entry.id,
                    error = %e,
                    "Status saved but audit entry could not be written"
                );
                Ok(AuditWrite::Failed { reason: e.to_string() })
            }
        }
    }
}
