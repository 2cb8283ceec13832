use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AuditWrite, ContentStore, StoreError};
use crate::workflow::types::{AuditEntry, ContentId, ContentItem, Role, UserId, UserRecord, ValidationStatus};

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<ContentId, ContentItem>,
    audit: Vec<AuditEntry>,
    users: HashMap<UserId, UserRecord>,
}

/// Process-local store. Commits take one write lock, so an item update and
/// its audit entry land together.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.items.contains_key(&item.id) {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }
        state.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn load_item(&self, id: &ContentId) -> Result<ContentItem, StoreError> {
        self.state
            .read()
            .await
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn save_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(item.id.clone())),
        }
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.state.write().await.audit.push(entry.clone());
        Ok(())
    }

    async fn audit_trail(&self, id: &ContentId) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .audit
            .iter()
            .filter(|entry| &entry.content_id == id)
            .cloned()
            .collect())
    }

    async fn items_with_status(&self, status: ValidationStatus) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .items
            .values()
            .filter(|item| item.validation_status == status)
            .cloned()
            .collect())
    }

    async fn list_items(&self) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.state.read().await.items.values().cloned().collect())
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.state.write().await.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn role_assignments(&self, user: &UserId) -> Result<Vec<Role>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(user)
            .map(|record| record.roles.clone())
            .unwrap_or_default())
    }

    async fn display_name(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(user)
            .and_then(|record| record.display_name.clone()))
    }

    async fn commit_transition(&self, item: &ContentItem, entry: &AuditEntry) -> Result<AuditWrite, StoreError> {
        let mut state = self.state.write().await;
        let existing = state
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(item.id.clone()))?;
        *existing = item.clone();
        state.audit.push(entry.clone());
        Ok(AuditWrite::Recorded)
    }
}
