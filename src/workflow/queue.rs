// Review queues - read-only projections over validation status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{ContentId, ContentType, Role, ValidationStatus};
use crate::store::{ContentStore, StoreError};

/// One line of a review queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: ContentId,
    pub content_type: ContentType,
    pub title: String,
    pub submitter_name: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Status whose items wait on `role`, if that role reviews anything
pub fn queue_status_for(role: Role) -> Option<ValidationStatus> {
    match role {
        Role::Editor => Some(ValidationStatus::PendingEditor),
        Role::Admin => Some(ValidationStatus::PendingAdmin),
        Role::Animator | Role::Viewer => None,
    }
}

pub async fn list_pending(store: &dyn ContentStore, role: Role) -> Result<Vec<QueueEntry>, StoreError> {
    let Some(status) = queue_status_for(role) else {
        return Ok(Vec::new());
    };

    let mut items = store.items_with_status(status).await?;
    // Oldest submission first; unsubmitted items (should not happen) last
    items.sort_by(|a, b| {
        let key = |at: Option<DateTime<Utc>>| (at.is_none(), at);
        key(a.submitted_at)
            .cmp(&key(b.submitted_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let submitter = item.submitted_by.clone().unwrap_or_else(|| item.author_id.clone());
        let submitter_name = store
            .display_name(&submitter)
            .await?
            .unwrap_or_else(|| submitter.to_string());

        entries.push(QueueEntry {
            id: item.id,
            content_type: item.content_type,
            title: item.title,
            submitter_name,
            submitted_at: item.submitted_at,
        });
    }
    Ok(entries)
}

/// Number of items in each validation status, every status present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts(BTreeMap<ValidationStatus, usize>);

impl StatusCounts {
    pub fn get(&self, status: ValidationStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValidationStatus, usize)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

pub async fn status_counts(store: &dyn ContentStore) -> Result<StatusCounts, StoreError> {
    let mut counts: BTreeMap<ValidationStatus, usize> =
        ValidationStatus::ALL.into_iter().map(|status| (status, 0)).collect();

    for item in store.list_items().await? {
        *counts.entry(item.validation_status).or_default() += 1;
    }
    Ok(StatusCounts(counts))
}
