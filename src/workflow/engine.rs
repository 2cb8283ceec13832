// Workflow engine - applies guarded transitions and records them
//
// The engine is the only code path that changes an item's validation status.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use super::errors::WorkflowError;
use super::guard::{self, DenyReason, GuardDecision};
use super::history::{self, HistoryReport};
use super::queue::{self, QueueEntry, StatusCounts};
use super::types::{
    Actor, AuditEntry, ContentId, ContentItem, ContentType, PublicStatus, Role, UserId, ValidationStatus,
};
use crate::observability::{workflow_metrics, OperationTimer, WorkflowMetrics};
use crate::store::{AuditWrite, ContentStore, StoreError};
use crate::telemetry::{create_transition_span, generate_correlation_id};

/// Source of timestamps for side fields and audit entries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of an applied transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub item: ContentItem,
    pub entry: AuditEntry,
    pub audit: AuditWrite,
}

impl TransitionOutcome {
    /// False when the status changed but the audit entry is missing and the
    /// caller should surface a reconciliation warning
    pub fn audit_recorded(&self) -> bool {
        self.audit.is_recorded()
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    metrics: &'static WorkflowMetrics,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn ContentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            metrics: workflow_metrics(),
        }
    }

    /// Count into `metrics` instead of the process-wide counters
    pub fn with_metrics(mut self, metrics: &'static WorkflowMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Resolve a user to the actor it acts as: its first role row
    pub async fn resolve_actor(&self, user: &UserId) -> Result<Actor, WorkflowError> {
        let roles = self.store.role_assignments(user).await?;
        match roles.first() {
            Some(role) => Ok(Actor::new(user.clone(), *role)),
            None => {
                warn!(user = %user, "User has no role assignment");
                Err(WorkflowError::UnknownActor { user: user.clone() })
            }
        }
    }

    /// Create a new draft post or event
    pub async fn create_item(
        &self,
        content_type: ContentType,
        title: &str,
        author: &Actor,
    ) -> Result<ContentItem, WorkflowError> {
        let item = ContentItem::new_draft(content_type, title.trim(), author.id.clone(), self.clock.now());
        self.store.insert_item(&item).await?;

        info!(
            content_id = %item.id,
            content_type = %content_type,
            author = %author.id,
            "Draft created"
        );
        Ok(item)
    }

    pub async fn load_item(&self, id: &ContentId) -> Result<ContentItem, WorkflowError> {
        Ok(self.store.load_item(id).await?)
    }

    /// Move an item to `to` on behalf of `actor`.
    ///
    /// Denied requests leave the item untouched. A successful request writes
    /// the item and exactly one audit entry.
    pub async fn request_transition(
        &self,
        content_id: &ContentId,
        to: ValidationStatus,
        actor: &Actor,
        notes: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_transition_span(content_id, to, actor, &correlation_id);

        self.apply_transition(content_id, to, actor, notes)
            .instrument(span)
            .await
    }

    async fn apply_transition(
        &self,
        content_id: &ContentId,
        to: ValidationStatus,
        actor: &Actor,
        notes: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let metrics = self.metrics;

        let mut item = self.store.load_item(content_id).await.map_err(|e| {
            // An unknown id is a caller mistake, not a storage fault
            if !matches!(e, StoreError::NotFound(_)) {
                metrics.record_persistence_failure();
            }
            WorkflowError::from(e)
        })?;
        let from = item.validation_status;

        match guard::check(from, to, actor.role) {
            GuardDecision::Allow => {}
            GuardDecision::Deny(DenyReason::NotInTable) => {
                metrics.record_invalid();
                error!(
                    content_id = %content_id,
                    from = %from,
                    to = %to,
                    role = %actor.role,
                    "Transition outside the workflow requested; the caller offered a move that does not exist"
                );
                return Err(WorkflowError::InvalidTransition { from, to });
            }
            GuardDecision::Deny(reason) => {
                metrics.record_denied();
                warn!(
                    content_id = %content_id,
                    from = %from,
                    to = %to,
                    role = %actor.role,
                    reason = %reason,
                    "Transition denied"
                );
                return Err(WorkflowError::PermissionDenied {
                    from,
                    to,
                    role: actor.role,
                    reason,
                });
            }
        }

        let now = self.clock.now();
        let notes = notes.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        apply_side_fields(&mut item, from, to, &actor.id, notes.as_deref(), now);
        let entry = AuditEntry::record(&item, from, &actor.id, notes, now);

        let timer = OperationTimer::new("commit_transition");
        let audit = self.store.commit_transition(&item, &entry).await.map_err(|e| {
            metrics.record_persistence_failure();
            error!(content_id = %content_id, error = %e, "Failed to persist transition");
            WorkflowError::from(e)
        })?;
        timer.finish();

        metrics.record_applied();
        if let AuditWrite::Failed { reason } = &audit {
            metrics.record_unrecorded_audit();
            warn!(
                content_id = %content_id,
                audit_id = %entry.id,
                reason = %reason,
                "Transition applied without audit entry; reconciliation needed"
            );
        }

        info!(
            content_id = %content_id,
            from = %from,
            to = %to,
            actor = %actor.id,
            role = %actor.role,
            "Transition applied"
        );

        Ok(TransitionOutcome { item, entry, audit })
    }

    /// Audit entries of an item, oldest first
    pub async fn audit_trail(&self, content_id: &ContentId) -> Result<Vec<AuditEntry>, WorkflowError> {
        let mut entries = self.store.audit_trail(content_id).await?;
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    /// Items waiting for `role`, oldest submission first
    pub async fn list_pending(&self, role: Role) -> Result<Vec<QueueEntry>, WorkflowError> {
        Ok(queue::list_pending(self.store.as_ref(), role).await?)
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, WorkflowError> {
        Ok(queue::status_counts(self.store.as_ref()).await?)
    }

    /// Replay an item's audit trail and compare it with its stored status
    pub async fn verify_history(&self, content_id: &ContentId) -> Result<HistoryReport, WorkflowError> {
        let item = self.store.load_item(content_id).await?;
        let entries = self.audit_trail(content_id).await?;
        let report = history::verify(&item, &entries);

        if !report.is_consistent() {
            warn!(
                content_id = %content_id,
                anomalies = report.anomalies.len(),
                replayed = %report.replayed_status,
                current = %report.current_status,
                "Audit trail does not match stored status"
            );
        }
        Ok(report)
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine").finish_non_exhaustive()
    }
}

/// Update the fields that belong to the transition being applied.
///
/// `status` is only touched on entering `published` or `draft`.
fn apply_side_fields(
    item: &mut ContentItem,
    from: ValidationStatus,
    to: ValidationStatus,
    actor: &UserId,
    notes: Option<&str>,
    now: DateTime<Utc>,
) {
    match to {
        ValidationStatus::PendingEditor => {
            item.submitted_by = Some(actor.clone());
            item.submitted_at = Some(now);
        }
        ValidationStatus::PendingAdmin => {
            item.reviewed_by = Some(actor.clone());
            item.reviewed_at = Some(now);
            if let Some(notes) = notes {
                item.review_notes = Some(notes.to_string());
            }
        }
        ValidationStatus::Rejected => {
            if from == ValidationStatus::PendingAdmin {
                item.validated_by = Some(actor.clone());
                item.validated_at = Some(now);
            } else {
                item.reviewed_by = Some(actor.clone());
                item.reviewed_at = Some(now);
            }
            if let Some(notes) = notes {
                item.rejection_reason = Some(notes.to_string());
            }
        }
        ValidationStatus::Published => {
            item.validated_by = Some(actor.clone());
            item.validated_at = Some(now);
            item.status = PublicStatus::Published;
            if item.published_at.is_none() {
                item.published_at = Some(now);
            }
        }
        ValidationStatus::Draft => {
            item.status = PublicStatus::Draft;
        }
    }

    item.validation_status = to;
    item.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, MockContentStore};

    fn engine() -> WorkflowEngine {
        WorkflowEngine::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_denied_transition_leaves_item_untouched() {
        let engine = engine();
        let author = Actor::new("alice", Role::Animator);
        let item = engine.create_item(ContentType::Post, "Brocante", &author).await.unwrap();

        let result = engine
            .request_transition(item.id(), ValidationStatus::Published, &Actor::new("root", Role::Admin), None)
            .await;
        assert!(matches!(result, Err(WorkflowError::InvalidTransition { .. })));

        let reloaded = engine.load_item(item.id()).await.unwrap();
        assert_eq!(reloaded, item);
        assert!(engine.audit_trail(item.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_role_is_permission_denied() {
        let engine = engine();
        let author = Actor::new("alice", Role::Animator);
        let item = engine.create_item(ContentType::Event, "Atelier", &author).await.unwrap();
        engine
            .request_transition(item.id(), ValidationStatus::PendingEditor, &author, None)
            .await
            .unwrap();

        let err = engine
            .request_transition(item.id(), ValidationStatus::PendingAdmin, &author, Some("ok"))
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("editor or admin"));
    }

    #[tokio::test]
    async fn test_rejection_by_admin_records_validator() {
        let engine = engine();
        let author = Actor::new("alice", Role::Animator);
        let editor = Actor::new("eve", Role::Editor);
        let admin = Actor::new("adam", Role::Admin);
        let item = engine.create_item(ContentType::Post, "Bilan", &author).await.unwrap();

        engine.request_transition(item.id(), ValidationStatus::PendingEditor, &author, None).await.unwrap();
        engine.request_transition(item.id(), ValidationStatus::PendingAdmin, &editor, None).await.unwrap();
        let outcome = engine
            .request_transition(item.id(), ValidationStatus::Rejected, &admin, Some("  Photos manquantes "))
            .await
            .unwrap();

        assert_eq!(outcome.item.validated_by(), Some(&admin.id));
        assert_eq!(outcome.item.reviewed_by(), Some(&editor.id));
        assert_eq!(outcome.item.rejection_reason(), Some("Photos manquantes"));
        assert_eq!(outcome.item.status(), PublicStatus::Draft);
        assert_eq!(outcome.entry.notes.as_deref(), Some("Photos manquantes"));
    }

    #[tokio::test]
    async fn test_republishing_keeps_first_publication_date() {
        let engine = engine();
        let admin = Actor::new("adam", Role::Admin);
        let item = engine.create_item(ContentType::Post, "Rapport", &admin).await.unwrap();

        for to in [
            ValidationStatus::PendingEditor,
            ValidationStatus::PendingAdmin,
            ValidationStatus::Published,
        ] {
            engine.request_transition(item.id(), to, &admin, None).await.unwrap();
        }
        let first = engine.load_item(item.id()).await.unwrap().published_at();

        for to in [
            ValidationStatus::Draft,
            ValidationStatus::PendingEditor,
            ValidationStatus::PendingAdmin,
            ValidationStatus::Published,
        ] {
            engine.request_transition(item.id(), to, &admin, None).await.unwrap();
        }
        let reloaded = engine.load_item(item.id()).await.unwrap();
        assert_eq!(reloaded.published_at(), first);
        assert_eq!(engine.audit_trail(item.id()).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_resolve_actor_uses_first_role() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_user(&crate::workflow::types::UserRecord::new(
                "marie",
                None,
                vec![Role::Editor, Role::Admin],
            ))
            .await
            .unwrap();
        let engine = WorkflowEngine::new(store);

        let actor = engine.resolve_actor(&"marie".into()).await.unwrap();
        assert_eq!(actor.role, Role::Editor);

        let err = engine.resolve_actor(&"nobody".into()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownActor { .. }));
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_persistence_error() {
        let draft = ContentItem::new_draft(ContentType::Post, "Newsletter", "alice".into(), Utc::now());
        let id = draft.id().clone();

        let mut store = MockContentStore::new();
        store.expect_load_item().returning(move |_| Ok(draft.clone()));
        store
            .expect_commit_transition()
            .times(1)
            .returning(|_, _| Err(StoreError::Backend("connection reset".to_string())));

        let engine = WorkflowEngine::new(Arc::new(store));
        let err = engine
            .request_transition(&id, ValidationStatus::PendingEditor, &Actor::new("alice", Role::Viewer), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Persistence(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_counted_as_storage_fault() {
        let metrics: &'static WorkflowMetrics = Box::leak(Box::new(WorkflowMetrics::new()));
        let engine = engine().with_metrics(metrics);

        let err = engine
            .request_transition(
                &ContentId::new("missing"),
                ValidationStatus::PendingEditor,
                &Actor::new("alice", Role::Animator),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Persistence(StoreError::NotFound(_))));
        assert_eq!(metrics.get_stats().persistence_failures, 0);

        let mut store = MockContentStore::new();
        store
            .expect_load_item()
            .returning(|_| Err(StoreError::Backend("disk full".to_string())));
        let engine = WorkflowEngine::new(Arc::new(store)).with_metrics(metrics);
        engine
            .request_transition(
                &ContentId::new("post-1"),
                ValidationStatus::PendingEditor,
                &Actor::new("alice", Role::Animator),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(metrics.get_stats().persistence_failures, 1);
    }

    #[tokio::test]
    async fn test_denied_request_never_reaches_commit() {
        let mut draft = ContentItem::new_draft(ContentType::Event, "Concert", "alice".into(), Utc::now());
        draft.validation_status = ValidationStatus::PendingAdmin;
        let id = draft.id().clone();

        let mut store = MockContentStore::new();
        store.expect_load_item().returning(move |_| Ok(draft.clone()));
        store.expect_commit_transition().never();

        let engine = WorkflowEngine::new(Arc::new(store));
        let err = engine
            .request_transition(&id, ValidationStatus::Published, &Actor::new("vic", Role::Viewer), None)
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }
}
