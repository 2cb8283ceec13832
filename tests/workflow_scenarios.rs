//! End-to-end workflow scenarios against the in-memory store
//!
//! Covers the editorial round trips (submit, review, publish, reject and
//! resubmit), queue projections and the audit-write fallback used by stores
//! that cannot commit an item and its audit entry together.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use content_workflow::workflow::{Clock, DenyReason};
use content_workflow::{
    Actor, AuditEntry, AuditWrite, ContentId, ContentItem, ContentStore, ContentType, InMemoryStore,
    PublicStatus, Role, StoreError, UserId, UserRecord, ValidationStatus, WorkflowEngine, WorkflowError,
};

/// Clock that only moves when told to
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    fn advance(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap()
}

async fn directory() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let users = [
        UserRecord::new("sophie", Some("Sophie Martin".to_string()), vec![Role::Animator]),
        UserRecord::new("marc", Some("Marc Dubois".to_string()), vec![Role::Editor, Role::Viewer]),
        UserRecord::new("claire", Some("Claire Admin".to_string()), vec![Role::Admin]),
        UserRecord::new("victor", None, vec![Role::Viewer]),
    ];
    for user in &users {
        store.upsert_user(user).await.unwrap();
    }
    store
}

async fn actor(engine: &WorkflowEngine, id: &str) -> Actor {
    engine.resolve_actor(&UserId::new(id)).await.unwrap()
}

#[tokio::test]
async fn test_submit_review_publish_then_viewer_is_denied() {
    let clock = ManualClock::starting_at(start());
    let engine = WorkflowEngine::with_clock(directory().await, clock.clone());
    let submitter = actor(&engine, "sophie").await;
    let editor = actor(&engine, "marc").await;
    let admin = actor(&engine, "claire").await;
    let viewer = actor(&engine, "victor").await;

    let item = engine
        .create_item(ContentType::Post, "Fête de quartier", &submitter)
        .await
        .unwrap();
    assert_eq!(item.validation_status(), ValidationStatus::Draft);
    assert_eq!(item.status(), PublicStatus::Draft);

    clock.advance(5);
    let submitted = engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &submitter, None)
        .await
        .unwrap();
    assert!(submitted.audit_recorded());
    assert_eq!(submitted.item.submitted_at(), Some(start() + Duration::minutes(5)));
    assert_eq!(submitted.item.submitted_by(), Some(&submitter.id));
    assert_eq!(submitted.entry.from_status, ValidationStatus::Draft);
    assert_eq!(submitted.entry.to_status, ValidationStatus::PendingEditor);

    clock.advance(60);
    let reviewed = engine
        .request_transition(
            item.id(),
            ValidationStatus::PendingAdmin,
            &editor,
            Some("Approuvé par éditeur"),
        )
        .await
        .unwrap();
    assert_eq!(reviewed.item.review_notes(), Some("Approuvé par éditeur"));
    assert_eq!(reviewed.item.reviewed_by(), Some(&editor.id));
    assert_eq!(reviewed.item.status(), PublicStatus::Draft);

    let err = engine
        .request_transition(item.id(), ValidationStatus::Published, &viewer, None)
        .await
        .unwrap_err();
    match err {
        WorkflowError::PermissionDenied { from, to, role, reason } => {
            assert_eq!(from, ValidationStatus::PendingAdmin);
            assert_eq!(to, ValidationStatus::Published);
            assert_eq!(role, Role::Viewer);
            assert!(matches!(reason, DenyReason::MissingRole { .. }));
        }
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    clock.advance(30);
    let published = engine
        .request_transition(item.id(), ValidationStatus::Published, &admin, None)
        .await
        .unwrap();
    assert_eq!(published.item.status(), PublicStatus::Published);
    assert_eq!(published.item.published_at(), Some(start() + Duration::minutes(95)));
    assert_eq!(published.item.validated_by(), Some(&admin.id));
    assert!(published.item.is_public());

    let trail = engine.audit_trail(item.id()).await.unwrap();
    let steps: Vec<_> = trail.iter().map(|e| (e.from_status, e.to_status)).collect();
    assert_eq!(
        steps,
        vec![
            (ValidationStatus::Draft, ValidationStatus::PendingEditor),
            (ValidationStatus::PendingEditor, ValidationStatus::PendingAdmin),
            (ValidationStatus::PendingAdmin, ValidationStatus::Published),
        ]
    );
    assert!(engine.verify_history(item.id()).await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_rejection_and_resubmission_keep_old_history() {
    let engine = WorkflowEngine::new(directory().await);
    let submitter = actor(&engine, "sophie").await;
    let editor = actor(&engine, "marc").await;

    let item = engine
        .create_item(ContentType::Event, "Atelier couture", &submitter)
        .await
        .unwrap();
    engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &submitter, None)
        .await
        .unwrap();

    let rejected = engine
        .request_transition(item.id(), ValidationStatus::Rejected, &editor, Some("Titre trop vague"))
        .await
        .unwrap();
    assert_eq!(rejected.item.rejection_reason(), Some("Titre trop vague"));
    assert_eq!(rejected.item.validation_status(), ValidationStatus::Rejected);

    engine
        .request_transition(item.id(), ValidationStatus::Draft, &submitter, None)
        .await
        .unwrap();
    let resubmitted = engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &submitter, None)
        .await
        .unwrap();
    assert_eq!(resubmitted.item.validation_status(), ValidationStatus::PendingEditor);

    let trail = engine.audit_trail(item.id()).await.unwrap();
    assert_eq!(trail.len(), 4);
    assert_eq!(trail[1].to_status, ValidationStatus::Rejected);
    assert_eq!(trail[1].notes.as_deref(), Some("Titre trop vague"));
    assert_eq!(trail[3].from_status, ValidationStatus::Draft);
    assert_eq!(trail[3].to_status, ValidationStatus::PendingEditor);
    assert_ne!(trail[0].id, trail[3].id);
}

#[tokio::test]
async fn test_pending_editor_cannot_skip_to_published() {
    let engine = WorkflowEngine::new(directory().await);
    let submitter = actor(&engine, "sophie").await;
    let admin = actor(&engine, "claire").await;

    let item = engine.create_item(ContentType::Post, "Agenda", &submitter).await.unwrap();
    engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &submitter, None)
        .await
        .unwrap();

    for to in [ValidationStatus::Published, ValidationStatus::Draft] {
        let err = engine.request_transition(item.id(), to, &admin, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }), "{to} should be invalid");
    }

    let err = engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &admin, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PermissionDenied {
            reason: DenyReason::AlreadyInStatus,
            ..
        }
    ));
    assert_eq!(engine.audit_trail(item.id()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_publish_and_unpublish_touch_public_status() {
    let engine = WorkflowEngine::new(directory().await);
    let admin = actor(&engine, "claire").await;
    let item = engine.create_item(ContentType::Post, "Compte rendu", &admin).await.unwrap();

    let path = [
        (ValidationStatus::PendingEditor, PublicStatus::Draft),
        (ValidationStatus::PendingAdmin, PublicStatus::Draft),
        (ValidationStatus::Published, PublicStatus::Published),
        (ValidationStatus::Draft, PublicStatus::Draft),
        (ValidationStatus::PendingEditor, PublicStatus::Draft),
        (ValidationStatus::Rejected, PublicStatus::Draft),
    ];
    for (to, expected) in path {
        let outcome = engine.request_transition(item.id(), to, &admin, None).await.unwrap();
        assert_eq!(outcome.item.status(), expected, "after moving to {to}");
    }
}

#[tokio::test]
async fn test_queues_order_by_submission_and_resolve_names() {
    let clock = ManualClock::starting_at(start());
    let engine = WorkflowEngine::with_clock(directory().await, clock.clone());
    let sophie = actor(&engine, "sophie").await;
    let victor = actor(&engine, "victor").await;
    let editor = actor(&engine, "marc").await;

    let first = engine.create_item(ContentType::Post, "Premier", &sophie).await.unwrap();
    let second = engine.create_item(ContentType::Event, "Deuxième", &victor).await.unwrap();
    let third = engine.create_item(ContentType::Post, "Troisième", &sophie).await.unwrap();

    // Submit out of creation order
    for (item, who) in [(&second, &victor), (&first, &sophie), (&third, &sophie)] {
        clock.advance(10);
        engine
            .request_transition(item.id(), ValidationStatus::PendingEditor, who, None)
            .await
            .unwrap();
    }
    engine
        .request_transition(third.id(), ValidationStatus::PendingAdmin, &editor, None)
        .await
        .unwrap();

    let editor_queue = engine.list_pending(Role::Editor).await.unwrap();
    let ids: Vec<&ContentId> = editor_queue.iter().map(|entry| &entry.id).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);
    assert_eq!(editor_queue[0].submitter_name, "victor");
    assert_eq!(editor_queue[1].submitter_name, "Sophie Martin");
    assert_eq!(editor_queue[0].content_type, ContentType::Event);

    let admin_queue = engine.list_pending(Role::Admin).await.unwrap();
    assert_eq!(admin_queue.len(), 1);
    assert_eq!(admin_queue[0].title, "Troisième");

    assert!(engine.list_pending(Role::Animator).await.unwrap().is_empty());
    assert!(engine.list_pending(Role::Viewer).await.unwrap().is_empty());

    let counts = engine.status_counts().await.unwrap();
    assert_eq!(counts.get(ValidationStatus::PendingEditor), 2);
    assert_eq!(counts.get(ValidationStatus::PendingAdmin), 1);
    assert_eq!(counts.get(ValidationStatus::Published), 0);
    assert_eq!(counts.total(), 3);
}

/// Store whose audit log is unavailable; relies on the default
/// item-then-audit commit
struct FailingAuditStore {
    inner: InMemoryStore,
}

#[async_trait]
impl ContentStore for FailingAuditStore {
    async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        self.inner.insert_item(item).await
    }

    async fn load_item(&self, id: &ContentId) -> Result<ContentItem, StoreError> {
        self.inner.load_item(id).await
    }

    async fn save_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        self.inner.save_item(item).await
    }

    async fn append_audit(&self, _entry: &AuditEntry) -> Result<(), StoreError> {
        Err(StoreError::Backend("audit table locked".to_string()))
    }

    async fn audit_trail(&self, id: &ContentId) -> Result<Vec<AuditEntry>, StoreError> {
        self.inner.audit_trail(id).await
    }

    async fn items_with_status(&self, status: ValidationStatus) -> Result<Vec<ContentItem>, StoreError> {
        self.inner.items_with_status(status).await
    }

    async fn list_items(&self) -> Result<Vec<ContentItem>, StoreError> {
        self.inner.list_items().await
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.inner.upsert_user(user).await
    }

    async fn role_assignments(&self, user: &UserId) -> Result<Vec<Role>, StoreError> {
        self.inner.role_assignments(user).await
    }

    async fn display_name(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        self.inner.display_name(user).await
    }
}

#[tokio::test]
async fn test_audit_failure_after_status_write_is_reported_for_reconciliation() {
    let store = Arc::new(FailingAuditStore {
        inner: InMemoryStore::new(),
    });
    let engine = WorkflowEngine::new(store);
    let author = Actor::new("sophie", Role::Animator);

    let item = engine.create_item(ContentType::Post, "Vide-grenier", &author).await.unwrap();
    let outcome = engine
        .request_transition(item.id(), ValidationStatus::PendingEditor, &author, None)
        .await
        .unwrap();

    assert!(!outcome.audit_recorded());
    assert!(matches!(outcome.audit, AuditWrite::Failed { .. }));
    assert_eq!(
        engine.load_item(item.id()).await.unwrap().validation_status(),
        ValidationStatus::PendingEditor
    );

    let report = engine.verify_history(item.id()).await.unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.replayed_status, ValidationStatus::Draft);
}

#[tokio::test]
async fn test_unknown_item_is_a_persistence_error() {
    let engine = WorkflowEngine::new(directory().await);
    let admin = actor(&engine, "claire").await;

    let err = engine
        .request_transition(&ContentId::new("missing"), ValidationStatus::PendingEditor, &admin, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Persistence(StoreError::NotFound(_))));
}
