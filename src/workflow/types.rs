// Core types for the content validation workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Failure to parse one of the workflow enumerations from its storage name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Approval-pipeline state of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Being written, not yet submitted
    Draft,
    /// Submitted, waiting for an editor
    PendingEditor,
    /// Approved by an editor, waiting for an admin
    PendingAdmin,
    /// Approved by an admin and publicly visible
    Published,
    /// Sent back by an editor or admin
    Rejected,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 5] = [
        ValidationStatus::Draft,
        ValidationStatus::PendingEditor,
        ValidationStatus::PendingAdmin,
        ValidationStatus::Published,
        ValidationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Draft => "draft",
            ValidationStatus::PendingEditor => "pending_editor",
            ValidationStatus::PendingAdmin => "pending_admin",
            ValidationStatus::Published => "published",
            ValidationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValidationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("validation status", s))
    }
}

/// Public visibility of a content item, kept in step with the workflow only
/// at the transitions into `published` and back to `draft`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicStatus {
    Draft,
    Published,
    Archived,
}

impl PublicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicStatus::Draft => "draft",
            PublicStatus::Published => "published",
            PublicStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PublicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PublicStatus::Draft),
            "published" => Ok(PublicStatus::Published),
            "archived" => Ok(PublicStatus::Archived),
            other => Err(ParseEnumError::new("public status", other)),
        }
    }
}

/// Kind of content going through validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Event,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Event => "event",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentType::Post),
            "event" => Ok(ContentType::Event),
            other => Err(ParseEnumError::new("content type", other)),
        }
    }
}

/// Back-office role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Editor,
    Animator,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Editor, Role::Animator, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Animator => "animator",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

/// Opaque content identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a back-office user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A user acting on the workflow, with the primary role it acts under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// User directory row: display name plus role assignments in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: Option<String>,
    pub roles: Vec<Role>,
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>, display_name: Option<String>, roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            display_name,
            roles,
        }
    }

    /// The role the workflow acts on; later rows are ignored
    pub fn primary_role(&self) -> Option<Role> {
        self.roles.first().copied()
    }
}

/// A post or event going through validation.
///
/// Fields are only writable inside the crate: the workflow engine is the one
/// place that moves an item between validation states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub(crate) id: ContentId,
    pub(crate) content_type: ContentType,
    pub(crate) title: String,
    pub(crate) author_id: UserId,
    pub(crate) status: PublicStatus,
    pub(crate) validation_status: ValidationStatus,
    pub(crate) review_notes: Option<String>,
    pub(crate) rejection_reason: Option<String>,
    pub(crate) submitted_by: Option<UserId>,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
    pub(crate) reviewed_by: Option<UserId>,
    pub(crate) reviewed_at: Option<DateTime<Utc>>,
    pub(crate) validated_by: Option<UserId>,
    pub(crate) validated_at: Option<DateTime<Utc>>,
    pub(crate) published_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub(crate) fn new_draft(
        content_type: ContentType,
        title: impl Into<String>,
        author_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContentId::generate(),
            content_type,
            title: title.into(),
            author_id,
            status: PublicStatus::Draft,
            validation_status: ValidationStatus::Draft,
            review_notes: None,
            rejection_reason: None,
            submitted_by: None,
            submitted_at: None,
            reviewed_by: None,
            reviewed_at: None,
            validated_by: None,
            validated_at: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    pub fn status(&self) -> PublicStatus {
        self.status
    }

    pub fn validation_status(&self) -> ValidationStatus {
        self.validation_status
    }

    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn submitted_by(&self) -> Option<&UserId> {
        self.submitted_by.as_ref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn reviewed_by(&self) -> Option<&UserId> {
        self.reviewed_by.as_ref()
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn validated_by(&self) -> Option<&UserId> {
        self.validated_by.as_ref()
    }

    pub fn validated_at(&self) -> Option<DateTime<Utc>> {
        self.validated_at
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Publicly visible on the website
    pub fn is_public(&self) -> bool {
        self.status == PublicStatus::Published
    }
}

/// One applied transition. Entries are appended and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub content_type: ContentType,
    pub content_id: ContentId,
    pub from_status: ValidationStatus,
    pub to_status: ValidationStatus,
    pub action_by: UserId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub(crate) fn record(
        item: &ContentItem,
        from_status: ValidationStatus,
        action_by: &UserId,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type: item.content_type,
            content_id: item.id.clone(),
            from_status,
            to_status: item.validation_status,
            action_by: action_by.clone(),
            notes,
            created_at,
        }
    }
}
