use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use fd_lock::RwLock;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuditWrite, ContentStore, StoreError};
use crate::workflow::types::{AuditEntry, ContentId, ContentItem, Role, UserId, UserRecord, ValidationStatus};

const DOCUMENT_VERSION: u32 = 1;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Whole store as it sits on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    users: BTreeMap<UserId, UserRecord>,
    #[serde(default)]
    items: BTreeMap<ContentId, ContentItem>,
    #[serde(default)]
    audit: Vec<AuditEntry>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            users: BTreeMap::new(),
            items: BTreeMap::new(),
            audit: Vec::new(),
        }
    }
}

/// Single-file JSON store used by the command-line tool.
///
/// Every mutation rewrites the document through a temporary file and a
/// rename, so a transition commit (item plus audit entry) is one write.
/// Separate processes on the same file coordinate through an advisory lock
/// on `<path>.lock`: writers hold it exclusively across read, apply and
/// write, readers hold it shared.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty document unless one already exists (or `force` is set)
    pub async fn initialize(&self, force: bool) -> Result<bool, StoreError> {
        let _local = self.write_lock.lock().await;
        let mut lock = self.open_lock_file().await?;
        let _guard = loop {
            match lock.try_write() {
                Ok(guard) => break guard,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
            sleep(LOCK_RETRY_INTERVAL).await;
        };

        if fs::try_exists(&self.path).await? && !force {
            debug!(file = ?self.path, "Store file already present");
            return Ok(false);
        }
        self.write_document(&StoreDocument::default()).await?;
        info!(file = ?self.path, "Initialized empty content store");
        Ok(true)
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    async fn open_lock_file(&self) -> Result<RwLock<std::fs::File>, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())
            .await?;
        Ok(RwLock::new(file.into_std().await))
    }

    /// Read the document under a shared lock
    async fn read_document(&self) -> Result<StoreDocument, StoreError> {
        let lock = self.open_lock_file().await?;
        let _guard = loop {
            match lock.try_read() {
                Ok(guard) => break guard,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
            sleep(LOCK_RETRY_INTERVAL).await;
        };
        self.load_document().await
    }

    /// Caller holds the lock file
    async fn load_document(&self) -> Result<StoreDocument, StoreError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(StoreDocument::default());
        }

        let mut file = fs::File::open(&self.path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let document: StoreDocument = serde_json::from_str(&contents)?;
        if document.version != DOCUMENT_VERSION {
            return Err(StoreError::Corrupt {
                reason: format!(
                    "unsupported store version {} (expected {})",
                    document.version, DOCUMENT_VERSION
                ),
            });
        }
        Ok(document)
    }

    /// Caller holds the lock file exclusively
    async fn write_document(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_string_pretty(document)?;

        // Write to a temporary file of our own first, then rename over the store
        let temp_file = sibling(&self.path, &format!("{}.tmp", Uuid::new_v4()));
        fs::write(&temp_file, serialized).await?;
        if let Err(e) = fs::rename(&temp_file, &self.path).await {
            let _ = fs::remove_file(&temp_file).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn update<T>(
        &self,
        apply: impl FnOnce(&mut StoreDocument) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _local = self.write_lock.lock().await;
        let mut lock = self.open_lock_file().await?;
        let _guard = loop {
            match lock.try_write() {
                Ok(guard) => break guard,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
            sleep(LOCK_RETRY_INTERVAL).await;
        };

        let mut document = self.load_document().await?;
        let output = apply(&mut document)?;
        self.write_document(&document).await?;
        Ok(output)
    }
}

/// `<path>.<suffix>` next to the store file
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[async_trait]
impl ContentStore for JsonFileStore {
    async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        self.update(|document| {
            if document.items.contains_key(&item.id) {
                return Err(StoreError::AlreadyExists(item.id.clone()));
            }
            document.items.insert(item.id.clone(), item.clone());
            Ok(())
        })
        .await
    }

    async fn load_item(&self, id: &ContentId) -> Result<ContentItem, StoreError> {
        self.read_document()
            .await?
            .items
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn save_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        self.update(|document| match document.items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(item.id.clone())),
        })
        .await
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.update(|document| {
            document.audit.push(entry.clone());
            Ok(())
        })
        .await
    }

    async fn audit_trail(&self, id: &ContentId) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .read_document()
            .await?
            .audit
            .into_iter()
            .filter(|entry| &entry.content_id == id)
            .collect())
    }

    async fn items_with_status(&self, status: ValidationStatus) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .read_document()
            .await?
            .items
            .into_values()
            .filter(|item| item.validation_status == status)
            .collect())
    }

    async fn list_items(&self) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.read_document().await?.items.into_values().collect())
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.update(|document| {
            document.users.insert(user.id.clone(), user.clone());
            Ok(())
        })
        .await
    }

    async fn role_assignments(&self, user: &UserId) -> Result<Vec<Role>, StoreError> {
        Ok(self
            .read_document()
            .await?
            .users
            .remove(user)
            .map(|record| record.roles)
            .unwrap_or_default())
    }

    async fn display_name(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_document()
            .await?
            .users
            .remove(user)
            .and_then(|record| record.display_name))
    }

    async fn commit_transition(&self, item: &ContentItem, entry: &AuditEntry) -> Result<AuditWrite, StoreError> {
        self.update(|document| {
            let existing = document
                .items
                .get_mut(&item.id)
                .ok_or_else(|| StoreError::NotFound(item.id.clone()))?;
            *existing = item.clone();
            document.audit.push(entry.clone());
            Ok(AuditWrite::Recorded)
        })
        .await
    }
}
