#[cfg(feature = "database")]
use async_trait::async_trait;
#[cfg(feature = "database")]
use chrono::{DateTime, Utc};
#[cfg(feature = "database")]
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, sqlite::SqliteRow, Row, SqlitePool};
#[cfg(feature = "database")]
use std::str::FromStr;
#[cfg(feature = "database")]
use tracing::info;

#[cfg(feature = "database")]
use crate::store::{AuditWrite, ContentStore, StoreError};
#[cfg(feature = "database")]
use crate::workflow::types::{AuditEntry, ContentId, ContentItem, Role, UserId, UserRecord, ValidationStatus};

#[cfg(feature = "database")]
const ITEM_COLUMNS: &str = "id, content_type, title, author_id, status, validation_status, review_notes, \
     rejection_reason, submitted_by, submitted_at, reviewed_by, reviewed_at, validated_by, validated_at, \
     published_at, created_at, updated_at";

#[cfg(feature = "database")]
/// SQLite-backed content store
pub struct SqliteStore {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteStore {
    /// Open (and create if needed) the database, optionally running migrations
    pub async fn connect(database_url: &str, max_connections: u32, auto_migrate: bool) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[cfg(feature = "database")]
fn parse_enum<T: FromStr>(value: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| StoreError::Corrupt { reason: e.to_string() })
}

#[cfg(feature = "database")]
fn parse_time(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            reason: format!("bad timestamp '{value}': {e}"),
        })
}

#[cfg(feature = "database")]
fn parse_optional_time(value: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    value.as_deref().map(parse_time).transpose()
}

#[cfg(feature = "database")]
fn format_time(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.to_rfc3339())
}

#[cfg(feature = "database")]
fn item_from_row(row: &SqliteRow) -> Result<ContentItem, StoreError> {
    Ok(ContentItem {
        id: ContentId::new(row.try_get::<String, _>("id")?),
        content_type: parse_enum(&row.try_get::<String, _>("content_type")?)?,
        title: row.try_get("title")?,
        author_id: UserId::new(row.try_get::<String, _>("author_id")?),
        status: parse_enum(&row.try_get::<String, _>("status")?)?,
        validation_status: parse_enum(&row.try_get::<String, _>("validation_status")?)?,
        review_notes: row.try_get("review_notes")?,
        rejection_reason: row.try_get("rejection_reason")?,
        submitted_by: row.try_get::<Option<String>, _>("submitted_by")?.map(UserId::new),
        submitted_at: parse_optional_time(row.try_get("submitted_at")?)?,
        reviewed_by: row.try_get::<Option<String>, _>("reviewed_by")?.map(UserId::new),
        reviewed_at: parse_optional_time(row.try_get("reviewed_at")?)?,
        validated_by: row.try_get::<Option<String>, _>("validated_by")?.map(UserId::new),
        validated_at: parse_optional_time(row.try_get("validated_at")?)?,
        published_at: parse_optional_time(row.try_get("published_at")?)?,
        created_at: parse_time(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_time(&row.try_get::<String, _>("updated_at")?)?,
    })
}

#[cfg(feature = "database")]
fn audit_from_row(row: &SqliteRow) -> Result<AuditEntry, StoreError> {
    let id: String = row.try_get("id")?;
    Ok(AuditEntry {
        id: id.parse().map_err(|e| StoreError::Corrupt {
            reason: format!("bad audit id '{id}': {e}"),
        })?,
        content_type: parse_enum(&row.try_get::<String, _>("content_type")?)?,
        content_id: ContentId::new(row.try_get::<String, _>("content_id")?),
        from_status: parse_enum(&row.try_get::<String, _>("from_status")?)?,
        to_status: parse_enum(&row.try_get::<String, _>("to_status")?)?,
        action_by: UserId::new(row.try_get::<String, _>("action_by")?),
        notes: row.try_get("notes")?,
        created_at: parse_time(&row.try_get::<String, _>("created_at")?)?,
    })
}

#[cfg(feature = "database")]
const UPDATE_ITEM: &str = r#"
    UPDATE content_items
    SET status = ?2, validation_status = ?3, review_notes = ?4, rejection_reason = ?5,
        submitted_by = ?6, submitted_at = ?7, reviewed_by = ?8, reviewed_at = ?9,
        validated_by = ?10, validated_at = ?11, published_at = ?12, updated_at = ?13
    WHERE id = ?1
"#;

#[cfg(feature = "database")]
const INSERT_AUDIT: &str = r#"
    INSERT INTO validation_history
        (id, content_type, content_id, from_status, to_status, action_by, notes, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

#[cfg(feature = "database")]
fn update_item_query(item: &ContentItem) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(UPDATE_ITEM)
        .bind(item.id.as_str())
        .bind(item.status.as_str())
        .bind(item.validation_status.as_str())
        .bind(item.review_notes.as_deref())
        .bind(item.rejection_reason.as_deref())
        .bind(item.submitted_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.submitted_at))
        .bind(item.reviewed_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.reviewed_at))
        .bind(item.validated_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.validated_at))
        .bind(format_time(item.published_at))
        .bind(item.updated_at.to_rfc3339())
}

#[cfg(feature = "database")]
fn insert_audit_query(entry: &AuditEntry) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(INSERT_AUDIT)
        .bind(entry.id.to_string())
        .bind(entry.content_type.as_str())
        .bind(entry.content_id.as_str())
        .bind(entry.from_status.as_str())
        .bind(entry.to_status.as_str())
        .bind(entry.action_by.as_str())
        .bind(entry.notes.as_deref())
        .bind(entry.created_at.to_rfc3339())
}

#[cfg(feature = "database")]
#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "INSERT OR IGNORE INTO content_items ({ITEM_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ))
        .bind(item.id.as_str())
        .bind(item.content_type.as_str())
        .bind(&item.title)
        .bind(item.author_id.as_str())
        .bind(item.status.as_str())
        .bind(item.validation_status.as_str())
        .bind(item.review_notes.as_deref())
        .bind(item.rejection_reason.as_deref())
        .bind(item.submitted_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.submitted_at))
        .bind(item.reviewed_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.reviewed_at))
        .bind(item.validated_by.as_ref().map(UserId::as_str))
        .bind(format_time(item.validated_at))
        .bind(format_time(item.published_at))
        .bind(item.created_at.to_rfc3339())
        .bind(item.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }
        Ok(())
    }

    async fn load_item(&self, id: &ContentId) -> Result<ContentItem, StoreError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM content_items WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn save_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        let result = update_item_query(item).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(item.id.clone()));
        }
        Ok(())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        insert_audit_query(entry).execute(&self.pool).await?;
        Ok(())
    }

    async fn audit_trail(&self, id: &ContentId) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_type, content_id, from_status, to_status, action_by, notes, created_at
            FROM validation_history
            WHERE content_id = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(audit_from_row).collect()
    }

    async fn items_with_status(&self, status: ValidationStatus) -> Result<Vec<ContentItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items WHERE validation_status = ?1"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn list_items(&self) -> Result<Vec<ContentItem>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM content_items"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR REPLACE INTO users (id, display_name) VALUES (?1, ?2)")
            .bind(user.id.as_str())
            .bind(user.display_name.as_deref())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?1")
            .bind(user.id.as_str())
            .execute(&mut *tx)
            .await?;

        for (position, role) in user.roles.iter().enumerate() {
            sqlx::query("INSERT INTO user_roles (user_id, role, position) VALUES (?1, ?2, ?3)")
                .bind(user.id.as_str())
                .bind(role.as_str())
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn role_assignments(&self, user: &UserId) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY position ASC")
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| parse_enum(&row.try_get::<String, _>("role")?))
            .collect()
    }

    async fn display_name(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT display_name FROM users WHERE id = ?1")
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("display_name")?),
            None => Ok(None),
        }
    }

    async fn commit_transition(&self, item: &ContentItem, entry: &AuditEntry) -> Result<AuditWrite, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = update_item_query(item).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(item.id.clone()));
        }
        insert_audit_query(entry).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(AuditWrite::Recorded)
    }
}
