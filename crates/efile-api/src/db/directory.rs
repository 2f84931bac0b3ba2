//! Directory persistence over `directory_entries`.
//!
//! Case-insensitive name uniqueness for catalogue kinds and `unique_key`
//! uniqueness per kind are enforced by partial unique indexes, so a
//! duplicate insert surfaces as a [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use efile_registry::{DirectoryEntry, DirectoryStore, ReferenceKind, StoreError};

use super::store_error;

/// [`DirectoryStore`] over the `directory_entries` table.
#[derive(Debug, Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    kind: String,
    name: String,
    attributes: serde_json::Value,
    unique_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_entry(self) -> Result<DirectoryEntry, StoreError> {
        let kind = ReferenceKind::parse(&self.kind).ok_or_else(|| {
            StoreError::Corrupt(format!("directory entry {} has unknown kind {:?}", self.id, self.kind))
        })?;
        Ok(DirectoryEntry {
            id: self.id,
            kind,
            name: self.name,
            attributes: self.attributes,
            unique_key: self.unique_key,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn insert(&self, entry: DirectoryEntry) -> Result<DirectoryEntry, StoreError> {
        sqlx::query(
            "INSERT INTO directory_entries (kind, id, name, attributes, unique_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.kind.as_str())
        .bind(entry.id)
        .bind(&entry.name)
        .bind(&entry.attributes)
        .bind(&entry.unique_key)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(entry)
    }

    async fn get(&self, kind: ReferenceKind, id: &Uuid) -> Result<Option<DirectoryEntry>, StoreError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, name, attributes, unique_key, created_at
             FROM directory_entries WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<DirectoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, name, attributes, unique_key, created_at
             FROM directory_entries WHERE kind = $1 ORDER BY lower(name), id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    async fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, name, attributes, unique_key, created_at
             FROM directory_entries WHERE kind = $1 AND lower(name) = lower($2)
             ORDER BY created_at LIMIT 1",
        )
        .bind(kind.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_by_key(
        &self,
        kind: ReferenceKind,
        key: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, kind, name, attributes, unique_key, created_at
             FROM directory_entries WHERE kind = $1 AND unique_key = $2",
        )
        .bind(kind.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(EntryRow::into_entry).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

    #[test]
    fn row_keeps_unique_key() {
        let row = EntryRow {
            id: Uuid::new_v4(),
            kind: "advocate".into(),
            name: "Wanjiru Kamau".into(),
            attributes: serde_json::json!({ "practice_number": 4411 }),
            unique_key: Some("4411".into()),
            created_at: Utc::now(),
        };
        let entry = row.into_entry().unwrap();
        assert_eq!(entry.kind, ReferenceKind::Advocate);
        assert_eq!(entry.unique_key.as_deref(), Some("4411"));
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        let row = EntryRow {
            id: Uuid::new_v4(),
            kind: "judge".into(),
            name: "x".into(),
            attributes: serde_json::json!({}),
            unique_key: None,
            created_at: Utc::now(),
        };
        assert!(matches!(row.into_entry(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn schema_enforces_unique_keys_per_kind() {
        assert!(SCHEMA.contains("unique_key TEXT"));
        assert!(SCHEMA.contains(
            "CREATE UNIQUE INDEX IF NOT EXISTS directory_unique_key_idx\n    ON directory_entries (kind, unique_key)"
        ));
    }
}
