//! Case persistence.
//!
//! Each case is one row in `cases`: the columns the registry filters on
//! (number, advocate, court station, version) plus the whole case as a
//! JSONB `document`. Stage rules run in Rust via [`Case::apply`]; the
//! database only fences writes on `version`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use efile_core::{AdvocateId, CaseId, CaseNumber, CourtStationId};
use efile_registry::repository::newest_first;
use efile_registry::{Case, CaseRepository, RegistryError, StagePatch, StoreError};

use super::store_error;

/// [`CaseRepository`] over the `cases` table.
#[derive(Debug, Clone)]
pub struct PgCaseRepository {
    pool: PgPool,
}

impl PgCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &'static str, id: Uuid) -> Result<Vec<Case>, RegistryError> {
        let sql = format!("SELECT id, version, document FROM cases WHERE {column} = $1");
        let rows = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let mut cases = rows
            .into_iter()
            .map(CaseRow::into_case)
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut cases);
        Ok(cases)
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CaseRow {
    id: Uuid,
    version: i64,
    document: serde_json::Value,
}

impl CaseRow {
    fn into_case(self) -> Result<Case, StoreError> {
        let case: Case = serde_json::from_value(self.document)
            .map_err(|e| StoreError::Corrupt(format!("case {}: {e}", self.id)))?;
        if i64::try_from(case.version).ok() != Some(self.version) {
            return Err(StoreError::Corrupt(format!(
                "case {}: version column {} disagrees with document version {}",
                self.id, self.version, case.version
            )));
        }
        if !case.payloads_consistent() {
            return Err(StoreError::Corrupt(format!(
                "case {}: stage {} does not match its recorded payloads",
                self.id, case.stage
            )));
        }
        Ok(case)
    }
}

fn version_param(case: &Case) -> Result<i64, StoreError> {
    i64::try_from(case.version)
        .map_err(|_| StoreError::Corrupt(format!("case {}: version overflow", case.id)))
}

fn document(case: &Case) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(case)
        .map_err(|e| StoreError::Corrupt(format!("failed to serialize case {}: {e}", case.id)))
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn get(&self, id: &CaseId) -> Result<Case, RegistryError> {
        let row = sqlx::query_as::<_, CaseRow>(
            "SELECT id, version, document FROM cases WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => Ok(row.into_case()?),
            None => Err(RegistryError::case_not_found(id)),
        }
    }

    async fn create(&self, case: Case) -> Result<Case, RegistryError> {
        let document = document(&case)?;
        let version = version_param(&case)?;
        let filed_at: DateTime<Utc> = case.filing.filed_at;

        sqlx::query(
            "INSERT INTO cases (id, year, sequence, stage, version, advocate_id,
                                court_station_id, filed_at, updated_at, document)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(case.id.as_uuid())
        .bind(i32::from(case.case_number.year.value()))
        .bind(i64::from(case.case_number.sequence))
        .bind(case.stage.as_str())
        .bind(version)
        .bind(case.filing.advocate.as_uuid())
        .bind(case.filing.court_station.as_uuid())
        .bind(filed_at)
        .bind(case.updated_at)
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(case)
    }

    async fn conditional_update(
        &self,
        id: &CaseId,
        expected_version: u64,
        patch: StagePatch,
    ) -> Result<Case, RegistryError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row = sqlx::query_as::<_, CaseRow>(
            "SELECT id, version, document FROM cases WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let mut case = match row {
            Some(row) => row.into_case()?,
            None => return Err(RegistryError::case_not_found(id)),
        };

        if case.version != expected_version {
            return Err(RegistryError::ConcurrentModification {
                case_id: *id,
                expected: expected_version,
                actual: case.version,
            });
        }

        case.apply(patch)?;
        let document = document(&case)?;

        sqlx::query(
            "UPDATE cases SET stage = $1, version = $2, updated_at = $3, document = $4
             WHERE id = $5",
        )
        .bind(case.stage.as_str())
        .bind(version_param(&case)?)
        .bind(case.updated_at)
        .bind(&document)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(case)
    }

    async fn list_by_advocate(&self, advocate: &AdvocateId) -> Result<Vec<Case>, RegistryError> {
        self.list_where("advocate_id", *advocate.as_uuid()).await
    }

    async fn list_by_court_station(
        &self,
        station: &CourtStationId,
    ) -> Result<Vec<Case>, RegistryError> {
        self.list_where("court_station_id", *station.as_uuid()).await
    }

    async fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, RegistryError> {
        let row = sqlx::query_as::<_, CaseRow>(
            "SELECT id, version, document FROM cases WHERE year = $1 AND sequence = $2",
        )
        .bind(i32::from(number.year.value()))
        .bind(i64::from(number.sequence))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(CaseRow::into_case).transpose()?)
    }
}
