//! Per-year case number counters.
//!
//! The increment is a single upsert, so two filings in the same year can
//! never read the same value regardless of how many API instances share
//! the database.

use async_trait::async_trait;
use sqlx::PgPool;

use efile_core::FilingYear;
use efile_registry::{CounterStore, StoreError};

use super::store_error;

/// [`CounterStore`] over the `case_number_counters` table.
#[derive(Debug, Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sequence_from_row(year: FilingYear, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("counter for {year} out of range: {value}")))
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, year: FilingYear) -> Result<u32, StoreError> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO case_number_counters (year, last_sequence) VALUES ($1, 1)
             ON CONFLICT (year) DO UPDATE
                 SET last_sequence = case_number_counters.last_sequence + 1
             RETURNING last_sequence",
        )
        .bind(i32::from(year.value()))
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        sequence_from_row(year, value)
    }

    async fn current(&self, year: FilingYear) -> Result<u32, StoreError> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT last_sequence FROM case_number_counters WHERE year = $1")
                .bind(i32::from(year.value()))
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        sequence_from_row(year, value.unwrap_or(0))
    }
}
