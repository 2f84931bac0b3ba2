//! # Database Persistence Layer
//!
//! Postgres implementations of the registry's storage seams via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When a database URL is configured the
//! API keeps counters, cases and directory entries in PostgreSQL. When absent
//! it runs on the in-memory stores from `efile-registry` (development and
//! tests).
//!
//! ## Tables
//!
//! - `case_number_counters`: one row per filing year, bumped atomically.
//! - `cases`: one row per case. Lookup columns plus the full case as JSONB.
//! - `directory_entries`: reference data keyed by `(kind, id)`.

pub mod cases;
pub mod counters;
pub mod directory;

use sqlx::postgres::{PgPool, PgPoolOptions};

use efile_registry::StoreError;

pub use cases::PgCaseRepository;
pub use counters::PgCounterStore;
pub use directory::PgDirectoryStore;

/// Connect to PostgreSQL and run the embedded migrations.
pub async fn init_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!(max_connections, "connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}

/// Classify a SQLx error for the registry.
///
/// Unique violations (`23505`) are conflicts, decode failures mean the
/// stored data is unreadable, everything else is treated as the database
/// being unreachable.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}
