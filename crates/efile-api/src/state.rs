//! # Application State
//!
//! Shared state for the Axum application: the case registry, the reference
//! directory, metrics, configuration and the optional database pool.
//!
//! Two wirings exist. [`AppState::in_memory`] uses the process-local stores
//! from `efile-registry` and is what tests and local runs use.
//! [`AppState::with_pool`] puts every store on PostgreSQL.

use std::sync::Arc;

use sqlx::PgPool;

use efile_registry::{
    CaseRegistry, CaseRepository, Clock, CounterStore, Directory, DirectoryStore,
    InMemoryCaseRepository, InMemoryCounterStore, InMemoryDirectoryStore, SystemClock,
};

use crate::auth::AuthConfig;
use crate::db::{PgCaseRepository, PgCounterStore, PgDirectoryStore};
use crate::middleware::metrics::ApiMetrics;

/// Runtime configuration carried in the state.
#[derive(Clone, Default)]
pub struct AppConfig {
    /// Shared bearer secret. `None` or empty disables authentication.
    pub auth_token: Option<String>,
}

impl AppConfig {
    /// Settings for the auth middleware.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token: self.auth_token.clone().filter(|t| !t.is_empty()),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: CaseRegistry,
    pub directory: Directory,
    pub metrics: ApiMetrics,
    pub config: AppConfig,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory state on the system clock.
    pub fn in_memory(config: AppConfig) -> Result<Self, prometheus::Error> {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// In-memory state on a caller-supplied clock.
    pub fn in_memory_with_clock(
        config: AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, prometheus::Error> {
        Self::assemble(
            config,
            Arc::new(InMemoryCaseRepository::new()),
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryDirectoryStore::new()),
            clock,
            None,
        )
    }

    /// PostgreSQL-backed state. The pool must already be migrated.
    pub fn with_pool(config: AppConfig, pool: PgPool) -> Result<Self, prometheus::Error> {
        Self::assemble(
            config,
            Arc::new(PgCaseRepository::new(pool.clone())),
            Arc::new(PgCounterStore::new(pool.clone())),
            Arc::new(PgDirectoryStore::new(pool.clone())),
            Arc::new(SystemClock),
            Some(pool),
        )
    }

    fn assemble(
        config: AppConfig,
        repository: Arc<dyn CaseRepository>,
        counters: Arc<dyn CounterStore>,
        directory_store: Arc<dyn DirectoryStore>,
        clock: Arc<dyn Clock>,
        db_pool: Option<PgPool>,
    ) -> Result<Self, prometheus::Error> {
        let directory = Directory::new(directory_store, clock.clone());
        let registry = CaseRegistry::new(
            repository,
            counters,
            Arc::new(directory.clone()),
            clock,
        );
        Ok(Self {
            registry,
            directory,
            metrics: ApiMetrics::new()?,
            config,
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("hunter2".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn empty_token_disables_auth() {
        let config = AppConfig {
            auth_token: Some(String::new()),
        };
        assert!(config.auth_config().token.is_none());
        let config = AppConfig {
            auth_token: Some("s3cret".into()),
        };
        assert_eq!(config.auth_config().token.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn in_memory_state_shares_directory_with_registry() {
        let state = AppState::in_memory(AppConfig::default()).unwrap();
        assert!(state.db_pool.is_none());
        state.directory.register_court_station("Milimani").await.unwrap();
        assert!(state.directory.court_station_exists("milimani").await.unwrap());
    }
}
