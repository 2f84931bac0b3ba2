//! # Command-Line Configuration
//!
//! Every flag falls back to an environment variable so the binary can be
//! configured either way in containers.

use clap::Parser;

use crate::state::AppConfig;

/// Court e-filing case registry API server.
#[derive(Parser, Clone)]
#[command(name = "efile-api", version, about)]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// PostgreSQL connection URL. Without it the server keeps state in memory.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Shared bearer secret. Without it authentication is disabled.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "EFILE_LOG_JSON")]
    pub log_json: bool,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Cli {
    /// Settings carried in the application state.
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            auth_token: self.auth_token.clone(),
        }
    }
}
