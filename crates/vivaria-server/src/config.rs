//! Environment-driven server configuration.

use vivaria_db::DbConfig;

/// Server configuration, read from `VIVARIA_*` environment variables
/// with local-development defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    /// When set, seed the base permission set, system roles, and the
    /// starter species catalog on startup (idempotent).
    pub seed: bool,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db = DbConfig {
            url: env_or("VIVARIA_DB_URL", "127.0.0.1:8000"),
            namespace: env_or("VIVARIA_DB_NS", "vivaria"),
            database: env_or("VIVARIA_DB_NAME", "main"),
            username: env_or("VIVARIA_DB_USER", "root"),
            password: env_or("VIVARIA_DB_PASS", "root"),
        };
        let seed = matches!(
            env_or("VIVARIA_SEED", "false").to_lowercase().as_str(),
            "1" | "true" | "yes"
        );
        Self { db, seed }
    }
}
