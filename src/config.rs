use std::net::SocketAddr;
use std::time::Duration;

use anyhow::anyhow;

use crate::AppError;

/// Server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub run_migrations: bool,
    pub analytics_cache_ttl: Duration,
}

impl Config {
    /// Reads configuration from environment variables.
    ///
    /// The .env file is only loaded in the development environment
    /// (bypassed with the --release flag).
    pub fn from_env() -> Result<Self, AppError> {
        #[cfg(debug_assertions)]
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow!("DATABASE_URL environment variable not found"))?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

        let run_migrations = std::env::var("RUN_MIGRATIONS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        let analytics_cache_ttl = std::env::var("ANALYTICS_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Config {
            database_url,
            bind_addr,
            run_migrations,
            analytics_cache_ttl,
        })
    }
}
