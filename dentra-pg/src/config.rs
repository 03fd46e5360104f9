//! Connection pool configuration.
//!
//! PostgreSQL pooling via deadpool-postgres. One connection is acquired per
//! logical store operation and returned to the pool on every exit path.

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use dentra_core::{EngineResult, StoreError};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connect and pool-wait timeout
    pub timeout: Duration,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "dentra".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PgConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("DENTRA_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("DENTRA_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("DENTRA_DB_NAME").unwrap_or_else(|_| "dentra".to_string()),
            user: std::env::var("DENTRA_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("DENTRA_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("DENTRA_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("DENTRA_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> EngineResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.connect_timeout = Some(self.timeout);

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::pool_failed(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = PgConfig::default();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.dbname, "dentra");
        assert_eq!(cfg.max_size, 16);
    }

    // Pool creation does not connect, so the sizing and timeout settings can
    // be verified without a database.
    #[tokio::test]
    async fn test_create_pool_applies_size_and_timeout() {
        let cfg = PgConfig {
            max_size: 4,
            timeout: Duration::from_secs(5),
            ..PgConfig::default()
        };
        let pool = cfg.create_pool().unwrap();
        assert_eq!(pool.status().max_size, 4);
        assert_eq!(pool.timeouts().wait, Some(Duration::from_secs(5)));
    }
}
