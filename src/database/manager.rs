use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{DatabaseConfig, RetryConfig};

const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Errors from DatabaseManager and the repositories
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if is_busy(&err) {
            DatabaseError::Busy(err.to_string())
        } else {
            DatabaseError::Sqlx(err)
        }
    }
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.is_foreign_key_violation(),
            _ => false,
        }
    }
}

/// Owns the SQLite pool and the busy-retry policy.
///
/// Cheap to clone; every repository holds its own handle.
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
    retry: RetryConfig,
}

impl DatabaseManager {
    /// Open (creating if needed) the database file. The flag reports whether
    /// the file existed before this call.
    pub async fn open(config: &DatabaseConfig) -> Result<(Self, bool), DatabaseError> {
        let existed = config.path.exists();
        ensure_parent_dir(&config.path)?;

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!("Opened database {} (new: {})", config.path.display(), !existed);
        Ok((Self::from_pool(pool, config.retry), !existed))
    }

    pub fn from_pool(pool: SqlitePool, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `op`, retrying with exponential backoff while SQLite reports the
    /// database as busy or locked. Other errors are returned immediately.
    pub async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, DatabaseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_busy(&err) && attempt + 1 < attempts => {
                    let delay = backoff(self.retry.base_delay_ms, attempt);
                    warn!("Database busy (attempt {}/{}), retrying in {:?}", attempt + 1, attempts, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed database pool");
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

fn backoff(base_delay_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
}

fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().map(|code| is_busy_code(&code)).unwrap_or(false)
                || db.message().contains("database is locked")
        }
        _ => false,
    }
}

/// SQLite extended result codes carry the primary code in the low byte.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i64>()
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}
