use std::{
    ops::Deref,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use sqlx::{
    Sqlite, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use super::migration::{self, MigrationError};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to connect to database: {0}")]
    ConnectError(#[from] sqlx::Error),
    #[error(transparent)]
    MigrationError(#[from] MigrationError),
}

/// Connection pool shared by every repository of one database.
///
/// Besides the sqlite pool it carries the writer lock that serializes
/// read-modify-write operations, and the clock that hands out strictly
/// increasing history timestamps.
#[derive(Clone)]
pub struct Pool {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
    last_timestamp: Arc<AtomicI64>,
}

impl From<SqlitePool> for Pool {
    fn from(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
            last_timestamp: Arc::new(AtomicI64::new(0)),
        }
    }
}

impl Deref for Pool {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl Pool {
    pub async fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Take the writer lock and open a transaction that holds the sqlite
    /// write lock from its first statement. Keep the guard until commit.
    pub async fn begin_write(
        &self,
    ) -> Result<(MutexGuard<'_, ()>, Transaction<'static, Sqlite>), sqlx::Error> {
        let writer = self.lock_writer().await;
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok((writer, tx))
    }

    /// Current time in milliseconds, never equal to or less than a previous value
    pub fn timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = self
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    fn observe_timestamp(&self, timestamp: i64) {
        self.last_timestamp.fetch_max(timestamp, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum Location {
    File { path: PathBuf, create: bool },
    Memory,
}

/// Lazily opened database handle.
///
/// `open` may be called any number of times and from concurrent tasks, every
/// caller receives the same pool. The schema is migrated on first open.
pub struct Database {
    location: Location,
    pool: Mutex<Option<Pool>>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P, create: bool) -> Self {
        Self {
            location: Location::File {
                path: path.as_ref().to_path_buf(),
                create,
            },
            pool: Mutex::new(None),
        }
    }

    /// Private database that lives as long as the handle is open
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: Mutex::new(None),
        }
    }

    pub async fn open(&self) -> Result<Pool, DatabaseError> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = match &self.location {
            Location::File { path, create } => establish_connection(path, *create).await?,
            Location::Memory => establish_memory_connection().await?,
        };

        let version = migration::run(&pool).await?;
        debug!("database schema at version {version}");

        let last: Option<i64> = sqlx::query_scalar("SELECT MAX(timestamp) FROM history")
            .fetch_one(&pool as &SqlitePool)
            .await?;
        pool.observe_timestamp(last.unwrap_or_default());

        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Open the database without migrating it, for inspection and tests
    pub async fn open_unmigrated(&self) -> Result<Pool, DatabaseError> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = match &self.location {
            Location::File { path, create } => establish_connection(path, *create).await?,
            Location::Memory => establish_memory_connection().await?,
        };

        *guard = Some(pool.clone());
        Ok(pool)
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            info!("closing database...");
            pool.close().await;
        }
    }
}

async fn establish_connection(database_path: &Path, create: bool) -> Result<Pool, sqlx::Error> {
    let opts = SqliteConnectOptions::new()
        .create_if_missing(create)
        .filename(database_path)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .idle_timeout(std::time::Duration::from_secs(60))
        .max_lifetime(std::time::Duration::from_secs(3 * 60))
        .connect_with(opts)
        .await?;

    info!("open database at {}", database_path.display());

    Ok(Pool::from(pool))
}

async fn establish_memory_connection() -> Result<Pool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

    // every connection to :memory: is its own database, so keep exactly one alive
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;

    Ok(Pool::from(pool))
}
