//! Versioned schema of the local database.
//!
//! The version lives in `PRAGMA user_version`. Every version step runs in its
//! own transaction together with the version bump, so a failed step leaves the
//! database exactly at the previous version and the next open retries it from
//! a clean state.
//!
//! * v1: `comic` and the legacy `library` table holding one JSON document per comic
//! * v2: `history` with its comic and comic+chapter indexes, the flat
//!   `library_status` table, and a one-time conversion of `library` into both

use std::collections::BTreeMap;

use komika_lib::prelude::ReadingStatus;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

pub const SCHEMA_VERSION: i64 = 2;

const SCHEMA_V1: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS comic (
        id INTEGER PRIMARY KEY NOT NULL,
        data TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS library (
        comic_id INTEGER PRIMARY KEY NOT NULL,
        data TEXT NOT NULL
    )"#,
];

const SCHEMA_V2: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        comic_id INTEGER NOT NULL,
        chapter_id TEXT NOT NULL,
        reading_progress INTEGER NOT NULL DEFAULT 0,
        timestamp INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS history_comic_id ON history(comic_id)",
    "CREATE INDEX IF NOT EXISTS history_comic_chapter ON history(comic_id, chapter_id)",
    r#"CREATE TABLE IF NOT EXISTS library_status (
        comic_id INTEGER PRIMARY KEY NOT NULL,
        favorite BOOLEAN NOT NULL DEFAULT 0,
        following BOOLEAN NOT NULL DEFAULT 0,
        reading_status TEXT NOT NULL DEFAULT 'none'
    )"#,
    "CREATE INDEX IF NOT EXISTS library_status_favorite ON library_status(comic_id) WHERE favorite = 1",
    "CREATE INDEX IF NOT EXISTS library_status_following ON library_status(comic_id) WHERE following = 1",
    "CREATE INDEX IF NOT EXISTS library_status_reading_status ON library_status(reading_status, comic_id)",
];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: i64, supported: i64 },
    #[error("migration to schema version {version} failed: {source}")]
    StepFailed { version: i64, source: sqlx::Error },
    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Empty,
    Outdated(i64),
    Current,
    /// Written by a newer release, left untouched
    Newer(i64),
}

pub async fn schema_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
}

pub async fn inspect(pool: &SqlitePool) -> Result<SchemaState, MigrationError> {
    let state = match schema_version(pool).await? {
        0 => SchemaState::Empty,
        SCHEMA_VERSION => SchemaState::Current,
        version if version > SCHEMA_VERSION => SchemaState::Newer(version),
        version => SchemaState::Outdated(version),
    };

    Ok(state)
}

/// Bring the schema up to [`SCHEMA_VERSION`], returns the resulting version
pub async fn run(pool: &SqlitePool) -> Result<i64, MigrationError> {
    migrate_to(pool, SCHEMA_VERSION).await
}

pub async fn migrate_to(pool: &SqlitePool, target: i64) -> Result<i64, MigrationError> {
    let current = schema_version(pool).await?;
    if current > SCHEMA_VERSION {
        return Err(MigrationError::NewerSchema {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    let target = target.min(SCHEMA_VERSION);
    for version in (current + 1)..=target {
        info!("migrating database schema from version {} to {version}", version - 1);
        apply(pool, version)
            .await
            .map_err(|source| MigrationError::StepFailed { version, source })?;
    }

    Ok(current.max(target))
}

async fn apply(pool: &SqlitePool, version: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    match version {
        1 => execute_all(&mut tx, SCHEMA_V1).await?,
        2 => {
            execute_all(&mut tx, SCHEMA_V2).await?;
            migrate_legacy_library(&mut tx, chrono::Utc::now().timestamp_millis()).await?;
        }
        _ => return Err(sqlx::Error::Protocol(format!("no migration for version {version}"))),
    }

    // PRAGMA does not take bind parameters; version is one of ours
    sqlx::query(&format!("PRAGMA user_version = {version}"))
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

async fn execute_all(conn: &mut SqliteConnection, statements: &[&str]) -> Result<(), sqlx::Error> {
    for statement in statements {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn migrate_legacy_library(
    conn: &mut SqliteConnection,
    migrated_at: i64,
) -> Result<(), sqlx::Error> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT comic_id, data FROM library")
        .fetch_all(&mut *conn)
        .await?;

    let mut progress_count = 0;
    for (comic_id, data) in rows.iter() {
        let comic_id = *comic_id;
        let record = LegacyLibraryRecord::parse(comic_id, data);

        sqlx::query(
            r#"INSERT INTO library_status(comic_id, favorite, following, reading_status)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(comic_id) DO UPDATE SET
                favorite = excluded.favorite,
                following = excluded.following,
                reading_status = excluded.reading_status"#,
        )
        .bind(comic_id)
        .bind(record.favorite)
        .bind(record.following)
        .bind(record.reading_status.as_str())
        .execute(&mut *conn)
        .await?;

        for (chapter_id, reading_progress) in record.chapters.iter() {
            sqlx::query(
                r#"INSERT INTO history(comic_id, chapter_id, reading_progress, timestamp)
                VALUES (?, ?, ?, ?)"#,
            )
            .bind(comic_id)
            .bind(chapter_id)
            .bind(*reading_progress)
            .bind(migrated_at)
            .execute(&mut *conn)
            .await?;
            progress_count += 1;
        }
    }

    sqlx::query("DROP TABLE IF EXISTS library")
        .execute(&mut *conn)
        .await?;

    info!(
        "migrated {} library records and {progress_count} chapter progress entries",
        rows.len()
    );

    Ok(())
}

/// Library record as stored by schema v1:
/// `{ statuses: { favorite, following, completed, reading, planning }, chapters: { id: { readingProgress } } }`
#[derive(Debug, Clone, PartialEq)]
struct LegacyLibraryRecord {
    favorite: bool,
    following: bool,
    reading_status: ReadingStatus,
    chapters: BTreeMap<String, i64>,
}

impl LegacyLibraryRecord {
    fn parse(comic_id: i64, data: &str) -> Self {
        let value = serde_json::from_str::<Value>(data).unwrap_or_else(|e| {
            warn!("legacy library record of comic {comic_id} is not valid json: {e}");
            Value::Null
        });
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Self {
        let status = |name: &str| {
            value
                .get("statuses")
                .and_then(|statuses| statuses.get(name))
                .is_some_and(truthy)
        };

        let chapters = value
            .get("chapters")
            .and_then(Value::as_object)
            .map(|chapters| {
                chapters
                    .iter()
                    .map(|(chapter_id, progress)| {
                        let page = progress
                            .get("readingProgress")
                            .and_then(Value::as_f64)
                            .map(|page| page as i64)
                            .unwrap_or_default();
                        (chapter_id.clone(), page)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            favorite: status("favorite"),
            following: status("following"),
            reading_status: legacy_reading_status(
                status("completed"),
                status("reading"),
                status("planning"),
            ),
            chapters,
        }
    }
}

/// Collapse the legacy boolean triad, completed wins over reading wins over planning
fn legacy_reading_status(completed: bool, reading: bool, planning: bool) -> ReadingStatus {
    if completed {
        ReadingStatus::Completed
    } else if reading {
        ReadingStatus::Reading
    } else if planning {
        ReadingStatus::Planning
    } else {
        ReadingStatus::None
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
