use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    domain::{
        entities::history::HistoryEntry,
        repositories::history::{HistoryRepository, HistoryRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct HistoryRepositoryImpl {
    pool: Pool,
}

impl HistoryRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

fn entry_from_row(row: SqliteRow) -> HistoryEntry {
    HistoryEntry {
        id: row.get(0),
        comic_id: row.get(1),
        chapter_id: row.get(2),
        reading_progress: row.get(3),
        timestamp: row.get(4),
    }
}

#[async_trait]
impl HistoryRepository for HistoryRepositoryImpl {
    async fn insert_history_chapter(
        &self,
        comic_id: i64,
        chapter_id: &str,
        page: i64,
    ) -> Result<HistoryEntry, HistoryRepositoryError> {
        let (_writer, mut tx) = self.pool.begin_write().await?;

        let timestamp = self.pool.timestamp();

        let latest: Option<i64> = sqlx::query_scalar(
            r#"SELECT id FROM history
            WHERE comic_id = ? AND chapter_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT 1"#,
        )
        .bind(comic_id)
        .bind(chapter_id)
        .fetch_optional(&mut *tx)
        .await?;

        let id = match latest {
            Some(id) => {
                sqlx::query(
                    r#"UPDATE history SET reading_progress = ?, timestamp = ? WHERE id = ?"#,
                )
                .bind(page)
                .bind(timestamp)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => sqlx::query(
                r#"INSERT INTO history(comic_id, chapter_id, reading_progress, timestamp)
                VALUES (?, ?, ?, ?)"#,
            )
            .bind(comic_id)
            .bind(chapter_id)
            .bind(page)
            .bind(timestamp)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        tx.commit().await?;

        Ok(HistoryEntry {
            id,
            comic_id,
            chapter_id: chapter_id.to_string(),
            reading_progress: page,
            timestamp,
        })
    }

    async fn get_history_chapters(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<Vec<HistoryEntry>, HistoryRepositoryError> {
        let entries = sqlx::query(
            r#"SELECT id, comic_id, chapter_id, reading_progress, timestamp
            FROM history
            WHERE comic_id = ? AND chapter_id = ?
            ORDER BY timestamp DESC, id DESC"#,
        )
        .bind(comic_id)
        .bind(chapter_id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .into_iter()
        .map(entry_from_row)
        .collect();

        Ok(entries)
    }

    async fn get_history_by_comic_id(
        &self,
        comic_id: i64,
    ) -> Result<Vec<HistoryEntry>, HistoryRepositoryError> {
        let entries = sqlx::query(
            r#"SELECT id, comic_id, chapter_id, reading_progress, timestamp
            FROM history
            WHERE comic_id = ?
            ORDER BY timestamp DESC, id DESC"#,
        )
        .bind(comic_id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .into_iter()
        .map(entry_from_row)
        .collect();

        Ok(entries)
    }

    async fn get_history(&self) -> Result<Vec<HistoryEntry>, HistoryRepositoryError> {
        let entries = sqlx::query(
            r#"SELECT id, comic_id, chapter_id, reading_progress, timestamp
            FROM history
            ORDER BY timestamp DESC, id DESC"#,
        )
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .into_iter()
        .map(entry_from_row)
        .collect();

        Ok(entries)
    }

    async fn delete_history(&self, comic_id: Option<i64>) -> Result<u64, HistoryRepositoryError> {
        let _writer = self.pool.lock_writer().await;
        let result = match comic_id {
            Some(comic_id) => {
                sqlx::query(r#"DELETE FROM history WHERE comic_id = ?"#)
                    .bind(comic_id)
                    .execute(&self.pool as &SqlitePool)
                    .await?
            }
            None => {
                sqlx::query(r#"DELETE FROM history"#)
                    .execute(&self.pool as &SqlitePool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }
}
