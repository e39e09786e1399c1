use async_trait::async_trait;

use thiserror::Error;

use crate::domain::entities::history::HistoryEntry;

#[derive(Debug, Error)]
pub enum HistoryRepositoryError {
    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Overwrite the latest entry of the chapter, or insert one if there is none
    async fn insert_history_chapter(
        &self,
        comic_id: i64,
        chapter_id: &str,
        page: i64,
    ) -> Result<HistoryEntry, HistoryRepositoryError>;

    async fn get_history_chapters(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<Vec<HistoryEntry>, HistoryRepositoryError>;

    async fn get_history_by_comic_id(
        &self,
        comic_id: i64,
    ) -> Result<Vec<HistoryEntry>, HistoryRepositoryError>;

    async fn get_history(&self) -> Result<Vec<HistoryEntry>, HistoryRepositoryError>;

    async fn delete_history(&self, comic_id: Option<i64>) -> Result<u64, HistoryRepositoryError>;
}
