use itertools::Itertools;
use thiserror::Error;

use crate::domain::{
    entities::history::HistoryEntry,
    repositories::history::{HistoryRepository, HistoryRepositoryError},
};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] HistoryRepositoryError),
    #[error("page index must not be negative, got {0}")]
    InvalidPage(i64),
}

pub struct HistoryService<R>
where
    R: HistoryRepository,
{
    repo: R,
}

impl<R> HistoryService<R>
where
    R: HistoryRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn add_to_history(
        &self,
        comic_id: i64,
        chapter_id: &str,
        page: i64,
    ) -> Result<HistoryEntry, HistoryError> {
        if page < 0 {
            return Err(HistoryError::InvalidPage(page));
        }

        let entry = self
            .repo
            .insert_history_chapter(comic_id, chapter_id, page)
            .await?;

        Ok(entry)
    }

    /// Page index of the latest entry for the chapter, 0 when it was never opened
    pub async fn get_chapter_progress(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<i64, HistoryError> {
        let progress = self
            .repo
            .get_history_chapters(comic_id, chapter_id)
            .await?
            .into_iter()
            .max_by_key(|entry| (entry.timestamp, entry.id))
            .map(|entry| entry.reading_progress)
            .unwrap_or(0);

        Ok(progress)
    }

    /// Comic ids ordered by their most recent read, at most `limit` of them
    pub async fn get_history_comics(&self, limit: usize) -> Result<Vec<i64>, HistoryError> {
        let ids = self
            .repo
            .get_history()
            .await?
            .into_iter()
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .map(|entry| entry.comic_id)
            .unique()
            .take(limit)
            .collect();

        Ok(ids)
    }

    pub async fn get_comic_history(&self, comic_id: i64) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.repo.get_history_by_comic_id(comic_id).await?;

        Ok(entries)
    }

    /// Delete the history of one comic, or everything when `comic_id` is `None`
    pub async fn clear_history(&self, comic_id: Option<i64>) -> Result<u64, HistoryError> {
        let deleted = self.repo.delete_history(comic_id).await?;
        info!("deleted {deleted} history entries");

        Ok(deleted)
    }
}
