use async_trait::async_trait;
use komika_lib::prelude::Comic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComicRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("failed to encode comic: {0}")]
    EncodeError(#[from] serde_json::Error),
    #[error("cached comic {id} is malformed: {source}")]
    MalformedRecord { id: i64, source: serde_json::Error },
}

#[async_trait]
pub trait ComicRepository: Send + Sync {
    async fn get_comic_by_id(&self, id: i64) -> Result<Option<Comic>, ComicRepositoryError>;
    async fn get_comics(&self) -> Result<Vec<Comic>, ComicRepositoryError>;
    /// Merge `comics` into the cache in a single transaction, keeping locally owned fields
    async fn insert_comics(&self, comics: &[Comic]) -> Result<(), ComicRepositoryError>;
}
