use async_trait::async_trait;
use komika_lib::prelude::ReadingStatus;
use thiserror::Error;

use crate::domain::entities::library::{LibraryFlag, LibraryStatus};

#[derive(Debug, Error)]
pub enum LibraryRepositoryError {
    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),
}

#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn get_library_status(
        &self,
        comic_id: i64,
    ) -> Result<Option<LibraryStatus>, LibraryRepositoryError>;

    async fn update_library_flag(
        &self,
        comic_id: i64,
        flag: LibraryFlag,
        value: bool,
    ) -> Result<LibraryStatus, LibraryRepositoryError>;

    async fn update_reading_status(
        &self,
        comic_id: i64,
        status: ReadingStatus,
    ) -> Result<LibraryStatus, LibraryRepositoryError>;

    async fn get_comic_ids_by_flag(
        &self,
        flag: LibraryFlag,
    ) -> Result<Vec<i64>, LibraryRepositoryError>;

    async fn get_comic_ids_by_reading_status(
        &self,
        status: ReadingStatus,
    ) -> Result<Vec<i64>, LibraryRepositoryError>;
}
