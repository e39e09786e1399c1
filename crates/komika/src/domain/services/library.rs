use komika_lib::prelude::ReadingStatus;
use thiserror::Error;

use crate::domain::{
    entities::library::{LibraryFlag, LibraryStatus},
    repositories::library::{LibraryRepository, LibraryRepositoryError},
};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] LibraryRepositoryError),
}

pub struct LibraryService<R>
where
    R: LibraryRepository,
{
    repo: R,
}

impl<R> LibraryService<R>
where
    R: LibraryRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get_library_status(
        &self,
        comic_id: i64,
    ) -> Result<Option<LibraryStatus>, LibraryError> {
        let status = self.repo.get_library_status(comic_id).await?;

        Ok(status)
    }

    pub async fn set_flag(
        &self,
        comic_id: i64,
        flag: LibraryFlag,
        value: bool,
    ) -> Result<LibraryStatus, LibraryError> {
        let status = self.repo.update_library_flag(comic_id, flag, value).await?;
        debug!("comic {comic_id}: {flag} = {value}");

        Ok(status)
    }

    pub async fn toggle_favorite(
        &self,
        comic_id: i64,
        value: bool,
    ) -> Result<LibraryStatus, LibraryError> {
        self.set_flag(comic_id, LibraryFlag::Favorite, value).await
    }

    pub async fn toggle_following(
        &self,
        comic_id: i64,
        value: bool,
    ) -> Result<LibraryStatus, LibraryError> {
        self.set_flag(comic_id, LibraryFlag::Following, value).await
    }

    pub async fn set_reading_status(
        &self,
        comic_id: i64,
        reading_status: ReadingStatus,
    ) -> Result<LibraryStatus, LibraryError> {
        let status = self
            .repo
            .update_reading_status(comic_id, reading_status)
            .await?;
        debug!("comic {comic_id}: reading status = {reading_status}");

        Ok(status)
    }

    pub async fn get_comics_by_flag(&self, flag: LibraryFlag) -> Result<Vec<i64>, LibraryError> {
        let ids = self.repo.get_comic_ids_by_flag(flag).await?;

        Ok(ids)
    }

    pub async fn get_favorite_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.get_comics_by_flag(LibraryFlag::Favorite).await
    }

    pub async fn get_following_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.get_comics_by_flag(LibraryFlag::Following).await
    }

    pub async fn get_comics_by_reading_status(
        &self,
        reading_status: ReadingStatus,
    ) -> Result<Vec<i64>, LibraryError> {
        let ids = self
            .repo
            .get_comic_ids_by_reading_status(reading_status)
            .await?;

        Ok(ids)
    }

    pub async fn get_planning_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.get_comics_by_reading_status(ReadingStatus::Planning)
            .await
    }

    pub async fn get_reading_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.get_comics_by_reading_status(ReadingStatus::Reading)
            .await
    }

    pub async fn get_completed_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.get_comics_by_reading_status(ReadingStatus::Completed)
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::infrastructure::{
        database::Database, domain::repositories::library::LibraryRepositoryImpl,
    };

    #[tokio::test]
    async fn test_library_lists() {
        let db = Database::in_memory();
        let svc = LibraryService::new(LibraryRepositoryImpl::new(db.open().await.unwrap()));

        svc.toggle_favorite(1, true).await.unwrap();
        svc.toggle_favorite(2, true).await.unwrap();
        svc.toggle_favorite(3, true).await.unwrap();
        svc.toggle_favorite(2, false).await.unwrap();
        svc.toggle_following(2, true).await.unwrap();
        svc.set_reading_status(3, ReadingStatus::Completed)
            .await
            .unwrap();

        assert_eq!(svc.get_favorite_comics().await.unwrap(), vec![1, 3]);
        assert_eq!(svc.get_following_comics().await.unwrap(), vec![2]);
        assert_eq!(svc.get_completed_comics().await.unwrap(), vec![3]);
        assert!(svc.get_planning_comics().await.unwrap().is_empty());
        assert!(svc.get_reading_comics().await.unwrap().is_empty());

        let status = svc.get_library_status(2).await.unwrap().unwrap();
        assert!(!status.favorite);
        assert!(status.following);
        assert!(svc.get_library_status(9).await.unwrap().is_none());
    }
}
