use komika_lib::prelude::{Chapter, Comic, ReadingStatus};

use crate::{
    domain::{
        entities::{history::HistoryEntry, library::LibraryStatus},
        repositories::{
            comic::ComicRepository, history::HistoryRepository, library::LibraryRepository,
        },
        services::{
            comic::{ComicError, ComicService},
            history::{HistoryError, HistoryService},
            library::{LibraryError, LibraryService},
        },
    },
    infrastructure::{
        database::Pool,
        domain::repositories::{
            comic::ComicRepositoryImpl, history::HistoryRepositoryImpl,
            library::LibraryRepositoryImpl,
        },
    },
};

/// Single entry point over the comic cache, the library and the reading history
pub struct Shelf<C = ComicRepositoryImpl, L = LibraryRepositoryImpl, H = HistoryRepositoryImpl>
where
    C: ComicRepository,
    L: LibraryRepository,
    H: HistoryRepository,
{
    comic_svc: ComicService<C>,
    library_svc: LibraryService<L>,
    history_svc: HistoryService<H>,
}

impl Shelf {
    pub fn new(pool: Pool) -> Self {
        Self::with_repositories(
            ComicRepositoryImpl::new(pool.clone()),
            LibraryRepositoryImpl::new(pool.clone()),
            HistoryRepositoryImpl::new(pool),
        )
    }
}

impl<C, L, H> Shelf<C, L, H>
where
    C: ComicRepository,
    L: LibraryRepository,
    H: HistoryRepository,
{
    pub fn with_repositories(comic_repo: C, library_repo: L, history_repo: H) -> Self {
        Self {
            comic_svc: ComicService::new(comic_repo),
            library_svc: LibraryService::new(library_repo),
            history_svc: HistoryService::new(history_repo),
        }
    }

    pub async fn get_comic(&self, id: i64) -> Result<Option<Comic>, ComicError> {
        self.comic_svc.get_comic(id).await
    }

    pub async fn cache_comics(&self, comics: &[Comic]) -> Result<(), ComicError> {
        self.comic_svc.cache_comics(comics).await
    }

    pub async fn search_comics(&self, query: &str) -> Result<Vec<Comic>, ComicError> {
        self.comic_svc.search_comics(query).await
    }

    pub async fn get_chapter_by_number(
        &self,
        comic_id: i64,
        chapter_number: f64,
    ) -> Result<Option<Chapter>, ComicError> {
        self.comic_svc
            .get_chapter_by_number(comic_id, chapter_number)
            .await
    }

    pub async fn get_chapter_by_id(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<Option<Chapter>, ComicError> {
        self.comic_svc.get_chapter_by_id(comic_id, chapter_id).await
    }

    pub async fn get_library_status(
        &self,
        comic_id: i64,
    ) -> Result<Option<LibraryStatus>, LibraryError> {
        self.library_svc.get_library_status(comic_id).await
    }

    pub async fn toggle_favorite(
        &self,
        comic_id: i64,
        value: bool,
    ) -> Result<LibraryStatus, LibraryError> {
        self.library_svc.toggle_favorite(comic_id, value).await
    }

    pub async fn toggle_following(
        &self,
        comic_id: i64,
        value: bool,
    ) -> Result<LibraryStatus, LibraryError> {
        self.library_svc.toggle_following(comic_id, value).await
    }

    pub async fn get_favorite_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.library_svc.get_favorite_comics().await
    }

    pub async fn get_following_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.library_svc.get_following_comics().await
    }

    pub async fn set_reading_status(
        &self,
        comic_id: i64,
        reading_status: ReadingStatus,
    ) -> Result<LibraryStatus, LibraryError> {
        self.library_svc
            .set_reading_status(comic_id, reading_status)
            .await
    }

    pub async fn get_comics_by_reading_status(
        &self,
        reading_status: ReadingStatus,
    ) -> Result<Vec<i64>, LibraryError> {
        self.library_svc
            .get_comics_by_reading_status(reading_status)
            .await
    }

    pub async fn get_planning_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.library_svc.get_planning_comics().await
    }

    pub async fn get_reading_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.library_svc.get_reading_comics().await
    }

    pub async fn get_completed_comics(&self) -> Result<Vec<i64>, LibraryError> {
        self.library_svc.get_completed_comics().await
    }

    pub async fn add_to_history(
        &self,
        comic_id: i64,
        chapter_id: &str,
        page: i64,
    ) -> Result<HistoryEntry, HistoryError> {
        self.history_svc
            .add_to_history(comic_id, chapter_id, page)
            .await
    }

    pub async fn get_chapter_progress(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<i64, HistoryError> {
        self.history_svc
            .get_chapter_progress(comic_id, chapter_id)
            .await
    }

    pub async fn get_history_comics(&self, limit: usize) -> Result<Vec<i64>, HistoryError> {
        self.history_svc.get_history_comics(limit).await
    }

    pub async fn get_comic_history(&self, comic_id: i64) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.history_svc.get_comic_history(comic_id).await
    }

    pub async fn clear_history(&self, comic_id: Option<i64>) -> Result<u64, HistoryError> {
        self.history_svc.clear_history(comic_id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::infrastructure::database::Database;

    #[tokio::test]
    async fn test_reading_session() {
        let db = Database::in_memory();
        let shelf = Shelf::new(db.open().await.unwrap());

        let mut comic = Comic::new(11, "Blue Period");
        comic.chapters = vec![Chapter::new(1.0, "en", vec!["a.jpg".to_string()])];
        shelf.cache_comics(&[comic]).await.unwrap();

        let chapter = shelf.get_chapter_by_number(11, 1.0).await.unwrap().unwrap();
        shelf.add_to_history(11, &chapter.id(), 0).await.unwrap();
        shelf
            .set_reading_status(11, ReadingStatus::Reading)
            .await
            .unwrap();
        shelf.toggle_following(11, true).await.unwrap();

        assert_eq!(shelf.get_chapter_progress(11, "1").await.unwrap(), 0);
        assert_eq!(shelf.get_reading_comics().await.unwrap(), vec![11]);
        assert_eq!(shelf.get_following_comics().await.unwrap(), vec![11]);
        assert!(shelf.get_favorite_comics().await.unwrap().is_empty());
        assert_eq!(shelf.get_history_comics(50).await.unwrap(), vec![11]);

        db.close().await;
    }
}
