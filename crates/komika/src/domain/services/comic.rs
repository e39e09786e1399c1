use komika_lib::prelude::{Chapter, Comic};
use thiserror::Error;

use crate::domain::repositories::comic::{ComicRepository, ComicRepositoryError};

#[derive(Debug, Error)]
pub enum ComicError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] ComicRepositoryError),
}

pub struct ComicService<R>
where
    R: ComicRepository,
{
    repo: R,
}

impl<R> ComicService<R>
where
    R: ComicRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn cache_comics(&self, comics: &[Comic]) -> Result<(), ComicError> {
        self.repo.insert_comics(comics).await?;

        Ok(())
    }

    pub async fn get_comic(&self, id: i64) -> Result<Option<Comic>, ComicError> {
        let comic = self.repo.get_comic_by_id(id).await?;

        Ok(comic)
    }

    pub async fn get_chapter_by_number(
        &self,
        comic_id: i64,
        chapter_number: f64,
    ) -> Result<Option<Chapter>, ComicError> {
        let chapter = self
            .repo
            .get_comic_by_id(comic_id)
            .await?
            .and_then(|comic| comic.chapter_by_number(chapter_number).cloned());

        Ok(chapter)
    }

    pub async fn get_chapter_by_id(
        &self,
        comic_id: i64,
        chapter_id: &str,
    ) -> Result<Option<Chapter>, ComicError> {
        let chapter = self
            .repo
            .get_comic_by_id(comic_id)
            .await?
            .and_then(|comic| comic.chapter_by_id(chapter_id).cloned());

        Ok(chapter)
    }

    pub async fn search_comics(&self, query: &str) -> Result<Vec<Comic>, ComicError> {
        let comics = self
            .repo
            .get_comics()
            .await?
            .into_iter()
            .filter(|comic| comic.matches(query))
            .collect();

        Ok(comics)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::infrastructure::{
        database::Database, domain::repositories::comic::ComicRepositoryImpl,
    };

    async fn service() -> (Database, ComicService<ComicRepositoryImpl>) {
        let db = Database::in_memory();
        let pool = db.open().await.unwrap();
        (db, ComicService::new(ComicRepositoryImpl::new(pool)))
    }

    #[tokio::test]
    async fn test_get_chapter() {
        let (_db, svc) = service().await;

        let mut comic = Comic::new(3, "Kaiju No. 8");
        comic.chapters = vec![
            Chapter::new(1.0, "en", vec![]),
            Chapter::new(1.5, "en", vec!["extra.jpg".to_string()]),
        ];
        svc.cache_comics(&[comic]).await.unwrap();

        let chapter = svc.get_chapter_by_number(3, 1.5).await.unwrap().unwrap();
        assert_eq!(chapter.images, vec!["extra.jpg"]);

        assert!(svc.get_chapter_by_id(3, "1").await.unwrap().is_some());
        assert!(svc.get_chapter_by_number(3, 2.0).await.unwrap().is_none());
        assert!(svc.get_chapter_by_number(4, 1.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_comics() {
        let (_db, svc) = service().await;

        let mut spy = Comic::new(2, "Spy x Family");
        spy.genres = Some(vec!["Comedy".to_string()]);
        svc.cache_comics(&[Comic::new(1, "Chainsaw Man"), spy])
            .await
            .unwrap();

        let ids: Vec<i64> = svc
            .search_comics("comedy")
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2]);

        assert_eq!(svc.search_comics("").await.unwrap().len(), 2);
    }
}
