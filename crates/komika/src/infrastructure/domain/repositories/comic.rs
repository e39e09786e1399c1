use async_trait::async_trait;
use komika_lib::prelude::Comic;
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    domain::repositories::comic::{ComicRepository, ComicRepositoryError},
    infrastructure::database::Pool,
};

/// Fields owned by the local user, a catalog refresh never overwrites them
const PROTECTED_FIELDS: [&str; 4] = ["id", "following", "favorites", "pinned"];

type Document = Map<String, Value>;

#[derive(Clone)]
pub struct ComicRepositoryImpl {
    pool: Pool,
}

impl ComicRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }

    async fn get_document(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Document>, ComicRepositoryError> {
        let data: Option<String> = sqlx::query_scalar(r#"SELECT data FROM comic WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(data) = data else {
            return Ok(None);
        };

        match serde_json::from_str(&data) {
            Ok(Value::Object(document)) => Ok(Some(document)),
            Ok(_) => {
                warn!("cached comic {id} is not an object, replacing it");
                Ok(None)
            }
            Err(e) => {
                warn!("cached comic {id} is not valid json, replacing it: {e}");
                Ok(None)
            }
        }
    }
}

/// Shallow merge of `incoming` over `existing`, with protected fields taken from `existing`
fn merge_document(existing: Document, incoming: Document) -> Document {
    let mut merged = existing.clone();
    merged.extend(incoming);

    for field in PROTECTED_FIELDS {
        match existing.get(field) {
            Some(value) => {
                merged.insert(field.to_string(), value.clone());
            }
            None => {
                merged.remove(field);
            }
        }
    }

    merged
}

fn to_document(comic: &Comic) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(comic)? {
        Value::Object(document) => Ok(document),
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "comic did not serialize to an object",
        )),
    }
}

fn from_data(id: i64, data: &str) -> Result<Comic, ComicRepositoryError> {
    serde_json::from_str(data).map_err(|source| ComicRepositoryError::MalformedRecord { id, source })
}

#[async_trait]
impl ComicRepository for ComicRepositoryImpl {
    async fn get_comic_by_id(&self, id: i64) -> Result<Option<Comic>, ComicRepositoryError> {
        let data: Option<String> = sqlx::query_scalar(r#"SELECT data FROM comic WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool as &SqlitePool)
            .await?;

        data.map(|data| from_data(id, &data)).transpose()
    }

    async fn get_comics(&self) -> Result<Vec<Comic>, ComicRepositoryError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(r#"SELECT id, data FROM comic ORDER BY id"#)
            .fetch_all(&self.pool as &SqlitePool)
            .await?;

        let mut comics = Vec::with_capacity(rows.len());
        for (id, data) in rows {
            match from_data(id, &data) {
                Ok(comic) => comics.push(comic),
                Err(e) => warn!("skipping comic: {e}"),
            }
        }

        Ok(comics)
    }

    async fn insert_comics(&self, comics: &[Comic]) -> Result<(), ComicRepositoryError> {
        let (_writer, mut tx) = self.pool.begin_write().await?;

        for comic in comics {
            let incoming = to_document(comic)?;
            let document = match Self::get_document(&mut tx, comic.id).await? {
                Some(existing) => merge_document(existing, incoming),
                None => incoming,
            };

            sqlx::query(
                r#"INSERT INTO comic(id, data) VALUES (?, ?)
                ON CONFLICT(id) DO UPDATE SET data = excluded.data"#,
            )
            .bind(comic.id)
            .bind(Value::Object(document).to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!("cached {} comics", comics.len());

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use komika_lib::prelude::Chapter;
    use serde_json::json;

    use super::*;
    use crate::infrastructure::database::Database;

    async fn repo() -> (Database, ComicRepositoryImpl) {
        let db = Database::in_memory();
        let pool = db.open().await.unwrap();
        (db, ComicRepositoryImpl::new(pool))
    }

    #[test]
    fn test_merge_keeps_protected_fields() {
        let existing = json!({"id": 1, "title": "Old", "favorites": true, "pinned": true, "star": 4.0});
        let incoming = json!({"id": 1, "title": "New", "favorites": false, "pinned": false, "following": true});

        let merged = merge_document(
            existing.as_object().unwrap().clone(),
            incoming.as_object().unwrap().clone(),
        );

        assert_eq!(
            Value::Object(merged),
            json!({"id": 1, "title": "New", "favorites": true, "pinned": true, "star": 4.0})
        );
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_db, repo) = repo().await;

        let mut comic = Comic::new(1, "Frieren");
        comic.chapters = vec![Chapter::new(1.0, "en", vec!["p1.jpg".to_string()])];
        repo.insert_comics(&[comic.clone(), Comic::new(2, "Witch Hat Atelier")])
            .await
            .unwrap();

        assert_eq!(repo.get_comic_by_id(1).await.unwrap(), Some(comic));
        assert!(repo.get_comic_by_id(3).await.unwrap().is_none());

        let titles: Vec<String> = repo
            .get_comics()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Frieren", "Witch Hat Atelier"]);
    }

    #[tokio::test]
    async fn test_refresh_does_not_clobber_favorites() {
        let (_db, repo) = repo().await;

        let mut comic = Comic::new(1, "Frieren");
        comic.favorites = true;
        comic.description = Some("after the journey".to_string());
        repo.insert_comics(&[comic]).await.unwrap();

        let mut refreshed = Comic::new(1, "Frieren: Beyond Journey's End");
        refreshed.favorites = false;
        refreshed.pinned = true;
        repo.insert_comics(&[refreshed]).await.unwrap();

        let stored = repo.get_comic_by_id(1).await.unwrap().unwrap();
        assert!(stored.favorites);
        assert!(!stored.pinned);
        assert_eq!(stored.title, "Frieren: Beyond Journey's End");
        // absent optional fields of the refresh keep the cached value
        assert_eq!(stored.description.as_deref(), Some("after the journey"));
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let (_db, repo) = repo().await;

        let mut comic = Comic::new(5, "Vinland Saga");
        comic.genres = Some(vec!["Historical".to_string()]);
        comic.extra.insert("rank".to_string(), json!(3));

        repo.insert_comics(&[comic.clone()]).await.unwrap();
        let once: String = sqlx::query_scalar("SELECT data FROM comic WHERE id = 5")
            .fetch_one(&repo.pool as &SqlitePool)
            .await
            .unwrap();

        repo.insert_comics(&[comic]).await.unwrap();
        let twice: String = sqlx::query_scalar("SELECT data FROM comic WHERE id = 5")
            .fetch_one(&repo.pool as &SqlitePool)
            .await
            .unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_malformed_record_is_reported() {
        let (_db, repo) = repo().await;

        sqlx::query("INSERT INTO comic (id, data) VALUES (8, '[1, 2]')")
            .execute(&repo.pool as &SqlitePool)
            .await
            .unwrap();

        assert!(matches!(
            repo.get_comic_by_id(8).await,
            Err(ComicRepositoryError::MalformedRecord { id: 8, .. })
        ));

        // a refresh repairs the record
        repo.insert_comics(&[Comic::new(8, "Dorohedoro")]).await.unwrap();
        assert_eq!(
            repo.get_comic_by_id(8).await.unwrap().map(|c| c.title),
            Some("Dorohedoro".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_cache_untouched() {
        let (_db, repo) = repo().await;

        sqlx::query(
            r#"CREATE TRIGGER reject_comic_3 BEFORE INSERT ON comic
            WHEN NEW.id = 3
            BEGIN SELECT RAISE(ABORT, 'rejected'); END"#,
        )
        .execute(&repo.pool as &SqlitePool)
        .await
        .unwrap();

        let batch = [
            Comic::new(1, "Mob Psycho 100"),
            Comic::new(2, "One-Punch Man"),
            Comic::new(3, "Dandadan"),
        ];
        assert!(repo.insert_comics(&batch).await.is_err());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comic")
            .fetch_one(&repo.pool as &SqlitePool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        // the writer lock is released after the failure
        repo.insert_comics(&batch[..2]).await.unwrap();
        assert_eq!(repo.get_comics().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_without_chapters_keeps_cached_ones() {
        let (_db, repo) = repo().await;

        let mut comic = Comic::new(6, "Berserk");
        comic.author = "Kentaro Miura".to_string();
        comic.chapters = vec![Chapter::new(1.0, "en", vec!["p1.jpg".to_string()])];
        repo.insert_comics(&[comic]).await.unwrap();

        let mut summary = Comic::new(6, "Berserk");
        summary.star = Some(4.9);
        repo.insert_comics(&[summary]).await.unwrap();

        let stored = repo.get_comic_by_id(6).await.unwrap().unwrap();
        assert_eq!(stored.author, "Kentaro Miura");
        assert_eq!(stored.chapters.len(), 1);
        assert_eq!(stored.star, Some(4.9));
    }
}

