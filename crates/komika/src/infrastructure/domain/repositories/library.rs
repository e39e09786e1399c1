use async_trait::async_trait;
use komika_lib::prelude::ReadingStatus;
use sqlx::{Row, SqliteConnection, SqlitePool, sqlite::SqliteRow};

use crate::{
    domain::{
        entities::library::{LibraryFlag, LibraryStatus},
        repositories::library::{LibraryRepository, LibraryRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct LibraryRepositoryImpl {
    pool: Pool,
}

impl LibraryRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }

    /// Read-modify-write of one record under the writer lock
    async fn update<F>(
        &self,
        comic_id: i64,
        modify: F,
    ) -> Result<LibraryStatus, LibraryRepositoryError>
    where
        F: FnOnce(&mut LibraryStatus) + Send,
    {
        let (_writer, mut tx) = self.pool.begin_write().await?;

        let mut status = Self::fetch(&mut tx, comic_id)
            .await?
            .unwrap_or_else(|| LibraryStatus::new(comic_id));
        modify(&mut status);

        sqlx::query(
            r#"INSERT INTO library_status(comic_id, favorite, following, reading_status)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(comic_id) DO UPDATE SET
                favorite = excluded.favorite,
                following = excluded.following,
                reading_status = excluded.reading_status"#,
        )
        .bind(status.comic_id)
        .bind(status.favorite)
        .bind(status.following)
        .bind(status.reading_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(status)
    }

    async fn fetch(
        conn: &mut SqliteConnection,
        comic_id: i64,
    ) -> Result<Option<LibraryStatus>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT comic_id, favorite, following, reading_status
            FROM library_status
            WHERE comic_id = ?"#,
        )
        .bind(comic_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(status_from_row))
    }
}

fn status_from_row(row: &SqliteRow) -> LibraryStatus {
    let comic_id: i64 = row.get(0);
    let raw_status: String = row.get(3);
    let reading_status = raw_status.parse().unwrap_or_else(|e| {
        warn!("library status of comic {comic_id}: {e}, treating it as none");
        ReadingStatus::None
    });

    LibraryStatus {
        comic_id,
        favorite: row.get(1),
        following: row.get(2),
        reading_status,
    }
}

#[async_trait]
impl LibraryRepository for LibraryRepositoryImpl {
    async fn get_library_status(
        &self,
        comic_id: i64,
    ) -> Result<Option<LibraryStatus>, LibraryRepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Self::fetch(&mut conn, comic_id).await?)
    }

    async fn update_library_flag(
        &self,
        comic_id: i64,
        flag: LibraryFlag,
        value: bool,
    ) -> Result<LibraryStatus, LibraryRepositoryError> {
        self.update(comic_id, |status| status.set_flag(flag, value))
            .await
    }

    async fn update_reading_status(
        &self,
        comic_id: i64,
        reading_status: ReadingStatus,
    ) -> Result<LibraryStatus, LibraryRepositoryError> {
        self.update(comic_id, |status| status.reading_status = reading_status)
            .await
    }

    async fn get_comic_ids_by_flag(
        &self,
        flag: LibraryFlag,
    ) -> Result<Vec<i64>, LibraryRepositoryError> {
        // column name comes from LibraryFlag, never from input
        let query_str = format!(
            r#"SELECT comic_id FROM library_status WHERE {} = 1 ORDER BY comic_id"#,
            flag.column()
        );

        let ids = sqlx::query_scalar(&query_str)
            .fetch_all(&self.pool as &SqlitePool)
            .await?;

        Ok(ids)
    }

    async fn get_comic_ids_by_reading_status(
        &self,
        reading_status: ReadingStatus,
    ) -> Result<Vec<i64>, LibraryRepositoryError> {
        let ids = sqlx::query_scalar(
            r#"SELECT comic_id FROM library_status WHERE reading_status = ? ORDER BY comic_id"#,
        )
        .bind(reading_status.as_str())
        .fetch_all(&self.pool as &SqlitePool)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::infrastructure::database::Database;

    async fn repo() -> (Database, LibraryRepositoryImpl) {
        let db = Database::in_memory();
        let pool = db.open().await.unwrap();
        (db, LibraryRepositoryImpl::new(pool))
    }

    #[tokio::test]
    async fn test_first_write_creates_default_record() {
        let (_db, repo) = repo().await;
        assert!(repo.get_library_status(1).await.unwrap().is_none());

        let status = repo
            .update_library_flag(1, LibraryFlag::Following, true)
            .await
            .unwrap();

        assert_eq!(
            status,
            LibraryStatus {
                comic_id: 1,
                favorite: false,
                following: true,
                reading_status: ReadingStatus::None,
            }
        );
        assert_eq!(repo.get_library_status(1).await.unwrap(), Some(status));
    }

    #[tokio::test]
    async fn test_updates_keep_other_fields() {
        let (_db, repo) = repo().await;

        repo.update_library_flag(4, LibraryFlag::Favorite, true)
            .await
            .unwrap();
        repo.update_reading_status(4, ReadingStatus::Reading)
            .await
            .unwrap();
        repo.update_library_flag(4, LibraryFlag::Following, true)
            .await
            .unwrap();

        let status = repo.get_library_status(4).await.unwrap().unwrap();
        assert!(status.favorite);
        assert!(status.following);
        assert_eq!(status.reading_status, ReadingStatus::Reading);
    }

    #[tokio::test]
    async fn test_get_comic_ids_by_flag() {
        let (_db, repo) = repo().await;

        for id in [1, 2, 3] {
            repo.update_library_flag(id, LibraryFlag::Favorite, true)
                .await
                .unwrap();
        }
        repo.update_library_flag(2, LibraryFlag::Favorite, false)
            .await
            .unwrap();

        assert_eq!(
            repo.get_comic_ids_by_flag(LibraryFlag::Favorite)
                .await
                .unwrap(),
            vec![1, 3]
        );
        assert!(
            repo.get_comic_ids_by_flag(LibraryFlag::Following)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_get_comic_ids_by_reading_status() {
        let (_db, repo) = repo().await;

        repo.update_reading_status(3, ReadingStatus::Completed)
            .await
            .unwrap();
        repo.update_reading_status(1, ReadingStatus::Completed)
            .await
            .unwrap();
        repo.update_reading_status(2, ReadingStatus::Planning)
            .await
            .unwrap();

        assert_eq!(
            repo.get_comic_ids_by_reading_status(ReadingStatus::Completed)
                .await
                .unwrap(),
            vec![1, 3]
        );
        assert_eq!(
            repo.get_comic_ids_by_reading_status(ReadingStatus::Planning)
                .await
                .unwrap(),
            vec![2]
        );
        assert!(
            repo.get_comic_ids_by_reading_status(ReadingStatus::Reading)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let (_db, repo) = repo().await;

        let (a, b) = tokio::join!(
            repo.update_library_flag(7, LibraryFlag::Favorite, true),
            repo.update_reading_status(7, ReadingStatus::Planning),
        );
        a.unwrap();
        b.unwrap();

        let status = repo.get_library_status(7).await.unwrap().unwrap();
        assert!(status.favorite);
        assert_eq!(status.reading_status, ReadingStatus::Planning);
    }

    #[tokio::test]
    async fn test_unknown_reading_status_reads_as_none() {
        let (_db, repo) = repo().await;

        sqlx::query(
            "INSERT INTO library_status (comic_id, favorite, following, reading_status) VALUES (5, 1, 0, 'paused')",
        )
        .execute(&repo.pool as &SqlitePool)
        .await
        .unwrap();

        let status = repo.get_library_status(5).await.unwrap().unwrap();
        assert!(status.favorite);
        assert_eq!(status.reading_status, ReadingStatus::None);

        // the next write stores a known value again
        repo.update_library_flag(5, LibraryFlag::Following, true)
            .await
            .unwrap();
        let stored: String =
            sqlx::query_scalar("SELECT reading_status FROM library_status WHERE comic_id = 5")
                .fetch_one(&repo.pool as &SqlitePool)
                .await
                .unwrap();
        assert_eq!(stored, "none");
    }
}
