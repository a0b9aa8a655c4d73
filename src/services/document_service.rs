use std::str::FromStr;

use log::{debug, info, error};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::OnceCell;

use crate::services::{PageStore, StorageError};
use crate::types::{Page, PageTitle};

const CREATE_PAGES: &str = "CREATE TABLE IF NOT EXISTS pages (
    title TEXT PRIMARY KEY NOT NULL,
    body  BLOB NOT NULL
)";

/// Pages stored as `{title, body}` documents in a SQLite database.
///
/// The pool connects lazily: an unreachable database turns into a failed
/// request rather than a failed startup. The table is created on first use.
#[derive(Debug)]
pub struct DocumentStore {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl DocumentStore {
    /// Build a store for `database_url` (e.g. `sqlite://folio.db`).
    ///
    /// Only the URL is validated here; no connection is made.
    pub fn connect_lazy(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_lazy_with(options);
        info!("Using page database {}", database_url);
        Ok(Self { pool, schema: OnceCell::new() })
    }

    /// Pool handle, ensuring the `pages` table exists
    async fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.schema
            .get_or_try_init(|| async {
                debug!("Creating pages table if missing");
                sqlx::query(CREATE_PAGES).execute(&self.pool).await.map(|_| ())
            })
            .await
            .map_err(|e| {
                error!("Failed to prepare page database: {}", e);
                StorageError::from(e)
            })?;
        Ok(&self.pool)
    }
}

impl PageStore for DocumentStore {
    async fn load(&self, title: &PageTitle) -> Result<Page, StorageError> {
        let pool = self.pool().await?;
        let body: Option<Vec<u8>> = sqlx::query_scalar("SELECT body FROM pages WHERE title = ?")
            .bind(title.as_str())
            .fetch_optional(pool)
            .await?;
        match body {
            Some(body) => Ok(Page::new(title.clone(), body)),
            None => Err(StorageError::NotFound { title: title.clone() }),
        }
    }

    async fn save(&self, page: &Page) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        debug!("Upserting page {} ({} bytes)", page.title, page.body.len());
        sqlx::query(
            "INSERT INTO pages (title, body) VALUES (?, ?)
             ON CONFLICT(title) DO UPDATE SET body = excluded.body",
        )
        .bind(page.title.as_str())
        .bind(page.body.as_slice())
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn list_titles(&self) -> Result<Vec<String>, StorageError> {
        let pool = self.pool().await?;
        let titles: Vec<String> = sqlx::query_scalar("SELECT title FROM pages ORDER BY title")
            .fetch_all(pool)
            .await?;
        debug!("Listed {} pages from database", titles.len());
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn title(raw: &str) -> PageTitle {
        PageTitle::parse(raw).unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> DocumentStore {
        let url = format!("sqlite://{}", dir.path().join("pages.db").display());
        DocumentStore::connect_lazy(&url).unwrap()
    }

    #[tokio::test]
    async fn save_then_load_returns_same_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let page = Page::new(title("Alpha"), vec![0u8, 159, 146, 150, b'x']);
        store.save(&page).await.unwrap();

        assert_eq!(store.load(&title("Alpha")).await.unwrap(), page);
    }

    #[tokio::test]
    async fn upsert_keeps_last_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&Page::new(title("Alpha"), "one")).await.unwrap();
        store.save(&Page::new(title("Alpha"), "two")).await.unwrap();

        assert_eq!(store.load(&title("Alpha")).await.unwrap().body, b"two".to_vec());
        assert_eq!(store.list_titles().await.unwrap(), vec!["Alpha"]);
    }

    #[tokio::test]
    async fn missing_page_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store.load(&title("Nobody")).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn lists_titles_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for name in ["Gamma", "Alpha", "Beta"] {
            store.save(&Page::new(title(name), name)).await.unwrap();
        }

        assert_eq!(store.list_titles().await.unwrap(), vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn unreachable_database_fails_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("missing").join("pages.db").display());
        let store = DocumentStore::connect_lazy(&url).unwrap();

        let err = store.list_titles().await.unwrap_err();
        assert!(matches!(err, StorageError::Database(_)), "unexpected error: {err}");
        assert!(!store.load(&title("Alpha")).await.unwrap_err().is_not_found());
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(DocumentStore::connect_lazy("sqlite://pages.db?flavor=unknown").is_err());
    }
}
