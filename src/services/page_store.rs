use std::future::Future;
use std::io;
use std::path::PathBuf;

use crate::types::{Page, PageTitle};

/// Failure talking to a page backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No page is stored under the title
    #[error("page {title} does not exist")]
    NotFound { title: PageTitle },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }
}

/// Where pages live.
///
/// Both backends behave the same towards handlers: a miss on `load` is
/// [`StorageError::NotFound`], anything else is a backend failure.
pub trait PageStore: Send + Sync + 'static {
    /// Fetch the page stored under `title`
    fn load(&self, title: &PageTitle) -> impl Future<Output = Result<Page, StorageError>> + Send;

    /// Store `page`, replacing whatever was there under the same title
    fn save(&self, page: &Page) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Titles of every stored page, sorted
    fn list_titles(&self) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}
