use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn, error};
use tokio::fs;

use crate::services::{PageStore, StorageError};
use crate::types::{Page, PageTitle};

const PAGE_EXTENSION: &str = "txt";

/// Distinguishes concurrent saves of the same page
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pages stored as `<title>.txt` files in a single directory
#[derive(Clone, Debug)]
pub struct FileStore {
    pages_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `pages_dir`, creating the directory if needed
    pub async fn open(pages_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let pages_dir = pages_dir.into();
        fs::create_dir_all(&pages_dir)
            .await
            .map_err(|e| StorageError::io(&pages_dir, e))?;
        info!("Using page directory {:?}", pages_dir);
        Ok(Self { pages_dir })
    }

    fn page_path(&self, title: &PageTitle) -> PathBuf {
        self.pages_dir.join(format!("{}.{}", title, PAGE_EXTENSION))
    }

    /// Recover a title from a directory entry name, if it names a page file
    fn title_from_entry(name: &str) -> Option<&str> {
        if name.starts_with('.') {
            return None;
        }
        let stem = name.strip_suffix(PAGE_EXTENSION)?.strip_suffix('.')?;
        PageTitle::parse(stem).map(|_| stem)
    }
}

impl PageStore for FileStore {
    async fn load(&self, title: &PageTitle) -> Result<Page, StorageError> {
        let path = self.page_path(title);
        debug!("Reading page file {:?}", path);
        match fs::read(&path).await {
            Ok(body) => Ok(Page::new(title.clone(), body)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound { title: title.clone() })
            }
            Err(e) => {
                error!("Failed to read page file {:?}: {}", path, e);
                Err(StorageError::io(path, e))
            }
        }
    }

    async fn save(&self, page: &Page) -> Result<(), StorageError> {
        let path = self.page_path(&page.title);
        debug!("Writing {} bytes to {:?}", page.body.len(), path);
        let temp = self.pages_dir.join(format!(
            ".{}.{}.tmp",
            page.title,
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        replace_private(&temp, &path, &page.body).await.map_err(|e| {
            error!("Failed to write page file {:?}: {}", path, e);
            StorageError::io(&path, e)
        })
    }

    async fn list_titles(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(&self.pages_dir)
            .await
            .map_err(|e| StorageError::io(&self.pages_dir, e))?;

        let mut titles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.pages_dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = match entry.file_type().await {
                Ok(file_type) => file_type.is_file(),
                Err(e) => {
                    warn!("Could not stat directory entry {:?}: {}", name, e);
                    false
                }
            };
            match Self::title_from_entry(&name) {
                Some(title) if is_file => titles.push(title.to_string()),
                _ => debug!("Skipping non-page entry {:?} in {:?}", name, self.pages_dir),
            }
        }

        titles.sort();
        debug!("Listed {} pages in {:?}", titles.len(), self.pages_dir);
        Ok(titles)
    }
}

/// Write `contents` to `temp`, then rename it over `path`.
///
/// Readers see either the old page or the new one, never a partial write.
/// The file is owner read/write only on Unix.
async fn replace_private(temp: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let result = async {
        write_new(temp, contents).await?;
        fs::rename(temp, path).await
    }
    .await;
    if result.is_err() {
        if let Err(e) = fs::remove_file(temp).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Could not remove temporary file {:?}: {}", temp, e);
            }
        }
    }
    result
}

async fn write_new(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
