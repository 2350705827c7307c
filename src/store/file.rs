use std::path::PathBuf;

use axum::async_trait;
use tokio::sync::RwLock;

use super::{
    shelf::{Shelf, ShelfFile},
    Book, BookStore, NewBook, StoreError,
};

/// Keeps books in a JSON file.
///
/// Every change is written to a temporary file next to `path` which then replaces `path`.
/// The in-memory copy only changes once the write succeeded.
#[derive(Debug)]
pub struct JsonFileBookStore {
    path: PathBuf,
    shelf: RwLock<Shelf>,
}

impl JsonFileBookStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let shelf = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<ShelfFile>(&bytes)
                .map_err(StoreError::Decode)?
                .into(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Store file does not exist yet");

                Shelf::default()
            }
            Err(err) => return Err(StoreError::Read(err)),
        };

        Ok(Self {
            path,
            shelf: RwLock::new(shelf),
        })
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    async fn persist(&self, shelf: &Shelf) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(&ShelfFile::from(shelf)).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::Write)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(StoreError::Write)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StoreError::Write)?;

        tracing::trace!("Persisted");

        Ok(())
    }

    /// Applies `change` to a copy of the shelf, persists the copy and only then keeps it.
    async fn write_with<T>(
        &self,
        change: impl FnOnce(&mut Shelf) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.shelf.write().await;

        let mut shelf = guard.clone();
        let out = change(&mut shelf)?;

        self.persist(&shelf).await?;
        *guard = shelf;

        Ok(out)
    }
}

#[async_trait]
impl BookStore for JsonFileBookStore {
    async fn insert(&self, book: NewBook) -> Result<i64, StoreError> {
        self.write_with(|shelf| shelf.insert(book)).await
    }

    async fn update(&self, book: &Book) -> Result<(), StoreError> {
        self.write_with(|shelf| shelf.update(book)).await
    }

    async fn delete(&self, book: &Book) -> Result<(), StoreError> {
        self.write_with(|shelf| shelf.delete(book)).await
    }

    async fn all_ordered_by_id(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.shelf.read().await.all())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self.shelf.read().await.get(id))
    }
}
