use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::errors::{AppError, Result};
use crate::storage::FileStore;

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AppError::Storage(format!("failed to create storage directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl FileStore for LocalStorage {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("failed to create directory: {}", e)))?;
        }

        // An existing file at this path is overwritten; re-uploads of a
        // same-named file with different content are legal.
        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::Storage(format!("failed to write file: {}", e)))?;

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);

        fs::read(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("failed to read file: {}", e)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);

        fs::remove_file(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("failed to delete file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_operations() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        let test_data = b"Hello, World!";
        let test_path = "alice/file.txt";

        storage.store(test_path, test_data).await.unwrap();
        assert_eq!(storage.read(test_path).await.unwrap(), test_data);

        storage.delete(test_path).await.unwrap();
        assert!(storage.read(test_path).await.is_err());
    }

    #[tokio::test]
    async fn test_store_overwrites_existing_path() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        storage.store("alice/a.txt", b"first").await.unwrap();
        storage.store("alice/a.txt", b"second").await.unwrap();

        assert_eq!(storage.read("alice/a.txt").await.unwrap(), b"second");
    }
}
