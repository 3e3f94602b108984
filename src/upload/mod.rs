use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{StoredFile, UserContext};
use crate::storage::FileStore;
use crate::store::DataStore;

/// Buffers an incoming file while feeding the content hash in the same pass;
/// the source stream is never read twice.
#[derive(Default)]
pub struct HashingBuffer {
    hasher: Sha256,
    buf: Vec<u8>,
}

impl HashingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.buf.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the buffer, yielding the bytes and the hex-encoded digest.
    pub fn finish(self) -> (Vec<u8>, String) {
        (self.buf, format!("{:x}", self.hasher.finalize()))
    }
}

/// Hashes, deduplicates, quota-checks and durably records one uploaded file.
#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn DataStore>,
    files: Arc<dyn FileStore>,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn DataStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    /// Runs the whole pipeline for a buffered upload. The dedup check runs
    /// before the quota check and before any disk write; neither failure
    /// leaves side effects behind. Failures after that point (disk write,
    /// usage update, metadata insert) surface as server errors and are not
    /// rolled back.
    pub async fn ingest(
        &self,
        user: &UserContext,
        filename: &str,
        data: HashingBuffer,
    ) -> Result<StoredFile> {
        let (bytes, sha256) = data.finish();
        let size_bytes = bytes.len() as i64;

        if self.store.file_by_hash(user.id, &sha256).await?.is_some() {
            return Err(AppError::DuplicateFile);
        }

        // Exact fit passes; one byte over fails.
        if size_bytes + user.used_bytes > user.quota_bytes {
            return Err(AppError::InsufficientStorage);
        }

        // Path is derived from identity + original filename. Same-name
        // uploads with different content overwrite the previous bytes; only
        // (user, hash) deduplicates.
        let storage_path = format!("{}/{}", user.username, filename);
        self.files.store(&storage_path, &bytes).await?;

        let new_used = self.store.add_used_storage(user.id, size_bytes).await?;

        let file = StoredFile {
            id: Uuid::new_v4(),
            user_id: user.id,
            filename: filename.to_string(),
            size_bytes,
            storage_path,
            sha256,
            uploaded_at: Utc::now(),
        };
        self.store.insert_file(&file).await?;

        tracing::info!(
            user_id = %user.id,
            filename = %file.filename,
            size_bytes,
            used_bytes = new_used,
            "file uploaded"
        );

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::storage::LocalStorage;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    fn hex_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn test_chunked_push_matches_whole_buffer_digest() {
        let payload = b"file upload pipeline test payload";

        let mut chunked = HashingBuffer::new();
        for chunk in payload.chunks(7) {
            chunked.push(chunk);
        }
        let (bytes, hash) = chunked.finish();

        assert_eq!(bytes, payload);
        assert_eq!(hash, hex_sha256(payload));
    }

    #[test]
    fn test_empty_buffer_digest() {
        let (bytes, hash) = HashingBuffer::new().finish();
        assert!(bytes.is_empty());
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    struct Fixture {
        pipeline: UploadPipeline,
        store: Arc<MemoryStore>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(LocalStorage::new(dir.path()).unwrap());
        Fixture {
            pipeline: UploadPipeline::new(store.clone(), files),
            store,
            _dir: dir,
        }
    }

    async fn seed_user(store: &MemoryStore, quota: i64, used: i64) -> UserContext {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            name: "Alice".to_string(),
            password_hash: String::new(),
            quota_bytes: quota,
            used_bytes: used,
            created_at: Utc::now(),
        };
        store.create_user(&user).await.unwrap();
        UserContext::from(&user)
    }

    fn buffered(data: &[u8]) -> HashingBuffer {
        let mut buf = HashingBuffer::new();
        buf.push(data);
        buf
    }

    #[tokio::test]
    async fn test_ingest_records_file_and_usage() {
        let fx = fixture().await;
        let user = seed_user(&fx.store, 100, 0).await;

        let file = fx
            .pipeline
            .ingest(&user, "a.txt", buffered(b"0123456789"))
            .await
            .unwrap();

        assert_eq!(file.size_bytes, 10);
        assert_eq!(file.sha256, hex_sha256(b"0123456789"));
        assert_eq!(file.storage_path, "alice/a.txt");

        let reloaded = fx.store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.used_bytes, 10);
        assert_eq!(fx.store.files_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_content_conflicts() {
        let fx = fixture().await;
        let user = seed_user(&fx.store, 100, 0).await;

        fx.pipeline
            .ingest(&user, "a.txt", buffered(b"same bytes"))
            .await
            .unwrap();

        // Same content under a different name is still a duplicate.
        let err = fx
            .pipeline
            .ingest(&user, "b.txt", buffered(b"same bytes"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateFile));

        // The failed attempt left no side effects.
        let reloaded = fx.store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.used_bytes, 10);
        assert_eq!(fx.store.files_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let fx = fixture().await;
        let user = seed_user(&fx.store, 10, 0).await;

        // Exactly quota - used fits.
        fx.pipeline
            .ingest(&user, "fit.txt", buffered(b"0123456789"))
            .await
            .unwrap();

        let reloaded = fx.store.user_by_id(user.id).await.unwrap().unwrap();
        let full = UserContext::from(&reloaded);

        // One byte over fails, before any write.
        let err = fx
            .pipeline
            .ingest(&full, "over.txt", buffered(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStorage));
        assert_eq!(fx.store.files_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dedup_check_runs_before_quota_check() {
        let fx = fixture().await;
        let user = seed_user(&fx.store, 10, 0).await;

        fx.pipeline
            .ingest(&user, "a.txt", buffered(b"0123456789"))
            .await
            .unwrap();

        // Re-uploading the identical content reports Conflict, not
        // insufficient storage, even though the quota is now exhausted.
        let reloaded = fx.store.user_by_id(user.id).await.unwrap().unwrap();
        let full = UserContext::from(&reloaded);
        let err = fx
            .pipeline
            .ingest(&full, "a.txt", buffered(b"0123456789"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateFile));
    }

    #[tokio::test]
    async fn test_same_content_different_users_both_stored() {
        let fx = fixture().await;
        let alice = seed_user(&fx.store, 100, 0).await;
        let bob = User {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            name: "Bob".to_string(),
            password_hash: String::new(),
            quota_bytes: 100,
            used_bytes: 0,
            created_at: Utc::now(),
        };
        fx.store.create_user(&bob).await.unwrap();

        fx.pipeline
            .ingest(&alice, "a.txt", buffered(b"shared"))
            .await
            .unwrap();
        fx.pipeline
            .ingest(&UserContext::from(&bob), "a.txt", buffered(b"shared"))
            .await
            .unwrap();

        assert_eq!(fx.store.files_by_user(alice.id).await.unwrap().len(), 1);
        assert_eq!(fx.store.files_by_user(bob.id).await.unwrap().len(), 1);
    }
}
