use async_trait::async_trait;

use crate::errors::Result;

pub mod local;

pub use local::LocalStorage;

/// Capability for durably storing file bytes. Deliberately narrow; anything
/// beyond store/read/delete belongs to the metadata records, not here.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    async fn delete(&self, path: &str) -> Result<()>;
}
