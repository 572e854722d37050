use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::errors::Result;

pub mod local;

pub use local::LocalStorage;

/// Blob storage addressed by slash-separated relative paths such as
/// `uploads/<user id>/<file name>`. A leading slash is ignored.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Fails with `AppError::NotFound` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Fails with `AppError::NotFound` when nothing is stored at `path`.
    async fn open(&self, path: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>>;

    async fn delete(&self, path: &str) -> Result<()>;
}
