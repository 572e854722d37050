use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::{fs, io::AsyncRead};

use crate::{
    errors::{AppError, Result},
    storage::Storage,
};

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AppError::Storage(format!("Failed to create storage directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn get_full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));

        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(AppError::Storage(format!("Rejected storage path: {}", path)));
        }

        Ok(self.base_path.join(relative))
    }
}

fn missing_or_storage_error(e: std::io::Error, action: &str) -> AppError {
    if e.kind() == ErrorKind::NotFound {
        AppError::NotFound("Image file not found")
    } else {
        AppError::Storage(format!("Failed to {}: {}", action, e))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {}", e)))?;

        tracing::debug!(path = %full_path.display(), bytes = data.len(), "Stored file");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.get_full_path(path)?;

        fs::read(&full_path)
            .await
            .map_err(|e| missing_or_storage_error(e, "read file"))
    }

    async fn open(&self, path: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        let full_path = self.get_full_path(path)?;

        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| missing_or_storage_error(e, "open file"))?;

        Ok(Box::new(file))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {}", e))),
        }
    }
}
