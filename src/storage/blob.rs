//! Object storage for covers and tracks.

use super::signing::UrlSigner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` under `path`, replacing any previous blob.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError>;

    /// Returns a URL granting read access to `path` for `ttl`.
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError>;

    /// Returns Ok(None) if nothing is stored under `path`.
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError>;
}

/// Blob paths are relative, `/`-separated and never climb out of their root.
pub fn validate_blob_path(path: &str) -> Result<(), BlobError> {
    if path.is_empty() || path.contains('\0') || path.contains('\\') {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    let all_normal = Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !all_normal || path.starts_with('/') {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    Ok(())
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Stores blobs as plain files below a root directory.
pub struct LocalBlobStorage {
    root: PathBuf,
    signer: Arc<UrlSigner>,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>, signer: Arc<UrlSigner>) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn init(&self) -> Result<(), BlobError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        validate_blob_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), BlobError> {
        let file_path = self.resolve(path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&file_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        let file_path = self.resolve(path)?;
        if !fs::try_exists(&file_path).await? {
            return Err(BlobError::NotFound(path.to_string()));
        }
        Ok(self.signer.signed_url(path, ttl, unix_now()))
    }

    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let file_path = self.resolve(path)?;
        match fs::read(&file_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps blobs in memory, for tests.
pub struct InMemoryBlobStorage {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    signer: UrlSigner,
}

impl Default for InMemoryBlobStorage {
    fn default() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            signer: UrlSigner::new("in-memory", "http://blobs.invalid"),
        }
    }
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes and content type.
    pub fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.blobs.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        validate_blob_path(path)?;
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        if !self.blobs.lock().unwrap().contains_key(path) {
            return Err(BlobError::NotFound(path.to_string()));
        }
        Ok(self.signer.signed_url(path, ttl, unix_now()))
    }

    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, BlobError> {
        Ok(self.get(path).map(|(bytes, _)| bytes))
    }
}
