//! Scoped on-disk staging for uploaded archives.

use crate::archive::{ArchiveError, ArchiveReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Archive too large: {0} bytes (max: {1})")]
    ArchiveTooLarge(u64, u64),
}

/// Parent directory of every staged archive.
pub struct StagingArea {
    root: PathBuf,
    max_archive_bytes: u64,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>, max_archive_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_archive_bytes,
        }
    }

    pub async fn init(&self) -> Result<(), StagingError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes `bytes` into a fresh directory of its own.
    ///
    /// The directory goes away when the returned value is dropped or cleaned up.
    pub async fn stage_archive(
        &self,
        archive_name: &str,
        bytes: &[u8],
    ) -> Result<StagedArchive, StagingError> {
        let size = bytes.len() as u64;
        if size > self.max_archive_bytes {
            return Err(StagingError::ArchiveTooLarge(size, self.max_archive_bytes));
        }
        let safe_name = match sanitize_filename(archive_name) {
            Ok(name) if is_zip(&name) => name,
            Ok(name) => format!("{}.zip", name),
            Err(_) => "upload.zip".to_string(),
        };

        fs::create_dir_all(&self.root).await?;
        let dir = tempfile::Builder::new()
            .prefix("archive-")
            .tempdir_in(&self.root)?;
        let archive_path = dir.path().join(&safe_name);
        let mut file = fs::File::create(&archive_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!("Staged {} ({} bytes) at {:?}", archive_name, size, archive_path);
        Ok(StagedArchive {
            dir,
            archive_path,
            max_entry_bytes: self.max_archive_bytes,
        })
    }
}

pub struct StagedArchive {
    dir: TempDir,
    archive_path: PathBuf,
    /// No entry may inflate past the size the archive itself was allowed.
    max_entry_bytes: u64,
}

impl StagedArchive {
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Opens the staged archive with the staging size limit applied per entry.
    pub fn open_reader(&self) -> Result<ArchiveReader<File>, ArchiveError> {
        Ok(ArchiveReader::open(&self.archive_path)?.with_entry_limit(self.max_entry_bytes))
    }

    /// Directory for other artifacts sharing the archive's lifetime.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the staging directory, logging instead of failing.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed staging directory {:?}", path),
            Err(e) => warn!("Failed to remove staging directory {:?}: {}", path, e),
        }
    }
}

/// Sanitize a filename to prevent path traversal attacks.
pub fn sanitize_filename(filename: &str) -> Result<String, StagingError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StagingError::InvalidFilename(filename.to_string()))?;

    // Exact ".." is traversal, "..." inside a name is fine.
    if name.contains('\0') || name.starts_with('.') || name == ".." {
        return Err(StagingError::InvalidFilename(filename.to_string()));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | '#' | '%' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    Ok(sanitized)
}

/// Check if a file is a zip archive.
pub fn is_zip(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
