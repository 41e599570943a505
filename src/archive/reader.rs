//! Thin reader over ZIP containers.

use super::ArchiveError;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// One entry of the container index. Payloads are read on demand with
/// [`ArchiveReader::read_entry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in the container index.
    pub index: usize,
    pub path: String,
    pub is_directory: bool,
    /// Uncompressed payload size, zero for directories.
    pub size: u64,
}

/// Largest uncompressed entry read unless a reader is told otherwise.
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 500 * 1024 * 1024;

pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    max_entry_bytes: u64,
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Self::new(Cursor::new(bytes))
    }
}

impl ArchiveReader<File> {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|e| ArchiveError::ArchiveCorrupt(e.to_string()))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(reader: R) -> Result<Self, ArchiveError> {
        let archive =
            ZipArchive::new(reader).map_err(|e| ArchiveError::ArchiveCorrupt(e.to_string()))?;
        Ok(Self {
            archive,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        })
    }

    /// Caps the uncompressed size of any single entry read from this archive.
    pub fn with_entry_limit(mut self, max_entry_bytes: u64) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Lists every entry in container index order, directories included.
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let file = self
                .archive
                .by_index_raw(index)
                .map_err(|e| ArchiveError::ArchiveCorrupt(e.to_string()))?;
            let is_directory = file.is_dir();
            entries.push(ArchiveEntry {
                index,
                path: file.name().to_string(),
                is_directory,
                size: if is_directory { 0 } else { file.size() },
            });
        }
        Ok(entries)
    }

    /// Reads and decompresses the payload of the entry at `index`.
    ///
    /// Entries that declare or inflate to more than the entry limit are
    /// rejected as corrupt; the declared size is never trusted for allocation.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let limit = self.max_entry_bytes;
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| ArchiveError::ArchiveCorrupt(e.to_string()))?;
        if file.size() > limit {
            return Err(ArchiveError::ArchiveCorrupt(format!(
                "entry {} declares {} bytes (max: {})",
                file.name(),
                file.size(),
                limit
            )));
        }
        let name = file.name().to_string();

        let mut content = Vec::new();
        (&mut file)
            .take(limit.saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::ArchiveCorrupt(e.to_string()))?;
        if content.len() as u64 > limit {
            return Err(ArchiveError::ArchiveCorrupt(format!(
                "entry {} inflates past {} bytes",
                name, limit
            )));
        }
        Ok(content)
    }
}

#[cfg(test)]
pub(crate) mod test_archives {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Builds an in-memory ZIP; names ending with `/` become directories.
    pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }
}
