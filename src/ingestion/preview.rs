//! Server-side archive previews: extraction results that can be inspected and
//! reordered before they are committed.

use super::staging::StagedArchive;
use crate::archive::{
    content_type_for, extension_of, extract, move_song, ArchiveError, Cover,
    EntryOrder, Extraction, ExtractionWarning, ReorderError, Track,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// An extracted archive whose staging directory lives as long as the value.
pub struct ArchivePreview {
    staged: StagedArchive,
    archive_name: String,
    extraction: Extraction,
    /// Staged cover file and its content type.
    cover_file: Option<(PathBuf, String)>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub archive_name: String,
    pub cover: Option<Cover>,
    pub tracks: Vec<Track>,
    pub warnings: Vec<ExtractionWarning>,
}

impl ArchivePreview {
    pub async fn build(
        staged: StagedArchive,
        archive_name: &str,
        entry_order: EntryOrder,
    ) -> Result<ArchivePreview, ArchiveError> {
        let extracted = Self::extract_staged(&staged, entry_order);
        let (extraction, cover) = match extracted {
            Ok(extracted) => extracted,
            Err(e) => {
                staged.cleanup();
                return Err(e);
            }
        };

        let mut cover_file = None;
        if let Some((path, bytes)) = cover {
            let content_type = content_type_for(&path, &bytes);
            let extension = extension_of(&path).unwrap_or_else(|| "img".to_string());
            let file_path = staged.dir().join(format!("cover.{}", extension));
            if let Err(e) = tokio::fs::write(&file_path, &bytes).await {
                staged.cleanup();
                return Err(ArchiveError::ArchiveCorrupt(e.to_string()));
            }
            cover_file = Some((file_path, content_type));
        }

        Ok(ArchivePreview {
            staged,
            archive_name: archive_name.to_string(),
            extraction,
            cover_file,
        })
    }

    fn extract_staged(
        staged: &StagedArchive,
        entry_order: EntryOrder,
    ) -> Result<(Extraction, Option<(String, Vec<u8>)>), ArchiveError> {
        let mut reader = staged.open_reader()?;
        let extraction = extract(&reader.entries()?, entry_order)?;
        let cover = match &extraction.cover {
            Some(cover) => Some((cover.path.clone(), reader.read_entry(cover.entry_index)?)),
            None => None,
        };
        Ok((extraction, cover))
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.extraction.tracks
    }

    pub fn cover_file(&self) -> Option<&(PathBuf, String)> {
        self.cover_file.as_ref()
    }

    pub fn move_song(&mut self, from: usize, to: usize) -> Result<(), ReorderError> {
        move_song(&mut self.extraction.tracks, from, to)
    }

    pub fn summary(&self) -> PreviewSummary {
        PreviewSummary {
            archive_name: self.archive_name.clone(),
            cover: self.extraction.cover.clone(),
            tracks: self.extraction.tracks.clone(),
            warnings: self.extraction.warnings.clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (StagedArchive, Extraction) {
        (self.staged, self.extraction)
    }

    pub fn release(self) {
        debug!("Releasing preview of {}", self.archive_name);
        self.staged.cleanup();
    }
}

/// At most one preview per user; replacing or removing one releases it.
#[derive(Default)]
pub struct PreviewRegistry {
    previews: Mutex<HashMap<usize, ArchivePreview>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: usize, preview: ArchivePreview) -> PreviewSummary {
        let summary = preview.summary();
        let replaced = self.previews.lock().unwrap().insert(user_id, preview);
        if let Some(replaced) = replaced {
            replaced.release();
        }
        summary
    }

    pub fn summary(&self, user_id: usize) -> Option<PreviewSummary> {
        self.previews
            .lock()
            .unwrap()
            .get(&user_id)
            .map(ArchivePreview::summary)
    }

    /// Returns None if the user has no preview.
    pub fn move_song(
        &self,
        user_id: usize,
        from: usize,
        to: usize,
    ) -> Option<Result<PreviewSummary, ReorderError>> {
        let mut previews = self.previews.lock().unwrap();
        let preview = previews.get_mut(&user_id)?;
        Some(preview.move_song(from, to).map(|_| preview.summary()))
    }

    pub fn cover_file(&self, user_id: usize) -> Option<(PathBuf, String)> {
        self.previews
            .lock()
            .unwrap()
            .get(&user_id)
            .and_then(|p| p.cover_file().cloned())
    }

    pub fn take(&self, user_id: usize) -> Option<ArchivePreview> {
        self.previews.lock().unwrap().remove(&user_id)
    }

    /// Returns false if the user had no preview.
    pub fn remove(&self, user_id: usize) -> bool {
        match self.take(user_id) {
            Some(preview) => {
                preview.release();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.previews.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
