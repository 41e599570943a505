//! Turns an uploaded archive into a committed CD.

use super::preview::ArchivePreview;
use super::staging::{sanitize_filename, StagedArchive, StagingArea, StagingError};
use crate::archive::{
    content_type_for, extension_of, extract, renumber, reorder_to, ArchiveError, ArchiveReader,
    EntryOrder, Extraction, ExtractionWarning, Track,
};
use crate::catalog::{generate_id, CatalogError, CatalogService, Cd, CdMetadata, CdTrack, CD_KEY_PREFIX};
use crate::storage::BlobStorage;
use crate::user::Identity;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One year, the practical lifetime of a signed asset URL.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("Failed to commit CD: {0}")]
    Store(#[from] CatalogError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code")]
pub enum IngestionWarning {
    TooManyTracks { found: usize, kept: usize },
    StorageUploadFailed { file: String },
}

impl From<ExtractionWarning> for IngestionWarning {
    fn from(warning: ExtractionWarning) -> Self {
        match warning {
            ExtractionWarning::TooManyTracks { found, kept } => {
                IngestionWarning::TooManyTracks { found, kept }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub entry_order: EntryOrder,
    pub signed_url_ttl: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            entry_order: EntryOrder::Container,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }
}

pub struct IngestionRequest {
    pub archive: Vec<u8>,
    pub archive_name: String,
    pub metadata: CdMetadata,
    /// `track_order[i]` is the extracted position of the track that goes at `i`.
    pub track_order: Option<Vec<usize>>,
}

#[derive(Debug, Serialize)]
pub struct IngestionOutcome {
    pub cd: Cd,
    pub warnings: Vec<IngestionWarning>,
}

pub struct IngestionOrchestrator {
    staging: StagingArea,
    blobs: Arc<dyn BlobStorage>,
    catalog: Arc<CatalogService>,
    config: IngestionConfig,
}

impl IngestionOrchestrator {
    pub fn new(
        staging: StagingArea,
        blobs: Arc<dyn BlobStorage>,
        catalog: Arc<CatalogService>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            staging,
            blobs,
            catalog,
            config,
        }
    }

    /// Extracts, uploads and commits an archive in one go.
    pub async fn ingest(
        &self,
        identity: &Identity,
        request: IngestionRequest,
    ) -> Result<IngestionOutcome, IngestionError> {
        let metadata = validated_metadata(request.metadata)?;
        info!(
            "User {} is ingesting {} ({} bytes)",
            identity.handle,
            request.archive_name,
            request.archive.len()
        );

        let staged = self
            .staging
            .stage_archive(&request.archive_name, &request.archive)
            .await?;
        drop(request.archive);

        let result = self
            .ingest_staged(&staged, metadata, request.track_order.as_deref())
            .await;
        staged.cleanup();
        result
    }

    async fn ingest_staged(
        &self,
        staged: &StagedArchive,
        metadata: CdMetadata,
        track_order: Option<&[usize]>,
    ) -> Result<IngestionOutcome, IngestionError> {
        let mut reader = staged.open_reader()?;
        let entries = reader.entries()?;
        let mut extraction = extract(&entries, self.config.entry_order)?;
        info!(
            "Archive has {} entries: {} tracks kept, cover {}",
            entries.len(),
            extraction.tracks.len(),
            if extraction.cover.is_some() { "found" } else { "missing" }
        );
        if let Some(target) = track_order {
            reorder_to(&mut extraction.tracks, target)
                .map_err(|e| IngestionError::InvalidInput(format!("Invalid trackOrder: {}", e)))?;
        }
        self.persist(&mut reader, extraction, metadata).await
    }

    /// Stages and extracts an archive without committing anything.
    pub async fn preview(
        &self,
        identity: &Identity,
        archive_name: &str,
        archive: &[u8],
    ) -> Result<ArchivePreview, IngestionError> {
        let staged = self.staging.stage_archive(archive_name, archive).await?;
        let preview = ArchivePreview::build(staged, archive_name, self.config.entry_order).await?;
        debug!(
            "User {} previewing {} with {} tracks",
            identity.handle,
            archive_name,
            preview.tracks().len()
        );
        Ok(preview)
    }

    /// Commits a previewed archive in its current order and releases it.
    pub async fn commit_preview(
        &self,
        identity: &Identity,
        preview: ArchivePreview,
        metadata: CdMetadata,
    ) -> Result<IngestionOutcome, IngestionError> {
        let metadata = validated_metadata(metadata)?;
        info!(
            "User {} is committing preview of {}",
            identity.handle,
            preview.archive_name()
        );
        let (staged, extraction) = preview.into_parts();
        let result = match staged.open_reader() {
            Ok(mut reader) => self.persist(&mut reader, extraction, metadata).await,
            Err(e) => Err(e.into()),
        };
        staged.cleanup();
        result
    }

    /// Uploads cover and tracks one at a time, then writes the record.
    ///
    /// Uploads that fail are skipped and reported; nothing is rolled back.
    async fn persist<R: std::io::Read + std::io::Seek>(
        &self,
        reader: &mut ArchiveReader<R>,
        extraction: Extraction,
        metadata: CdMetadata,
    ) -> Result<IngestionOutcome, IngestionError> {
        let cd_id = generate_id(CD_KEY_PREFIX);
        let mut warnings: Vec<IngestionWarning> =
            extraction.warnings.into_iter().map(Into::into).collect();

        let mut cover_url = None;
        if let Some(cover) = &extraction.cover {
            let bytes = reader.read_entry(cover.entry_index)?;
            let extension = extension_of(&cover.path).unwrap_or_else(|| "jpg".to_string());
            let blob_path = format!("{}/cover.{}", cd_id, extension);
            match self.upload(&blob_path, &cover.path, bytes).await {
                Some(url) => cover_url = Some(url),
                None => warnings.push(IngestionWarning::StorageUploadFailed {
                    file: cover.path.clone(),
                }),
            }
        }

        let mut tracks: Vec<Track> = extraction.tracks;
        tracks.sort_by_key(|t| t.order);
        let mut cd_tracks = Vec::with_capacity(tracks.len());
        for track in tracks {
            let bytes = reader.read_entry(track.entry_index)?;
            let file_name = sanitize_filename(&track.path)
                .unwrap_or_else(|_| format!("track-{}", track.source_position));
            let blob_path = format!("{}/songs/{:02}-{}", cd_id, track.order + 1, file_name);
            match self.upload(&blob_path, &track.path, bytes).await {
                Some(url) => cd_tracks.push(CdTrack {
                    title: track.title,
                    url,
                    duration_seconds: track.duration_seconds,
                    order: track.order,
                }),
                None => warnings.push(IngestionWarning::StorageUploadFailed { file: track.path }),
            }
        }
        renumber(&mut cd_tracks);

        let cd = Cd {
            id: cd_id,
            title: metadata.title,
            artist: metadata.artist,
            genre: metadata.genre,
            cover_url,
            tracks: cd_tracks,
            play_count: 0,
            download_count: 0,
            created_at: Utc::now(),
        };
        self.catalog.commit_cd(&cd)?;
        info!(
            "Committed CD {} ({} tracks, {} warnings)",
            cd.id,
            cd.tracks.len(),
            warnings.len()
        );
        Ok(IngestionOutcome { cd, warnings })
    }

    /// Returns the signed URL of the uploaded blob, or None if storage failed.
    async fn upload(&self, blob_path: &str, source_path: &str, bytes: Vec<u8>) -> Option<String> {
        let content_type = content_type_for(source_path, &bytes);
        if let Err(e) = self.blobs.upload(blob_path, bytes, &content_type).await {
            warn!("Failed to upload {} to {}: {}", source_path, blob_path, e);
            return None;
        }
        match self
            .blobs
            .create_signed_url(blob_path, self.config.signed_url_ttl)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Failed to sign {}: {}", blob_path, e);
                None
            }
        }
    }
}

fn validated_metadata(metadata: CdMetadata) -> Result<CdMetadata, IngestionError> {
    let missing = metadata.missing_fields();
    if !missing.is_empty() {
        return Err(IngestionError::InvalidInput(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }
    Ok(metadata.trimmed())
}
