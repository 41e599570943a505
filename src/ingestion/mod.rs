//! Bulk CD ingestion from ZIP archives.
//!
//! 1. The archive is staged in a directory of its own
//! 2. Entries are classified and turned into an ordered track list
//! 3. Optionally the track order is rearranged (directly or via a preview)
//! 4. Cover and tracks are uploaded one by one to blob storage
//! 5. The CD record is committed to the catalog

mod manager;
mod preview;
mod staging;

pub use manager::{
    IngestionConfig, IngestionError, IngestionOrchestrator, IngestionOutcome, IngestionRequest,
    IngestionWarning, DEFAULT_SIGNED_URL_TTL,
};
pub use preview::{ArchivePreview, PreviewRegistry, PreviewSummary};
pub use staging::{is_zip, sanitize_filename, StagedArchive, StagingArea, StagingError};
