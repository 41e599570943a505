//! Reading music archives: container enumeration, entry classification,
//! track extraction and track reordering.

mod classify;
mod extractor;
mod reader;
mod reorder;

pub use classify::{
    base_name, content_type_for, content_type_for_extension, extension_of, title_from_path,
    EntryKind, AUDIO_EXTENSIONS, IMAGE_EXTENSIONS,
};
pub use extractor::{extract, Cover, EntryOrder, Extraction, ExtractionWarning, Track, MAX_TRACKS};
pub use reader::{ArchiveEntry, ArchiveReader};
pub use reorder::{move_song, renumber, reorder_to, validate_permutation, Ordered, ReorderError};

#[cfg(test)]
pub(crate) use reader::test_archives;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive is corrupt: {0}")]
    ArchiveCorrupt(String),

    #[error("No audio found in archive")]
    NoAudioFound,
}
