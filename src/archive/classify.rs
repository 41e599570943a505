//! Classification of archive entries by file name suffix.

use serde::Serialize;
use std::path::Path;

/// Audio suffixes accepted as tracks.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "flac", "ogg"];

/// Image suffixes accepted as cover candidates.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Folder some archivers add next to the real content (resource forks).
const RESOURCE_FORK_DIR: &str = "__MACOSX/";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    Audio,
    Image,
    Other,
}

impl EntryKind {
    /// Classifies a stored archive path with a case-insensitive suffix match.
    ///
    /// Resource forks and hidden files are never content, even when their
    /// suffix says otherwise.
    pub fn classify(path: &str) -> EntryKind {
        if path.starts_with(RESOURCE_FORK_DIR) || base_name(path).starts_with('.') {
            return EntryKind::Other;
        }

        let lower = path.to_lowercase();
        let has_suffix = |extensions: &[&str]| {
            extensions
                .iter()
                .any(|ext| lower.ends_with(&format!(".{}", ext)))
        };

        if has_suffix(AUDIO_EXTENSIONS) {
            EntryKind::Audio
        } else if has_suffix(IMAGE_EXTENSIONS) {
            EntryKind::Image
        } else {
            EntryKind::Other
        }
    }
}

/// The last path component of a stored archive path.
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
}

/// Track title: the base name with its last extension removed.
pub fn title_from_path(path: &str) -> String {
    let name = base_name(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

/// Lowercase extension of a stored path, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    Path::new(base_name(path))
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// MIME type inferred from the extension alone.
pub fn content_type_for_extension(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// MIME type sniffed from the payload, falling back to the extension table.
pub fn content_type_for(path: &str, bytes: &[u8]) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| content_type_for_extension(path).to_string())
}
