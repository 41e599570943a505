//! Turns a list of archive entries into an ordered track list and a cover.

use super::classify::{title_from_path, EntryKind};
use super::reader::ArchiveEntry;
use super::reorder::Ordered;
use super::ArchiveError;
use serde::Serialize;

/// Hard cap on the number of tracks a single CD can hold.
pub const MAX_TRACKS: usize = 30;

/// How entries are ordered before classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Keep the order of the container index.
    #[default]
    Container,
    /// Sort by stored path, byte-wise.
    Lexicographic,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    /// Index of the source entry inside the container.
    #[serde(skip)]
    pub entry_index: usize,
    pub path: String,
    pub size: u64,
    /// Position this track had right after extraction.
    pub source_position: usize,
    /// Unknown until some decoding step fills it in.
    pub duration_seconds: f64,
    pub order: usize,
}

impl Ordered for Track {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cover {
    #[serde(skip)]
    pub entry_index: usize,
    pub path: String,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code")]
pub enum ExtractionWarning {
    TooManyTracks { found: usize, kept: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Extraction {
    pub cover: Option<Cover>,
    pub tracks: Vec<Track>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Builds the track list out of container entries.
///
/// Directories are skipped. Audio entries become tracks in encounter order,
/// the first image becomes the cover and later images are ignored.
pub fn extract(entries: &[ArchiveEntry], entry_order: EntryOrder) -> Result<Extraction, ArchiveError> {
    let mut ordered: Vec<&ArchiveEntry> = entries.iter().filter(|e| !e.is_directory).collect();
    if entry_order == EntryOrder::Lexicographic {
        ordered.sort_by(|a, b| a.path.cmp(&b.path));
    }

    let mut tracks = Vec::new();
    let mut cover = None;

    for entry in ordered {
        match EntryKind::classify(&entry.path) {
            EntryKind::Audio => {
                let position = tracks.len();
                tracks.push(Track {
                    title: title_from_path(&entry.path),
                    entry_index: entry.index,
                    path: entry.path.clone(),
                    size: entry.size,
                    source_position: position,
                    duration_seconds: 0.0,
                    order: position,
                });
            }
            EntryKind::Image if cover.is_none() => {
                cover = Some(Cover {
                    entry_index: entry.index,
                    path: entry.path.clone(),
                    size: entry.size,
                });
            }
            _ => {}
        }
    }

    if tracks.is_empty() {
        return Err(ArchiveError::NoAudioFound);
    }

    let mut warnings = Vec::new();
    if tracks.len() > MAX_TRACKS {
        warnings.push(ExtractionWarning::TooManyTracks {
            found: tracks.len(),
            kept: MAX_TRACKS,
        });
        tracks.truncate(MAX_TRACKS);
    }

    Ok(Extraction {
        cover,
        tracks,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<ArchiveEntry> {
        paths
            .iter()
            .enumerate()
            .map(|(index, path)| ArchiveEntry {
                index,
                path: path.to_string(),
                is_directory: path.ends_with('/'),
                size: if path.ends_with('/') { 0 } else { 10 },
            })
            .collect()
    }

    #[test]
    fn two_songs_and_a_cover() {
        let extraction = extract(
            &entries(&["01-intro.mp3", "02-song.mp3", "cover.jpg"]),
            EntryOrder::Container,
        )
        .unwrap();

        let titles: Vec<(&str, usize)> = extraction
            .tracks
            .iter()
            .map(|t| (t.title.as_str(), t.order))
            .collect();
        assert_eq!(titles, vec![("01-intro", 0), ("02-song", 1)]);
        assert_eq!(extraction.cover.unwrap().path, "cover.jpg");
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn thirty_two_wavs_are_truncated() {
        let names: Vec<String> = (0..32).map(|i| format!("track{:02}.wav", i)).collect();
        let paths: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

        let extraction = extract(&entries(&paths), EntryOrder::Container).unwrap();

        assert_eq!(extraction.tracks.len(), 30);
        let orders: Vec<usize> = extraction.tracks.iter().map(|t| t.order).collect();
        assert_eq!(orders, (0..30).collect::<Vec<_>>());
        assert_eq!(extraction.tracks[29].title, "track29");
        assert!(extraction.cover.is_none());
        assert_eq!(
            extraction.warnings,
            vec![ExtractionWarning::TooManyTracks { found: 32, kept: 30 }]
        );
    }

    #[test]
    fn exactly_thirty_has_no_warning() {
        let names: Vec<String> = (0..30).map(|i| format!("{}.ogg", i)).collect();
        let paths: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let extraction = extract(&entries(&paths), EntryOrder::Container).unwrap();
        assert_eq!(extraction.tracks.len(), 30);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn no_audio_fails() {
        let result = extract(&entries(&["readme.txt"]), EntryOrder::Container);
        assert!(matches!(result, Err(ArchiveError::NoAudioFound)));

        let result = extract(&entries(&["cover.png", "dir/"]), EntryOrder::Container);
        assert!(matches!(result, Err(ArchiveError::NoAudioFound)));
    }

    #[test]
    fn first_image_wins() {
        let extraction = extract(
            &entries(&["z.png", "song.mp3", "a.jpg"]),
            EntryOrder::Container,
        )
        .unwrap();
        assert_eq!(extraction.cover.unwrap().path, "z.png");
    }

    #[test]
    fn lexicographic_order_changes_cover_and_tracks() {
        let list = entries(&["z.png", "b.mp3", "a.jpg", "a.mp3"]);
        let extraction = extract(&list, EntryOrder::Lexicographic).unwrap();
        assert_eq!(extraction.cover.as_ref().unwrap().path, "a.jpg");
        assert_eq!(extraction.tracks[0].title, "a");
        assert_eq!(extraction.tracks[0].entry_index, 3);
        assert_eq!(extraction.tracks[1].title, "b");
    }

    #[test]
    fn directories_are_skipped() {
        let extraction = extract(
            &entries(&["disc1/", "disc1/01.mp3", "disc2/", "disc2/01.mp3"]),
            EntryOrder::Container,
        )
        .unwrap();
        assert_eq!(extraction.tracks.len(), 2);
        assert_eq!(extraction.tracks[1].path, "disc2/01.mp3");
    }

    #[test]
    fn extraction_is_deterministic() {
        let list = entries(&["x.jpg", "1.mp3", "y.png", "2.flac"]);
        let first = extract(&list, EntryOrder::Container).unwrap();
        let second = extract(&list, EntryOrder::Container).unwrap();
        assert_eq!(first, second);
    }
}
