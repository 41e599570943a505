use crate::archive::Ordered;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One track of a committed CD.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdTrack {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "duration")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub order: usize,
}

impl Ordered for CdTrack {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

/// The catalog record of an album.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cd {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, alias = "songs")]
    pub tracks: Vec<CdTrack>,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Descriptive fields every CD needs.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CdMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub genre: String,
}

impl CdMetadata {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            genre: genre.into(),
        }
    }

    /// Names of the required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("artist", &self.artist),
            ("genre", &self.genre),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            genre: self.genre.trim().to_string(),
        }
    }
}

/// Body of a manual (non-archive) CD creation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCd {
    #[serde(flatten)]
    pub metadata: CdMetadata,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, alias = "songs")]
    pub tracks: Vec<CdTrack>,
}

/// A gallery item: photos and videos share this shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            MediaKind::Photo => "Photo",
            MediaKind::Video => "Video",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_slogan: String,
    pub logo_url: String,
    pub banner_title: String,
    pub banner_subtitle: String,
    pub banner_image_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "CD Catalog".to_string(),
            site_slogan: "Your music, your style".to_string(),
            logo_url: String::new(),
            banner_title: "Welcome to the CD Catalog".to_string(),
            banner_subtitle: "Discover and download the best albums".to_string(),
            banner_image_url: String::new(),
        }
    }
}
