//! Catalog operations on top of the key-value store.

use super::models::{Cd, CdTrack, MediaItem, MediaKind, NewCd, SiteSettings};
use super::{generate_id, CD_KEY_PREFIX, SETTINGS_KEY};
use crate::archive::{renumber, reorder_to, ReorderError, MAX_TRACKS};
use crate::storage::KeyValueStore;
use anyhow::Context;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Reorder(#[from] ReorderError),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    Play,
    Download,
}

pub struct CatalogService {
    kv: Arc<dyn KeyValueStore>,
    /// Serialises read-modify-write cycles on CD records.
    write_lock: Mutex<()>,
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed record: {}", e);
                None
            }
        })
        .collect()
}

impl CatalogService {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    pub fn list_cds(&self) -> Result<Vec<Cd>, CatalogError> {
        let cds = decode_all(self.kv.get_by_prefix(CD_KEY_PREFIX)?);
        Ok(cds)
    }

    pub fn get_cd(&self, id: &str) -> Result<Option<Cd>, CatalogError> {
        if !id.starts_with(CD_KEY_PREFIX) {
            return Ok(None);
        }
        match self.kv.get(id)? {
            None => Ok(None),
            Some(value) => Ok(Some(
                serde_json::from_value(value).with_context(|| format!("Malformed CD {}", id))?,
            )),
        }
    }

    /// Writes a record under its own id.
    pub fn commit_cd(&self, cd: &Cd) -> Result<(), CatalogError> {
        let value = serde_json::to_value(cd).context("Failed to serialize CD")?;
        self.kv.set(&cd.id, &value)?;
        Ok(())
    }

    /// Creates a CD from already-hosted assets.
    pub fn create_cd(&self, new_cd: NewCd) -> Result<Cd, CatalogError> {
        let missing = new_cd.metadata.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogError::InvalidInput(format!(
                "Missing fields: {}",
                missing.join(", ")
            )));
        }
        let metadata = new_cd.metadata.trimmed();

        let mut tracks = new_cd.tracks;
        tracks.sort_by_key(|t| t.order);
        if tracks.len() > MAX_TRACKS {
            warn!(
                "Manual CD {} has {} tracks, keeping the first {}",
                metadata.title,
                tracks.len(),
                MAX_TRACKS
            );
            tracks.truncate(MAX_TRACKS);
        }
        renumber(&mut tracks);

        let cd = Cd {
            id: generate_id(CD_KEY_PREFIX),
            title: metadata.title,
            artist: metadata.artist,
            genre: metadata.genre,
            cover_url: new_cd.cover_url.filter(|url| !url.is_empty()),
            tracks,
            play_count: 0,
            download_count: 0,
            created_at: Utc::now(),
        };
        self.commit_cd(&cd)?;
        info!("Created CD {}: {} - {}", cd.id, cd.title, cd.artist);
        Ok(cd)
    }

    /// Bumps a counter, returning its new value, or None if there's no such CD.
    pub fn increment(&self, id: &str, counter: Counter) -> Result<Option<u64>, CatalogError> {
        let _guard = self.write_lock.lock().unwrap();
        let Some(mut cd) = self.get_cd(id)? else {
            return Ok(None);
        };
        let value = match counter {
            Counter::Play => {
                cd.play_count += 1;
                cd.play_count
            }
            Counter::Download => {
                cd.download_count += 1;
                cd.download_count
            }
        };
        self.commit_cd(&cd)?;
        Ok(Some(value))
    }

    /// Rearranges a committed CD's tracks; `target[i]` is the current
    /// position of the track that should end up at `i`.
    pub fn reorder_cd(&self, id: &str, target: &[usize]) -> Result<Option<Cd>, CatalogError> {
        let _guard = self.write_lock.lock().unwrap();
        let Some(mut cd) = self.get_cd(id)? else {
            return Ok(None);
        };
        let mut tracks: Vec<CdTrack> = std::mem::take(&mut cd.tracks);
        tracks.sort_by_key(|t| t.order);
        reorder_to(&mut tracks, target)?;
        cd.tracks = tracks;
        self.commit_cd(&cd)?;
        Ok(Some(cd))
    }

    pub fn add_media(
        &self,
        kind: MediaKind,
        url: &str,
        title: Option<&str>,
    ) -> Result<MediaItem, CatalogError> {
        if url.trim().is_empty() {
            return Err(CatalogError::InvalidInput("Missing url".to_string()));
        }
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(kind.default_title());
        let item = MediaItem {
            id: generate_id(kind.key_prefix()),
            url: url.trim().to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&item).context("Failed to serialize media item")?;
        self.kv.set(&item.id, &value)?;
        info!("Added {:?} {}: {}", kind, item.id, item.title);
        Ok(item)
    }

    pub fn list_media(&self, kind: MediaKind) -> Result<Vec<MediaItem>, CatalogError> {
        let prefix = format!("{}_", kind.key_prefix());
        Ok(decode_all(self.kv.get_by_prefix(&prefix)?))
    }

    pub fn save_settings(&self, settings: &SiteSettings) -> Result<(), CatalogError> {
        let value = serde_json::to_value(settings).context("Failed to serialize settings")?;
        self.kv.set(SETTINGS_KEY, &value)?;
        info!("Site settings updated");
        Ok(())
    }

    pub fn get_settings(&self) -> Result<SiteSettings, CatalogError> {
        match self.kv.get(SETTINGS_KEY)? {
            Some(value) => match serde_json::from_value(value) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!("Stored settings are malformed, using defaults: {}", e);
                    Ok(SiteSettings::default())
                }
            },
            None => Ok(SiteSettings::default()),
        }
    }
}
