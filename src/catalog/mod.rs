//! Catalog records (CDs, gallery items, site settings) and the service that
//! reads and writes them.

mod models;
mod service;

pub use models::{Cd, CdMetadata, CdTrack, MediaItem, MediaKind, NewCd, SiteSettings};
pub use service::{CatalogError, CatalogService, Counter};

use rand::Rng;
use rand_distr::Alphanumeric;

pub const CD_KEY_PREFIX: &str = "cd_";
pub const SETTINGS_KEY: &str = "site_settings";

/// Time-derived record id: `<prefix>_<millis>_<random>`.
///
/// `prefix` may or may not carry its trailing underscore.
pub fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!(
        "{}_{}_{}",
        prefix.trim_end_matches('_'),
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}
