mod file_config;

pub use file_config::{AuthFileConfig, FileConfig, IngestionFileConfig, StorageFileConfig};

use crate::archive::EntryOrder;
use crate::ingestion::{IngestionConfig, DEFAULT_SIGNED_URL_TTL};
use crate::server::config::DEFAULT_MAX_ARCHIVE_BYTES;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::user::{DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub public_base_url: Option<String>,
    pub blob_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub public_base_url: String,
    pub blob_dir: PathBuf,
    pub staging_dir: PathBuf,

    // Feature configs (with defaults)
    pub ingestion: IngestionSettings,
    pub auth: AuthSettings,

    /// None means a random secret is generated at startup.
    pub signing_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSettings {
    pub sort_entries: bool,
    pub max_archive_bytes: usize,
    pub signed_url_ttl_secs: u64,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            sort_entries: false,
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL.as_secs(),
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL.as_secs(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let public_base_url = file
            .public_base_url
            .or_else(|| cli.public_base_url.clone())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

        let blob_dir = file
            .blob_dir
            .map(PathBuf::from)
            .or_else(|| cli.blob_dir.clone())
            .unwrap_or_else(|| db_dir.join("blobs"));

        let staging_dir = file
            .staging_dir
            .map(PathBuf::from)
            .or_else(|| cli.staging_dir.clone())
            .unwrap_or_else(|| std::env::temp_dir().join("cd-catalog-staging"));

        let ingestion_file = file.ingestion.unwrap_or_default();
        let ingestion_defaults = IngestionSettings::default();
        let ingestion = IngestionSettings {
            sort_entries: ingestion_file
                .sort_entries
                .unwrap_or(ingestion_defaults.sort_entries),
            max_archive_bytes: ingestion_file
                .max_archive_bytes
                .unwrap_or(ingestion_defaults.max_archive_bytes),
            signed_url_ttl_secs: ingestion_file
                .signed_url_ttl_secs
                .unwrap_or(ingestion_defaults.signed_url_ttl_secs),
        };
        if ingestion.max_archive_bytes == 0 {
            bail!("ingestion.max_archive_bytes must be greater than zero");
        }
        if i64::try_from(ingestion.signed_url_ttl_secs).is_err() {
            bail!(
                "ingestion.signed_url_ttl_secs is too large: {}",
                ingestion.signed_url_ttl_secs
            );
        }

        let auth_file = file.auth.unwrap_or_default();
        let auth_defaults = AuthSettings::default();
        let auth = AuthSettings {
            access_token_ttl_secs: auth_file
                .access_token_ttl_secs
                .unwrap_or(auth_defaults.access_token_ttl_secs),
            refresh_token_ttl_secs: auth_file
                .refresh_token_ttl_secs
                .unwrap_or(auth_defaults.refresh_token_ttl_secs),
        };

        let signing_secret = file
            .storage
            .and_then(|s| s.signing_secret)
            .filter(|s| !s.is_empty());

        Ok(Self {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            public_base_url,
            blob_dir,
            staging_dir,
            ingestion,
            auth,
            signing_secret,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            frontend_dir_path: self.frontend_dir_path.clone(),
            max_archive_bytes: self.ingestion.max_archive_bytes,
        }
    }

    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            entry_order: if self.ingestion.sort_entries {
                EntryOrder::Lexicographic
            } else {
                EntryOrder::Container
            },
            signed_url_ttl: Duration::from_secs(self.ingestion.signed_url_ttl_secs),
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.access_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.refresh_token_ttl_secs)
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_db_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            port: 3001,
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/frontend".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 3001);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.frontend_dir_path, Some("/frontend".to_string()));
        assert_eq!(config.public_base_url, "http://127.0.0.1:3001");
        assert_eq!(config.blob_dir, temp_dir.path().join("blobs"));
        assert!(config.staging_dir.ends_with("cd-catalog-staging"));
        assert_eq!(config.ingestion, IngestionSettings::default());
        assert_eq!(config.auth, AuthSettings::default());
        assert!(config.signing_secret.is_none());
        assert_eq!(config.catalog_db_path(), temp_dir.path().join("catalog.db"));
        assert_eq!(config.user_db_path(), temp_dir.path().join("user.db"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            port: 3001,
            logging_level: RequestsLoggingLevel::Path,
            public_base_url: Some("http://cli.example".to_string()),
            ..Default::default()
        };

        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            ingestion: Some(IngestionFileConfig {
                sort_entries: Some(true),
                signed_url_ttl_secs: Some(60),
                ..Default::default()
            }),
            auth: Some(AuthFileConfig {
                access_token_ttl_secs: Some(120),
                ..Default::default()
            }),
            storage: Some(StorageFileConfig {
                signing_secret: Some("s3cret".to_string()),
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.public_base_url, "http://cli.example");
        assert!(config.ingestion.sort_entries);
        assert_eq!(config.ingestion.max_archive_bytes, DEFAULT_MAX_ARCHIVE_BYTES);
        assert_eq!(config.access_token_ttl(), Duration::from_secs(120));
        assert_eq!(config.refresh_token_ttl(), DEFAULT_REFRESH_TOKEN_TTL);
        assert_eq!(config.signing_secret.as_deref(), Some("s3cret"));

        let ingestion = config.ingestion_config();
        assert_eq!(ingestion.entry_order, EntryOrder::Lexicographic);
        assert_eq!(ingestion.signed_url_ttl, Duration::from_secs(60));
        assert_eq!(config.server_config().port, 4000);
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_rejects_zero_archive_limit() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let file_config = FileConfig {
            ingestion: Some(IngestionFileConfig {
                max_archive_bytes: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, Some(file_config)).is_err());
    }

    #[test]
    fn test_resolve_rejects_out_of_range_url_ttl() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let file_config = FileConfig {
            ingestion: Some(IngestionFileConfig {
                signed_url_ttl_secs: Some(u64::MAX),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, Some(file_config));
        assert!(result.unwrap_err().to_string().contains("signed_url_ttl_secs"));
    }
}
