use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cd_catalog_server::catalog::CatalogService;
use cd_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use cd_catalog_server::ingestion::{IngestionOrchestrator, StagingArea};
use cd_catalog_server::server::{run_server, RequestsLoggingLevel, ServerState};
use cd_catalog_server::storage::{LocalBlobStorage, SqliteKeyValueStore, UrlSigner};
use cd_catalog_server::user::{SqliteUserStore, UserManager};

/// How often expired access/refresh tokens are swept from the user store.
const TOKEN_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the catalog and user databases.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Base URL used when building signed blob URLs.
    #[clap(long)]
    pub public_base_url: Option<String>,

    /// Directory where uploaded covers and tracks are stored.
    #[clap(long, value_parser = parse_path)]
    pub blob_dir: Option<PathBuf>,

    /// Directory for the temporary files of in-flight uploads.
    #[clap(long, value_parser = parse_path)]
    pub staging_dir: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            public_base_url: self.public_base_url.clone(),
            blob_dir: self.blob_dir.clone(),
            staging_dir: self.staging_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!(
        "Opening SQLite catalog database at {:?}...",
        config.catalog_db_path()
    );
    let kv_store = SqliteKeyValueStore::new(config.catalog_db_path())?;
    let catalog = Arc::new(CatalogService::new(Arc::new(kv_store)));

    info!("Opening SQLite user database at {:?}...", config.user_db_path());
    let user_store = SqliteUserStore::new(config.user_db_path())?;
    let user_manager = Arc::new(
        UserManager::new(Box::new(user_store))
            .with_token_ttls(config.access_token_ttl(), config.refresh_token_ttl()),
    );

    let signer = Arc::new(match &config.signing_secret {
        Some(secret) => UrlSigner::new(secret.as_bytes(), config.public_base_url.clone()),
        None => {
            warn!("No storage.signing_secret configured, signed URLs will not survive a restart");
            UrlSigner::with_random_secret(config.public_base_url.clone())
        }
    });

    let blobs = Arc::new(LocalBlobStorage::new(&config.blob_dir, signer.clone()));
    blobs
        .init()
        .await
        .with_context(|| format!("Failed to create blob directory {:?}", config.blob_dir))?;

    let staging = StagingArea::new(&config.staging_dir, config.ingestion.max_archive_bytes as u64);
    staging
        .init()
        .await
        .with_context(|| format!("Failed to create staging directory {:?}", config.staging_dir))?;
    info!(
        "Storing blobs in {:?}, staging uploads in {:?}",
        config.blob_dir, config.staging_dir
    );

    let ingestion = Arc::new(IngestionOrchestrator::new(
        staging,
        blobs.clone(),
        catalog.clone(),
        config.ingestion_config(),
    ));

    let pruning_user_manager = user_manager.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TOKEN_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            match pruning_user_manager.prune_expired_tokens() {
                Ok(count) => {
                    if count > 0 {
                        info!("Pruned {} expired auth tokens", count);
                    }
                }
                Err(e) => {
                    error!("Failed to prune auth tokens: {}", e);
                }
            }
        }
    });

    let state = ServerState::new(
        config.server_config(),
        catalog,
        user_manager,
        ingestion,
        blobs,
        signer,
    );

    info!("Ready to serve at port {}!", config.port);
    run_server(state).await
}
