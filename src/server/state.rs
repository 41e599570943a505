use axum::extract::FromRef;

use crate::catalog::CatalogService;
use crate::ingestion::{IngestionOrchestrator, PreviewRegistry};
use crate::storage::{BlobStorage, UrlSigner};
use crate::user::{IdentityService, UserManager};
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalog = Arc<CatalogService>;
pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedIdentityService = Arc<dyn IdentityService>;
pub type GuardedIngestion = Arc<IngestionOrchestrator>;
pub type GuardedPreviews = Arc<PreviewRegistry>;
pub type GuardedBlobStorage = Arc<dyn BlobStorage>;
pub type GuardedUrlSigner = Arc<UrlSigner>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub catalog: GuardedCatalog,
    pub user_manager: GuardedUserManager,
    pub identity: GuardedIdentityService,
    pub ingestion: GuardedIngestion,
    pub previews: GuardedPreviews,
    pub blobs: GuardedBlobStorage,
    pub signer: GuardedUrlSigner,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog: GuardedCatalog,
        user_manager: GuardedUserManager,
        ingestion: GuardedIngestion,
        blobs: GuardedBlobStorage,
        signer: GuardedUrlSigner,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            catalog,
            identity: user_manager.clone(),
            user_manager,
            ingestion,
            previews: Arc::new(PreviewRegistry::new()),
            blobs,
            signer,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalog {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedIdentityService {
    fn from_ref(input: &ServerState) -> Self {
        input.identity.clone()
    }
}

impl FromRef<ServerState> for GuardedIngestion {
    fn from_ref(input: &ServerState) -> Self {
        input.ingestion.clone()
    }
}

impl FromRef<ServerState> for GuardedPreviews {
    fn from_ref(input: &ServerState) -> Self {
        input.previews.clone()
    }
}

impl FromRef<ServerState> for GuardedBlobStorage {
    fn from_ref(input: &ServerState) -> Self {
        input.blobs.clone()
    }
}

impl FromRef<ServerState> for GuardedUrlSigner {
    fn from_ref(input: &ServerState) -> Self {
        input.signer.clone()
    }
}
