//! CD catalog server library
//!
//! Exposes the internal modules for the binaries and the end-to-end tests.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod ingestion;
pub mod server;
pub mod sqlite_persistence;
pub mod storage;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog::CatalogService;
pub use ingestion::IngestionOrchestrator;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerState};
pub use user::{SqliteUserStore, UserManager};
