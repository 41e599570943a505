//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, album_archive};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_upload_album() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated_admin(server.base_url.clone()).await;
//!
//!     let response = client.admin_upload_album(album_archive()).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;

#[allow(unused_imports)]
pub use fixtures::{album_archive, build_archive};
