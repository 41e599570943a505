//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all catalog-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for public routes and for testing authentication flows.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the admin user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/login"))
            .json(&json!({
                "user_handle": handle,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /v1/auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .expect("Refresh request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(self.url("/v1/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Public Catalog Endpoints
    // ========================================================================

    /// GET /v1/cds
    pub async fn list_cds(&self) -> Response {
        self.client
            .get(self.url("/v1/cds"))
            .send()
            .await
            .expect("List CDs request failed")
    }

    /// GET /v1/cds/{id}
    pub async fn get_cd(&self, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/cds/{}", id)))
            .send()
            .await
            .expect("Get CD request failed")
    }

    /// POST /v1/cds/{id}/play
    pub async fn increment_play(&self, id: &str) -> Response {
        self.client
            .post(self.url(&format!("/v1/cds/{}/play", id)))
            .send()
            .await
            .expect("Play request failed")
    }

    /// POST /v1/cds/{id}/download
    pub async fn increment_download(&self, id: &str) -> Response {
        self.client
            .post(self.url(&format!("/v1/cds/{}/download", id)))
            .send()
            .await
            .expect("Download request failed")
    }

    /// GET /v1/photos
    pub async fn list_photos(&self) -> Response {
        self.client
            .get(self.url("/v1/photos"))
            .send()
            .await
            .expect("List photos request failed")
    }

    /// GET /v1/videos
    pub async fn list_videos(&self) -> Response {
        self.client
            .get(self.url("/v1/videos"))
            .send()
            .await
            .expect("List videos request failed")
    }

    /// GET /v1/settings
    pub async fn get_settings(&self) -> Response {
        self.client
            .get(self.url("/v1/settings"))
            .send()
            .await
            .expect("Get settings request failed")
    }

    /// GET on an absolute URL, e.g. a signed blob URL
    pub async fn get_absolute(&self, url: &str) -> Response {
        self.client
            .get(url)
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Admin Endpoints
    // ========================================================================

    /// POST /v1/admin/cds
    pub async fn admin_create_cd(&self, body: serde_json::Value) -> Response {
        self.client
            .post(self.url("/v1/admin/cds"))
            .json(&body)
            .send()
            .await
            .expect("Create CD request failed")
    }

    /// POST /v1/admin/cds/zip
    pub async fn admin_upload_zip(
        &self,
        archive: Vec<u8>,
        fields: &[(&str, &str)],
    ) -> Response {
        self.client
            .post(self.url("/v1/admin/cds/zip"))
            .multipart(archive_form(archive, fields))
            .send()
            .await
            .expect("Zip upload request failed")
    }

    /// POST /v1/admin/cds/zip with the standard metadata fields
    pub async fn admin_upload_album(&self, archive: Vec<u8>) -> Response {
        self.admin_upload_zip(
            archive,
            &[("title", CD_TITLE), ("artist", CD_ARTIST), ("genre", CD_GENRE)],
        )
        .await
    }

    /// PUT /v1/admin/cds/{id}/order
    pub async fn admin_reorder_cd(&self, id: &str, track_order: Vec<usize>) -> Response {
        self.client
            .put(self.url(&format!("/v1/admin/cds/{}/order", id)))
            .json(&json!({ "trackOrder": track_order }))
            .send()
            .await
            .expect("Reorder request failed")
    }

    /// POST /v1/admin/photos
    pub async fn admin_add_photo(&self, url: &str, title: Option<&str>) -> Response {
        self.client
            .post(self.url("/v1/admin/photos"))
            .json(&json!({ "url": url, "title": title }))
            .send()
            .await
            .expect("Add photo request failed")
    }

    /// POST /v1/admin/videos
    pub async fn admin_add_video(&self, url: &str, title: Option<&str>) -> Response {
        self.client
            .post(self.url("/v1/admin/videos"))
            .json(&json!({ "url": url, "title": title }))
            .send()
            .await
            .expect("Add video request failed")
    }

    /// POST /v1/admin/settings
    pub async fn admin_save_settings(&self, body: serde_json::Value) -> Response {
        self.client
            .post(self.url("/v1/admin/settings"))
            .json(&body)
            .send()
            .await
            .expect("Save settings request failed")
    }

    // ========================================================================
    // Preview Endpoints
    // ========================================================================

    /// POST /v1/admin/preview
    pub async fn admin_create_preview(&self, archive: Vec<u8>) -> Response {
        self.client
            .post(self.url("/v1/admin/preview"))
            .multipart(archive_form(archive, &[]))
            .send()
            .await
            .expect("Create preview request failed")
    }

    /// GET /v1/admin/preview
    pub async fn admin_get_preview(&self) -> Response {
        self.client
            .get(self.url("/v1/admin/preview"))
            .send()
            .await
            .expect("Get preview request failed")
    }

    /// GET /v1/admin/preview/cover
    pub async fn admin_get_preview_cover(&self) -> Response {
        self.client
            .get(self.url("/v1/admin/preview/cover"))
            .send()
            .await
            .expect("Get preview cover request failed")
    }

    /// PUT /v1/admin/preview/order
    pub async fn admin_move_preview_song(&self, from: usize, to: usize) -> Response {
        self.client
            .put(self.url("/v1/admin/preview/order"))
            .json(&json!({ "from": from, "to": to }))
            .send()
            .await
            .expect("Move song request failed")
    }

    /// DELETE /v1/admin/preview
    pub async fn admin_delete_preview(&self) -> Response {
        self.client
            .delete(self.url("/v1/admin/preview"))
            .send()
            .await
            .expect("Delete preview request failed")
    }

    /// POST /v1/admin/preview/commit
    pub async fn admin_commit_preview(&self) -> Response {
        self.client
            .post(self.url("/v1/admin/preview/commit"))
            .json(&json!({
                "title": CD_TITLE,
                "artist": CD_ARTIST,
                "genre": CD_GENRE,
            }))
            .send()
            .await
            .expect("Commit preview request failed")
    }
}

fn archive_form(archive: Vec<u8>, fields: &[(&str, &str)]) -> Form {
    let part = Part::bytes(archive)
        .file_name("album.zip")
        .mime_str("application/zip")
        .expect("Invalid mime type");
    fields
        .iter()
        .fold(Form::new(), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        })
        .part("zipFile", part)
}
