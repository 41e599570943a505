//! Gallery and site settings routes.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::state::{GuardedCatalog, ServerState};
use crate::catalog::{MediaItem, MediaKind, SiteSettings};

#[derive(Deserialize)]
struct AddMediaBody {
    #[serde(default)]
    url: String,
    title: Option<String>,
}

#[derive(Serialize)]
struct MediaResponse {
    success: bool,
    item: MediaItem,
}

#[derive(Serialize)]
struct SettingsResponse {
    success: bool,
    settings: SiteSettings,
}

fn list(catalog: &GuardedCatalog, kind: MediaKind) -> Response {
    match catalog.list_media(kind) {
        Ok(items) => Json(items).into_response(),
        Err(e) => e.into_response(),
    }
}

fn add(catalog: &GuardedCatalog, kind: MediaKind, body: AddMediaBody) -> Response {
    match catalog.add_media(kind, &body.url, body.title.as_deref()) {
        Ok(item) => Json(MediaResponse {
            success: true,
            item,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_photos(State(catalog): State<GuardedCatalog>) -> Response {
    list(&catalog, MediaKind::Photo)
}

async fn list_videos(State(catalog): State<GuardedCatalog>) -> Response {
    list(&catalog, MediaKind::Video)
}

async fn add_photo(
    _session: Session,
    State(catalog): State<GuardedCatalog>,
    Json(body): Json<AddMediaBody>,
) -> Response {
    add(&catalog, MediaKind::Photo, body)
}

async fn add_video(
    _session: Session,
    State(catalog): State<GuardedCatalog>,
    Json(body): Json<AddMediaBody>,
) -> Response {
    add(&catalog, MediaKind::Video, body)
}

async fn get_settings(State(catalog): State<GuardedCatalog>) -> Response {
    match catalog.get_settings() {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn save_settings(
    _session: Session,
    State(catalog): State<GuardedCatalog>,
    Json(settings): Json<SiteSettings>,
) -> Response {
    match catalog.save_settings(&settings) {
        Ok(()) => Json(SettingsResponse {
            success: true,
            settings,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn public_media_routes() -> Router<ServerState> {
    Router::new()
        .route("/photos", get(list_photos))
        .route("/videos", get(list_videos))
        .route("/settings", get(get_settings))
}

pub fn admin_media_routes() -> Router<ServerState> {
    Router::new()
        .route("/photos", post(add_photo))
        .route("/videos", post(add_video))
        .route("/settings", post(save_settings))
}
