//! CD routes: public catalog reads and counters, admin creation and ingestion.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::archive_form::{ArchiveForm, FORM_OVERHEAD_BYTES};
use super::error::not_found;
use super::session::Session;
use super::state::{GuardedCatalog, GuardedIngestion, ServerState};
use crate::catalog::{Cd, Counter, NewCd};
use crate::ingestion::{IngestionRequest, IngestionWarning};

#[derive(Serialize)]
struct CdResponse {
    success: bool,
    cd: Cd,
}

#[derive(Serialize)]
struct IngestionResponse {
    success: bool,
    cd: Cd,
    warnings: Vec<IngestionWarning>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayCountResponse {
    play_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadCountResponse {
    download_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody {
    track_order: Vec<usize>,
}

async fn list_cds(State(catalog): State<GuardedCatalog>) -> Response {
    match catalog.list_cds() {
        Ok(cds) => Json(cds).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_cd(State(catalog): State<GuardedCatalog>, Path(id): Path<String>) -> Response {
    match catalog.get_cd(&id) {
        Ok(Some(cd)) => Json(cd).into_response(),
        Ok(None) => not_found("CD"),
        Err(e) => e.into_response(),
    }
}

async fn increment_play(State(catalog): State<GuardedCatalog>, Path(id): Path<String>) -> Response {
    match catalog.increment(&id, Counter::Play) {
        Ok(Some(play_count)) => Json(PlayCountResponse { play_count }).into_response(),
        Ok(None) => not_found("CD"),
        Err(e) => e.into_response(),
    }
}

async fn increment_download(
    State(catalog): State<GuardedCatalog>,
    Path(id): Path<String>,
) -> Response {
    match catalog.increment(&id, Counter::Download) {
        Ok(Some(download_count)) => Json(DownloadCountResponse { download_count }).into_response(),
        Ok(None) => not_found("CD"),
        Err(e) => e.into_response(),
    }
}

async fn create_cd(
    session: Session,
    State(catalog): State<GuardedCatalog>,
    Json(body): Json<NewCd>,
) -> Response {
    match catalog.create_cd(body) {
        Ok(cd) => {
            info!("{} created CD {}", session.identity.handle, cd.id);
            Json(CdResponse { success: true, cd }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn upload_zip(
    session: Session,
    State(ingestion): State<GuardedIngestion>,
    multipart: Multipart,
) -> Response {
    let mut form = match ArchiveForm::read(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let (archive_name, archive) = match form.take_archive() {
        Ok(archive) => archive,
        Err(response) => return response,
    };

    let request = IngestionRequest {
        archive,
        archive_name,
        metadata: form.metadata,
        track_order: form.track_order,
    };
    match ingestion.ingest(&session.identity, request).await {
        Ok(outcome) => Json(IngestionResponse {
            success: true,
            cd: outcome.cd,
            warnings: outcome.warnings,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn reorder_cd(
    _session: Session,
    State(catalog): State<GuardedCatalog>,
    Path(id): Path<String>,
    Json(body): Json<ReorderBody>,
) -> Response {
    match catalog.reorder_cd(&id, &body.track_order) {
        Ok(Some(cd)) => Json(CdResponse { success: true, cd }).into_response(),
        Ok(None) => not_found("CD"),
        Err(e) => e.into_response(),
    }
}

pub fn public_cd_routes() -> Router<ServerState> {
    Router::new()
        .route("/cds", get(list_cds))
        .route("/cds/{id}", get(get_cd))
        .route("/cds/{id}/play", post(increment_play))
        .route("/cds/{id}/download", post(increment_download))
}

pub fn admin_cd_routes(max_archive_bytes: usize) -> Router<ServerState> {
    let upload_route = Router::new()
        .route("/cds/zip", post(upload_zip))
        .layer(DefaultBodyLimit::max(
            max_archive_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ));

    Router::new()
        .merge(upload_route)
        .route("/cds", post(create_cd))
        .route("/cds/{id}/order", put(reorder_cd))
}
