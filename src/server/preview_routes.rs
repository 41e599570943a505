//! Archive preview routes: upload, inspect, reorder, commit.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::archive_form::{ArchiveForm, FORM_OVERHEAD_BYTES};
use super::error::{error_response, not_found};
use super::session::Session;
use super::state::{GuardedIngestion, GuardedPreviews, ServerState};
use crate::catalog::{Cd, CdMetadata};
use crate::ingestion::IngestionWarning;

#[derive(Deserialize, Debug)]
struct MoveSongBody {
    from: usize,
    to: usize,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
struct CommitResponse {
    success: bool,
    cd: Cd,
    warnings: Vec<IngestionWarning>,
}

async fn create_preview(
    session: Session,
    State(ingestion): State<GuardedIngestion>,
    State(previews): State<GuardedPreviews>,
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

    match ingestion
        .preview(&session.identity, &archive_name, &archive)
        .await
    {
        Ok(preview) => Json(previews.insert(session.identity.user_id, preview)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_preview(session: Session, State(previews): State<GuardedPreviews>) -> Response {
    match previews.summary(session.identity.user_id) {
        Some(summary) => Json(summary).into_response(),
        None => not_found("Preview"),
    }
}

async fn delete_preview(session: Session, State(previews): State<GuardedPreviews>) -> Response {
    if previews.remove(session.identity.user_id) {
        Json(SuccessResponse { success: true }).into_response()
    } else {
        not_found("Preview")
    }
}

async fn get_preview_cover(session: Session, State(previews): State<GuardedPreviews>) -> Response {
    let Some((path, content_type)) = previews.cover_file(session.identity.user_id) else {
        return not_found("Cover");
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => not_found("Cover"),
        Err(e) => {
            error!("Failed to read staged cover {:?}: {}", path, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn move_song(
    session: Session,
    State(previews): State<GuardedPreviews>,
    Json(body): Json<MoveSongBody>,
) -> Response {
    match previews.move_song(session.identity.user_id, body.from, body.to) {
        Some(Ok(summary)) => Json(summary).into_response(),
        Some(Err(e)) => e.into_response(),
        None => not_found("Preview"),
    }
}

async fn commit_preview(
    session: Session,
    State(ingestion): State<GuardedIngestion>,
    State(previews): State<GuardedPreviews>,
    Json(metadata): Json<CdMetadata>,
) -> Response {
    let missing = metadata.missing_fields();
    if !missing.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing fields: {}", missing.join(", ")),
        );
    }
    let Some(preview) = previews.take(session.identity.user_id) else {
        return not_found("Preview");
    };

    match ingestion
        .commit_preview(&session.identity, preview, metadata)
        .await
    {
        Ok(outcome) => {
            info!("{} committed preview as {}", session.identity.handle, outcome.cd.id);
            Json(CommitResponse {
                success: true,
                cd: outcome.cd,
                warnings: outcome.warnings,
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub fn preview_routes(max_archive_bytes: usize) -> Router<ServerState> {
    Router::new()
        .route(
            "/preview",
            post(create_preview)
                .get(get_preview)
                .delete(delete_preview)
                .layer(DefaultBodyLimit::max(
                    max_archive_bytes.saturating_add(FORM_OVERHEAD_BYTES),
                )),
        )
        .route("/preview/cover", get(get_preview_cover))
        .route("/preview/order", put(move_song))
        .route("/preview/commit", post(commit_preview))
}
