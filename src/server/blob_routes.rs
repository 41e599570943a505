//! Serves blobs behind signed URLs.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use super::error::{error_response, not_found};
use super::state::ServerState;
use crate::archive::content_type_for;
use crate::storage::BlobError;

#[derive(Deserialize, Debug)]
struct SignatureQuery {
    expires: Option<i64>,
    signature: Option<String>,
}

async fn get_blob(
    State(state): State<ServerState>,
    Path(path): Path<String>,
    Query(query): Query<SignatureQuery>,
) -> Response {
    let (Some(expires), Some(signature)) = (query.expires, query.signature) else {
        return error_response(StatusCode::FORBIDDEN, "Missing signature");
    };
    if !state
        .signer
        .verify(&path, expires, &signature, chrono::Utc::now().timestamp())
    {
        debug!("Rejected signature for blob {}", path);
        return error_response(StatusCode::FORBIDDEN, "Invalid or expired signature");
    }

    match state.blobs.download(&path).await {
        Ok(Some(bytes)) => {
            let content_type = content_type_for(&path, &bytes);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) | Err(BlobError::NotFound(_)) => not_found("Blob"),
        Err(BlobError::InvalidPath(_)) => error_response(StatusCode::BAD_REQUEST, "Invalid path"),
        Err(e) => {
            error!("Failed to read blob {}: {}", path, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn blob_routes() -> Router<ServerState> {
    Router::new().route("/{*path}", get(get_blob))
}
