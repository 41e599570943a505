use crate::archive::ReorderError;
use crate::catalog::CatalogError;
use crate::ingestion::{IngestionError, StagingError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn not_found(what: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("{} not found", what))
}

impl IntoResponse for IngestionError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IngestionError::Staging(StagingError::ArchiveTooLarge(_, _)) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            IngestionError::Archive(_)
            | IngestionError::Staging(_)
            | IngestionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Ingestion failed: {}", self);
        }
        error_response(status, self.to_string())
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        match self {
            CatalogError::InvalidInput(_) | CatalogError::Reorder(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CatalogError::Store(e) => {
                error!("Catalog store failure: {:#}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ReorderError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}
