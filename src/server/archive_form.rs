//! Multipart form shared by the archive upload routes.

use super::error::error_response;
use crate::catalog::CdMetadata;
use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    response::Response,
};
use tracing::warn;

pub const ARCHIVE_FIELD: &str = "zipFile";
pub const TRACK_ORDER_FIELD: &str = "trackOrder";

/// Room for the text fields and multipart framing around the archive.
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct ArchiveForm {
    pub archive: Option<(String, Vec<u8>)>,
    pub metadata: CdMetadata,
    pub track_order: Option<Vec<usize>>,
}

fn multipart_failure(e: MultipartError) -> Response {
    warn!("Failed to read multipart form: {}", e);
    error_response(e.status(), e.body_text())
}

impl ArchiveForm {
    pub async fn read(mut multipart: Multipart) -> Result<ArchiveForm, Response> {
        let mut form = ArchiveForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
            let field_name = field.name().unwrap_or("").to_string();
            match field_name.as_str() {
                ARCHIVE_FIELD => {
                    let file_name = field.file_name().unwrap_or("upload.zip").to_string();
                    let bytes = field.bytes().await.map_err(multipart_failure)?;
                    form.archive = Some((file_name, bytes.to_vec()));
                }
                "title" | "artist" | "genre" | TRACK_ORDER_FIELD => {
                    let value = field.text().await.map_err(multipart_failure)?;
                    match field_name.as_str() {
                        "title" => form.metadata.title = value,
                        "artist" => form.metadata.artist = value,
                        "genre" => form.metadata.genre = value,
                        _ => form.track_order = Some(parse_track_order(&value)?),
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// The uploaded archive, or a 400 response if none was sent.
    pub fn take_archive(&mut self) -> Result<(String, Vec<u8>), Response> {
        match self.archive.take() {
            Some((name, bytes)) if !bytes.is_empty() => Ok((name, bytes)),
            _ => Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Missing {}", ARCHIVE_FIELD),
            )),
        }
    }
}

fn parse_track_order(value: &str) -> Result<Vec<usize>, Response> {
    serde_json::from_str(value).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid {}: {}", TRACK_ORDER_FIELD, e),
        )
    })
}
