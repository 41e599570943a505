use super::error::ErrorResponse;
use super::state::ServerState;
use crate::user::Identity;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error};

/// An authenticated caller, extracted from a bearer token or the session cookie.
#[derive(Debug)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug)]
pub enum SessionExtractionError {
    Unauthorized,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SessionExtractionError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            SessionExtractionError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?.to_str().ok()?.trim();
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_session_token_from_headers(parts)
            .or_else(|| extract_session_token_from_cookies(parts))
        else {
            debug!("No token in headers nor cookies.");
            return Err(SessionExtractionError::Unauthorized);
        };

        match ctx.identity.verify(&token) {
            Ok(Some(identity)) => Ok(Session { identity, token }),
            Ok(None) => {
                debug!("Unknown or expired token");
                Err(SessionExtractionError::Unauthorized)
            }
            Err(e) => {
                error!("Failed to verify token: {}", e);
                Err(SessionExtractionError::InternalError)
            }
        }
    }
}
