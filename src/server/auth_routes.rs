use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use tracing::{debug, error};

use super::error::error_response;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::{GuardedUserManager, ServerState};
use crate::user::{AuthError, TokenPair};

#[derive(Deserialize, Debug)]
struct LoginBody {
    #[serde(alias = "email")]
    pub user_handle: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct RefreshBody {
    pub refresh_token: String,
}

fn session_cookie(value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn token_response(pair: TokenPair) -> Response {
    let cookie = session_cookie(
        pair.access_token.clone(),
        time::Duration::seconds(pair.expires_in as i64),
    );
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(pair),
    )
        .into_response()
}

fn auth_failure(e: AuthError) -> Response {
    match e {
        AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
            error_response(StatusCode::UNAUTHORIZED, e.to_string())
        }
        AuthError::Store(e) => {
            error!("Auth store failure: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.user_handle);
    match user_manager.login(&body.user_handle, &body.password) {
        Ok(pair) => token_response(pair),
        Err(e) => auth_failure(e),
    }
}

async fn refresh(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<RefreshBody>,
) -> Response {
    match user_manager.refresh(&body.refresh_token) {
        Ok(pair) => token_response(pair),
        Err(e) => auth_failure(e),
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.logout(&session.token) {
        Ok(_) => {
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
                .same_site(SameSite::Lax)
                .build();
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie.to_string())],
            )
                .into_response()
        }
        Err(e) => auth_failure(e),
    }
}

pub fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", get(logout))
}
