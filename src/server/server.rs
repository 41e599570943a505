use anyhow::Result;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;

use super::auth_routes::auth_routes;
use super::blob_routes::blob_routes;
use super::cd_routes::{admin_cd_routes, public_cd_routes};
use super::media_routes::{admin_media_routes, public_media_routes};
use super::preview_routes::preview_routes;
use super::{log_requests, state::ServerState};
use crate::storage::BLOB_ROUTE_PREFIX;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Response {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
    .into_response()
}

pub fn make_app(state: ServerState) -> Router {
    let max_archive_bytes = state.config.max_archive_bytes;

    let public_routes: Router<ServerState> = Router::new()
        .merge(public_cd_routes())
        .merge(public_media_routes());

    let admin_routes: Router<ServerState> = Router::new()
        .merge(admin_cd_routes(max_archive_bytes))
        .merge(admin_media_routes())
        .merge(preview_routes(max_archive_bytes));

    let home_router: Router<ServerState> = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    home_router
        .nest("/v1/auth", auth_routes())
        .nest("/v1/admin", admin_routes)
        .nest(BLOB_ROUTE_PREFIX, blob_routes())
        .nest("/v1", public_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
