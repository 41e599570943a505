mod archive_form;
mod auth_routes;
mod blob_routes;
mod cd_routes;
pub mod config;
mod error;
mod http_layers;
mod media_routes;
mod preview_routes;
pub mod server;
pub(self) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::ServerState;
