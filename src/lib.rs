pub mod adapters;
mod app;
mod assets;
pub mod auth;
pub mod booking;
pub mod config;
pub mod credentials;
pub mod guard;
pub mod history;
pub mod ports;
pub mod session;
mod state;
mod templates;

pub use app::{StartupError, app};

use tracing::info;

pub async fn serve(config: config::AppConfig) -> Result<(), StartupError> {
    let addr = config.addr;
    let router = app(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    info!("listening on http://{addr}");
    axum::serve(listener, router)
        .await
        .map_err(StartupError::Serve)
}
