use crate::adapters::{InMemoryHistory, StoreCredentialCheck, StubSubmitter, TokioTimeProvider};
use crate::assets;
use crate::auth as auth_service;
use crate::config;
use crate::credentials::{CredentialError, CredentialStore};
use crate::history as history_service;
use crate::session::LoginService;
use crate::state;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use thiserror::Error;
use tracing::{info, warn};

use std::path::PathBuf;

mod auth;
mod booking;
mod history;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid auth configuration: {0}")]
    Auth(#[from] auth_service::AuthError),
    #[error("failed to load users file {}: {source}", path.display())]
    Users {
        path: PathBuf,
        source: CredentialError,
    },
    #[error("failed to load history file {}: {source}", path.display())]
    History {
        path: PathBuf,
        source: history_service::HistoryError,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

pub fn app(config: config::AppConfig) -> Result<Router, StartupError> {
    Ok(router(build_state(config)?))
}

fn build_state(config: config::AppConfig) -> Result<state::AppState, StartupError> {
    let cookies = auth_service::SessionCookies::from_config(&config)?;

    let store = match &config.users_file {
        Some(path) => {
            let store = CredentialStore::load(path).map_err(|source| StartupError::Users {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), users = store.len(), "loaded users file");
            store
        }
        None => {
            warn!("no users file configured; using the built-in demo accounts");
            CredentialStore::builtin()
        }
    };

    let records = match &config.history_file {
        Some(path) => history_service::load_records(path).map_err(|source| {
            StartupError::History {
                path: path.clone(),
                source,
            }
        })?,
        None => history_service::sample_records(),
    };

    let time = TokioTimeProvider;
    let checker = StoreCredentialCheck::new(store, time, config.login.latency);
    Ok(state::AppState {
        login: LoginService::new(checker, time, config.login.timeout),
        submitter: StubSubmitter::new(time),
        history: InMemoryHistory::new(records),
        sessions: state::SessionRegistry::default(),
        cookies,
        config,
    })
}

fn router(state: state::AppState) -> Router {
    Router::new()
        .route("/", get(booking::home))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", post(auth::logout))
        .route(
            "/booking",
            get(booking::booking_view).post(booking::booking_update),
        )
        .route("/booking/edit", post(booking::booking_edit))
        .route("/booking/confirm", post(booking::booking_confirm))
        .route("/history", get(history::history_view))
        .route("/history/{id}/cancel", post(history::history_cancel))
        .route("/api/bookings", get(history::api_bookings))
        .route("/static/style.css", get(assets::stylesheet))
        .route("/health", get(health))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, auth::session_guard))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
