//! Axum HTTP front end.
//!
//! Every `GET` path is taken as a path under the configured root and answered
//! with the JSON description of that entry.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::WalkError;
use crate::walker::TreeWalker;

/// Errors surfaced to HTTP clients
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request path escapes the root or is otherwise unusable
    #[error("Invalid path: {0}")]
    BadPath(String),

    /// The walk failed
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The blocking walk task panicked or was cancelled
    #[error("Walk task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadPath(_) => (StatusCode::BAD_REQUEST, "Invalid path"),
            ServerError::Walk(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "File not found"),
            ServerError::Walk(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Error reading file"),
            ServerError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Error generating JSON"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        if status.is_server_error() {
            error!("{}", self);
        }
        (status, message).into_response()
    }
}

/// Shared application state
pub struct AppState {
    pub root: PathBuf,
    pub walker: TreeWalker,
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>, walker: TreeWalker) -> Self {
        Self {
            root: root.into(),
            walker,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(describe_root))
        .route("/*path", get(describe_path))
        .with_state(state)
}

async fn describe_root(State(state): State<Arc<AppState>>) -> Result<Response, ServerError> {
    describe(state, String::new()).await
}

async fn describe_path(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    describe(state, path).await
}

async fn describe(state: Arc<AppState>, request_path: String) -> Result<Response, ServerError> {
    let target = resolve_request_path(&state.root, &request_path)
        .ok_or_else(|| ServerError::BadPath(request_path.clone()))?;

    let rendered = tokio::task::spawn_blocking(move || {
        state
            .walker
            .walk_with(&target, |record| serde_json::to_string_pretty(&record))
    })
    .await??;
    let body = rendered?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Join a request path onto `root`, refusing anything that could leave it
pub fn resolve_request_path(root: &FsPath, request_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in FsPath::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

/// Serve the configured root until Ctrl-C
pub async fn serve(config: &Config, walker: TreeWalker) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let root = std::fs::canonicalize(&config.root)?;
    info!(root = %root.display(), "serving directory");

    let router = build_router(Arc::new(AppState::new(root, walker)));
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down gracefully");
}
