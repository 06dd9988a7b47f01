mod handlers;
mod uploads;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::{
    config::UploadConfig,
    errors::{BoothError, Result},
    orchestrator::Booth,
    util::UploadStore,
};

/// Reference photos arrive base64-encoded inside JSON.
const BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    booth: Booth,
    uploads: Arc<UploadStore>,
    upload_prefix: String,
    public_host: String,
}

impl AppState {
    pub fn new(booth: Booth, uploads: Arc<UploadStore>, config: &UploadConfig) -> Self {
        Self {
            booth,
            uploads,
            upload_prefix: config.prefix.clone(),
            public_host: config.public_host.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let upload_route = state.upload_prefix.clone();
    let random_route = format!("{}/random.png", state.upload_prefix);
    let download_route = format!("{}/{{name}}", state.upload_prefix);

    Router::new()
        .route("/api/presets", get(handlers::list_presets))
        .route("/api/characters", get(handlers::list_characters))
        .route("/api/compose", post(handlers::compose))
        .route("/api/generate", post(handlers::generate))
        .route("/api/models", get(handlers::list_models))
        .route("/api/progress", get(handlers::progress))
        .route(&upload_route, post(uploads::upload))
        .route(&random_route, get(uploads::random))
        .route(&download_route, get(uploads::download))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "api", %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!(target: "api", "shutdown signal received");
        })
        .await
        .map_err(|err| BoothError::other(format!("HTTP server error: {err}")))?;

    Ok(())
}

/// Maps [`BoothError`] onto a status code and `{"error": ...}` body.
pub struct ApiError(BoothError);

impl From<BoothError> for ApiError {
    fn from(value: BoothError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            BoothError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            BoothError::UnknownPreset(_) => StatusCode::NOT_FOUND,
            BoothError::Transport(_)
            | BoothError::Reqwest(_)
            | BoothError::Decode(_)
            | BoothError::SerdeJson(_) => StatusCode::BAD_GATEWAY,
            BoothError::Io(_) | BoothError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "api", error = %self.0, %status, "request failed");
        } else {
            warn!(target: "api", error = %self.0, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
