use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use super::AppState;

const PNG: &str = "image/png";

fn reject(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}

/// Stores a multipart `file` field and answers with a shareable link.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(target: "uploads", error = %err, "malformed multipart body");
                return reject(StatusCode::BAD_REQUEST, "malformed multipart body");
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        if field.content_type() != Some(PNG) {
            return reject(StatusCode::BAD_REQUEST, "file must be image/png");
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                warn!(target: "uploads", error = %err, "failed to read upload");
                return reject(StatusCode::BAD_REQUEST, "malformed multipart body");
            }
        };

        return match state.uploads.persist(&data).await {
            Ok(name) => {
                let link = format!("{}{}/{}", state.public_host, state.upload_prefix, name);
                Json(json!({ "link": link })).into_response()
            }
            Err(err) => super::ApiError::from(err).into_response(),
        };
    }

    reject(StatusCode::BAD_REQUEST, "file is missing")
}

/// Serves one stored picture picked at random.
pub async fn random(State(state): State<AppState>) -> Response {
    match state.uploads.random().await {
        Ok(Some((_, data))) => ([(CONTENT_TYPE, PNG)], data).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => super::ApiError::from(err).into_response(),
    }
}

pub async fn download(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.uploads.read(&name).await {
        Ok(Some(data)) => ([(CONTENT_TYPE, PNG)], data).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => super::ApiError::from(err).into_response(),
    }
}
