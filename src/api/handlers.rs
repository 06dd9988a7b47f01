use axum::{Json, extract::State};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ApiResult, AppState};
use crate::{
    character::{Age, Gender},
    diffusion::Progress,
    errors::BoothError,
    orchestrator::Generation,
};

#[derive(Debug, Serialize)]
pub struct PresetSummary<'a> {
    key: &'a str,
    label: &'a str,
    icon: &'a str,
}

pub async fn list_presets(State(state): State<AppState>) -> Json<Value> {
    let presets: Vec<_> = state
        .booth
        .presets()
        .iter()
        .map(|preset| PresetSummary {
            key: &preset.key,
            label: &preset.label,
            icon: &preset.icon,
        })
        .collect();
    Json(json!(presets))
}

pub async fn list_characters(State(state): State<AppState>) -> Json<Value> {
    let composers: Vec<_> = state.booth.characters().names().collect();
    Json(json!({
        "genders": Gender::ALL.map(Gender::as_str),
        "ages": Age::ALL.map(Age::as_str),
        "composers": composers,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    composer: String,
    gender: String,
    age: String,
}

pub async fn compose(
    State(state): State<AppState>,
    Json(request): Json<ComposeRequest>,
) -> ApiResult<Json<Value>> {
    let gender: Gender = request.gender.parse()?;
    let age: Age = request.age.parse()?;
    let phrase = state
        .booth
        .characters()
        .compose(&request.composer, gender, age)?;
    Ok(Json(json!({ "phrase": phrase })))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    preset: String,
    image: String,
    gender: String,
    age: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<Generation>> {
    let gender: Gender = request.gender.parse()?;
    let age: Age = request.age.parse()?;
    let image = normalize_image(&request.image)?;

    let generation = state
        .booth
        .generate(&request.preset, &image, gender, age)
        .await?;
    Ok(Json(generation))
}

pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.booth.client().models().await?))
}

#[derive(Debug, Serialize)]
pub struct ProgressReport {
    #[serde(flatten)]
    progress: Progress,
    eta_seconds: f64,
}

pub async fn progress(State(state): State<AppState>) -> ApiResult<Json<ProgressReport>> {
    let progress = state.booth.client().progress().await?;
    let eta_seconds = progress.eta().as_secs_f64();
    Ok(Json(ProgressReport {
        progress,
        eta_seconds,
    }))
}

/// Accepts a bare base64 payload or a `data:image/...;base64,` URI as
/// produced by a canvas, and returns the payload.
pub fn normalize_image(image: &str) -> Result<String, BoothError> {
    let trimmed = image.trim();
    let payload = if trimmed.starts_with("data:") {
        trimmed
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| BoothError::invalid("image data URI is not base64"))?
    } else {
        trimmed
    };

    if payload.is_empty() {
        return Err(BoothError::invalid("image is empty"));
    }
    BASE64_STANDARD
        .decode(payload)
        .map_err(|err| BoothError::invalid(format!("image is not valid base64: {err}")))?;

    Ok(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{app, call, spawn_stub};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::{get as get_route, post},
    };

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn strips_data_uri_prefix() {
        assert_eq!(normalize_image("Zm9v").unwrap(), "Zm9v");
        assert_eq!(
            normalize_image("data:image/jpeg;base64,Zm9v").unwrap(),
            "Zm9v"
        );
        assert!(normalize_image("").is_err());
        assert!(normalize_image("data:image/png,raw").is_err());
        assert!(normalize_image("not base64 at all!").is_err());
    }

    #[tokio::test]
    async fn lists_presets_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = app("http://127.0.0.1:9", dir.path()).await;

        let (response, body) = call(app, get("/api/presets")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let presets = body.as_array().unwrap();
        assert_eq!(presets.len(), 16);
        assert_eq!(presets[0]["key"], "free");
        assert_eq!(presets[0]["icon"], "/icons/free.png");
    }

    #[tokio::test]
    async fn lists_characters() {
        let dir = tempfile::tempdir().unwrap();
        let app = app("http://127.0.0.1:9", dir.path()).await;

        let (_, body) = call(app, get("/api/characters")).await;
        assert_eq!(body["genders"], json!(["Female", "Person", "Male"]));
        assert_eq!(body["ages"], json!(["Young", "Middle", "Old"]));
        assert!(
            body["composers"]
                .as_array()
                .unwrap()
                .contains(&json!("randomhero"))
        );
    }

    #[tokio::test]
    async fn composes_a_phrase_and_rejects_unknown_values() {
        let dir = tempfile::tempdir().unwrap();
        let app = app("http://127.0.0.1:9", dir.path()).await;

        let (response, body) = call(
            app.clone(),
            post_json(
                "/api/compose",
                json!({ "composer": "persons", "gender": "Female", "age": "Young" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["phrase"], "young girl");

        let (response, body) = call(
            app,
            post_json(
                "/api/compose",
                json!({ "composer": "persons", "gender": "Robot", "age": "Young" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("gender"));
    }

    #[tokio::test]
    async fn generates_through_the_image_service() {
        let stub = Router::new().route(
            "/sdapi/v1/img2img",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["init_images"], json!(["Zm9v"]));
                assert_eq!(
                    body["override_settings"]["sd_model_checkpoint"],
                    "absolutereality181.n8IR.safetensors"
                );
                Json(json!({ "images": ["YmFy"] }))
            }),
        );
        let addr = spawn_stub(stub).await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&format!("http://{addr}"), dir.path()).await;

        let (response, body) = call(
            app,
            post_json(
                "/api/generate",
                json!({
                    "preset": "marble",
                    "image": "data:image/png;base64,Zm9v",
                    "gender": "Male",
                    "age": "Old",
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["preset"], "marble");
        assert_eq!(body["images"], json!(["data:image/png;base64,YmFy"]));
        assert!(body["prompt"].as_str().unwrap().contains("bust of a old man"));
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn maps_errors_to_status_codes() {
        let stub = Router::new().route(
            "/sdapi/v1/img2img",
            post(|| async { Json(json!({ "detail": "no images" })) }),
        );
        let addr = spawn_stub(stub).await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&format!("http://{addr}"), dir.path()).await;

        let request = |preset: &str| {
            post_json(
                "/api/generate",
                json!({ "preset": preset, "image": "Zm9v", "gender": "Person", "age": "Middle" }),
            )
        };

        let (response, _) = call(app.clone(), request("unknown")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (response, body) = call(app, request("pencil")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("malformed"));
    }

    #[tokio::test]
    async fn progress_reports_a_bounded_eta() {
        let stub = Router::new().route(
            "/sdapi/v1/progress",
            get_route(|| async { Json(json!({ "progress": 0.4, "eta_relative": 1e30 })) }),
        );
        let addr = spawn_stub(stub).await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&format!("http://{addr}"), dir.path()).await;

        let (response, body) = call(app, get("/api/progress")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!((body["progress"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(body["eta_seconds"], json!(0.0));
    }
}
