use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{DataUri, DiffusionOptions, build_request, decode_images};
use crate::{
    config::DiffusionConfig,
    errors::{BoothError, Result},
};

const IMG2IMG_PATH: &str = "sdapi/v1/img2img";
const MODELS_PATH: &str = "sdapi/v1/sd-models";
const PROGRESS_PATH: &str = "sdapi/v1/progress";
const ERROR_BODY_LIMIT: usize = 800;

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Client for a Stable Diffusion web UI instance.
#[derive(Clone)]
pub struct DiffusionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DiffusionClient {
    pub fn from_config(config: &DiffusionConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("stylebooth/0.1");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Self::with_client(http, config.base_url.as_str())
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|err| BoothError::invalid(format!("diffusion base url {base_url:?}: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| BoothError::other(format!("endpoint {path}: {err}")))
    }

    /// Runs one img2img generation and returns the pictures as data URIs.
    pub async fn send(&self, options: &DiffusionOptions) -> Result<Vec<DataUri>> {
        if options.image.trim().is_empty() {
            return Err(BoothError::invalid("init image is empty"));
        }

        let body = build_request(options);
        let url = self.endpoint(IMG2IMG_PATH)?;
        debug!(
            target: "diffusion",
            %url,
            model = %options.model,
            prompt = %options.prompt,
            "sending img2img request"
        );

        let started = std::time::Instant::now();
        let bytes = self.post_json(url, &body).await?;
        let images = decode_images(&bytes)?;

        info!(
            target: "diffusion",
            model = %options.model,
            images = images.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "img2img finished"
        );
        Ok(images)
    }

    /// Checkpoint titles the service can load, usable as `DiffusionOptions::model`.
    pub async fn models(&self) -> Result<Vec<String>> {
        let bytes = self.get(self.endpoint(MODELS_PATH)?).await?;
        let models: Vec<ModelInfo> = serde_json::from_slice(&bytes)
            .map_err(|err| BoothError::decode(format!("sd-models response: {err}")))?;
        Ok(models.into_iter().map(|model| model.title).collect())
    }

    pub async fn progress(&self) -> Result<Progress> {
        let bytes = self.get(self.endpoint(PROGRESS_PATH)?).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| BoothError::decode(format!("progress response: {err}")))
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| BoothError::transport(format!("POST {url}: {err}")))?;
        Self::read_success(url, response).await
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| BoothError::transport(format!("GET {url}: {err}")))?;
        Self::read_success(url, response).await
    }

    async fn read_success(url: Url, response: reqwest::Response) -> Result<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BoothError::transport(format!(
                "{url} returned {status}: {}",
                truncate_for_log(&body, ERROR_BODY_LIMIT)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| BoothError::transport(format!("reading {url}: {err}")))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    title: String,
}

/// Snapshot of the job the service is currently running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Between 0 and 1.
    pub progress: f32,
    pub eta_relative: f32,
}

impl Progress {
    /// Zero when the service reports a negative, non-finite or oversized value.
    pub fn eta(&self) -> Duration {
        Duration::try_from_secs_f32(self.eta_relative.max(0.0)).unwrap_or(Duration::ZERO)
    }
}
