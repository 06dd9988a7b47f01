use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::presets::{ControlWeights, Preset, default_icon};

const DEFAULT_CONFIG_PATH: &str = "config/stylebooth.toml";
const ENV_PREFIX: &str = "BOOTH";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DIFFUSION_URL: &str = "http://127.0.0.1:7860";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_PREFIX: &str = "/diffusion";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Clone, Debug)]
pub struct DiffusionConfig {
    pub base_url: String,
    /// Unset means no client-side limit.
    pub timeout: Option<Duration>,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DIFFUSION_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Route prefix, always with a leading slash and no trailing one.
    pub prefix: String,
    /// Prepended to returned links, e.g. `https://booth.example.org`.
    pub public_host: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub diffusion: DiffusionConfig,
    pub uploads: UploadConfig,
    pub presets: Vec<Preset>,
}

impl AppConfig {
    /// Reads the TOML file named by `APP_CONFIG_PATH` (a missing file is
    /// fine) and applies `BOOTH__SECTION__KEY` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            env::var("APP_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        let file_config: FileConfig = config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read configuration {:?}", config_path))?
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {:?}", config_path))?;

        file_config.into_domain()
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: Option<FileServerConfig>,
    #[serde(default)]
    diffusion: Option<FileDiffusionConfig>,
    #[serde(default)]
    uploads: Option<FileUploadConfig>,
    #[serde(default)]
    presets: Vec<FilePresetConfig>,
}

impl FileConfig {
    fn into_domain(self) -> anyhow::Result<AppConfig> {
        Ok(AppConfig {
            server: self.server.unwrap_or_default().into_domain()?,
            diffusion: self.diffusion.unwrap_or_default().into_domain(),
            uploads: self.uploads.unwrap_or_default().into_domain(),
            presets: self
                .presets
                .into_iter()
                .map(FilePresetConfig::into_domain)
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileServerConfig {
    #[serde(default)]
    bind_addr: Option<String>,
}

impl FileServerConfig {
    fn into_domain(self) -> anyhow::Result<ServerConfig> {
        let bind_addr_str = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .with_context(|| format!("failed to parse server.bind_addr: {}", bind_addr_str))?;
        Ok(ServerConfig { bind_addr })
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileDiffusionConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl FileDiffusionConfig {
    fn into_domain(self) -> DiffusionConfig {
        DiffusionConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_DIFFUSION_URL.to_string()),
            timeout: self
                .timeout_seconds
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileUploadConfig {
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    public_host: Option<String>,
}

impl FileUploadConfig {
    fn into_domain(self) -> UploadConfig {
        let prefix = self
            .prefix
            .unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.to_string());
        let prefix = format!("/{}", prefix.trim_matches('/'));

        UploadConfig {
            dir: PathBuf::from(self.dir.unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())),
            prefix,
            public_host: self
                .public_host
                .map(|host| host.trim_end_matches('/').to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilePresetConfig {
    key: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    composer: String,
    template: String,
    model: String,
    depth: f32,
    openpose: f32,
    softedge: f32,
}

impl FilePresetConfig {
    fn into_domain(self) -> Preset {
        Preset {
            label: self.label.unwrap_or_else(|| self.key.clone()),
            icon: self.icon.unwrap_or_else(|| default_icon(&self.key)),
            key: self.key,
            composer: self.composer,
            template: self.template,
            model: self.model,
            weights: ControlWeights::new(self.depth, self.openpose, self.softedge),
        }
    }
}
