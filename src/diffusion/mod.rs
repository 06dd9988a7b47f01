//! Stable Diffusion web UI img2img request assembly.
//!
//! [`DiffusionOptions`] is what callers fill in; [`Img2ImgRequest`] is the
//! wire body with every default applied. [`DiffusionClient`] sends it.

mod client;

pub use client::{DiffusionClient, Progress};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{BoothError, Result};

/// `<img>`-ready string, `data:image/png;base64,...`.
pub type DataUri = String;

pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

pub const DEFAULT_NEGATIVE_PROMPT: &str = "";
/// The service picks a seed.
pub const DEFAULT_SEED: i64 = -1;
pub const DEFAULT_STEPS: u32 = 20;
pub const DEFAULT_RESOLUTION: u32 = 512;
pub const DEFAULT_CFG_SCALE: f32 = 7.0;
pub const DEFAULT_N_ITER: u32 = 1;
pub const DEFAULT_BATCH_SIZE: u32 = 1;
pub const DEFAULT_DENOISING_STRENGTH: f32 = 0.95;
pub const DEFAULT_SAMPLER: &str = "DPM++ 2M Karras";
const RESIZE_MODE: &str = "Crop and Resize";

/// Maps a control-net weight into `[0, 1]`. NaN counts as 0.
pub fn clamp_weight(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ControlMode {
    #[default]
    Balanced,
    #[serde(rename = "My prompt is more important")]
    PromptMoreImportant,
    #[serde(rename = "ControlNet is more important")]
    ControlNetMoreImportant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlNetOptions {
    pub enabled: bool,
    pub weight: f32,
    pub control_mode: ControlMode,
}

impl ControlNetOptions {
    pub fn enabled(weight: f32) -> Self {
        Self {
            enabled: true,
            weight,
            control_mode: ControlMode::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSet {
    pub openpose: ControlNetOptions,
    pub depth: ControlNetOptions,
    pub softedge: ControlNetOptions,
}

/// Control-net preprocessor and model pair for one conditioning signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    OpenPose,
    Depth,
    SoftEdge,
}

impl ControlType {
    /// Order of the `ControlNet.args` array.
    pub const ALL: [ControlType; 3] = [ControlType::OpenPose, ControlType::Depth, ControlType::SoftEdge];

    pub fn module(self) -> &'static str {
        match self {
            ControlType::OpenPose => "openpose_full",
            ControlType::Depth => "depth_midas",
            ControlType::SoftEdge => "softedge_pidinet",
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            ControlType::OpenPose => "control_v11p_sd15_openpose",
            ControlType::Depth => "control_v11f1p_sd15_depth",
            ControlType::SoftEdge => "control_v11p_sd15_softedge",
        }
    }

    fn options(self, set: &ControlSet) -> &ControlNetOptions {
        match self {
            ControlType::OpenPose => &set.openpose,
            ControlType::Depth => &set.depth,
            ControlType::SoftEdge => &set.softedge,
        }
    }
}

/// Prompt data and generation options for one img2img call.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionOptions {
    /// Reference picture, base64 without a data URI prefix.
    pub image: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// Checkpoint title as known to the web UI.
    pub model: String,
    pub control: ControlSet,
    /// Square output edge in pixels.
    pub resolution: Option<u32>,
    pub seed: Option<i64>,
    pub denoising_strength: Option<f32>,
    pub cfg_scale: Option<f32>,
    pub steps: Option<u32>,
    pub n_iter: Option<u32>,
    pub batch_size: Option<u32>,
    pub sampler: Option<String>,
}

impl DiffusionOptions {
    pub fn new(
        image: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
        control: ControlSet,
    ) -> Self {
        Self {
            image: image.into(),
            prompt: prompt.into(),
            negative_prompt: None,
            model: model.into(),
            control,
            resolution: None,
            seed: None,
            denoising_strength: None,
            cfg_scale: None,
            steps: None,
            n_iter: None,
            batch_size: None,
            sampler: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Img2ImgRequest<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub init_images: [&'a str; 1],
    pub seed: i64,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f32,
    pub n_iter: u32,
    pub batch_size: u32,
    pub denoising_strength: f32,
    pub sampler_name: &'a str,
    pub override_settings: OverrideSettings<'a>,
    pub alwayson_scripts: AlwaysOnScripts,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideSettings<'a> {
    pub sd_model_checkpoint: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlwaysOnScripts {
    #[serde(rename = "ControlNet")]
    pub control_net: ControlNetScript,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlNetScript {
    pub args: Vec<ControlNetUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlNetUnit {
    pub module: &'static str,
    pub model: &'static str,
    pub enabled: bool,
    pub weight: f32,
    pub control_mode: ControlMode,
    pub processor_res: u32,
    pub resize_mode: &'static str,
}

/// Applies defaults and lays out the control-net units.
///
/// Weights are clamped here as well, so callers that bypass the presets
/// cannot send values outside `[0, 1]`.
pub fn build_request(options: &DiffusionOptions) -> Img2ImgRequest<'_> {
    let resolution = options.resolution.unwrap_or(DEFAULT_RESOLUTION);

    let args = ControlType::ALL
        .iter()
        .map(|kind| {
            let unit = kind.options(&options.control);
            let weight = clamp_weight(unit.weight);
            if weight != unit.weight {
                warn!(
                    target: "diffusion",
                    module = kind.module(),
                    requested = unit.weight,
                    applied = weight,
                    "control-net weight out of range, clamped"
                );
            }
            ControlNetUnit {
                module: kind.module(),
                model: kind.model(),
                enabled: unit.enabled,
                weight,
                control_mode: unit.control_mode,
                processor_res: resolution,
                resize_mode: RESIZE_MODE,
            }
        })
        .collect();

    Img2ImgRequest {
        prompt: &options.prompt,
        negative_prompt: options
            .negative_prompt
            .as_deref()
            .unwrap_or(DEFAULT_NEGATIVE_PROMPT),
        init_images: [&options.image],
        seed: options.seed.unwrap_or(DEFAULT_SEED),
        steps: options.steps.unwrap_or(DEFAULT_STEPS),
        width: resolution,
        height: resolution,
        cfg_scale: options.cfg_scale.unwrap_or(DEFAULT_CFG_SCALE),
        n_iter: options.n_iter.unwrap_or(DEFAULT_N_ITER),
        batch_size: options.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
        denoising_strength: options
            .denoising_strength
            .unwrap_or(DEFAULT_DENOISING_STRENGTH),
        sampler_name: options.sampler.as_deref().unwrap_or(DEFAULT_SAMPLER),
        override_settings: OverrideSettings {
            sd_model_checkpoint: &options.model,
        },
        alwayson_scripts: AlwaysOnScripts {
            control_net: ControlNetScript { args },
        },
    }
}

#[derive(Debug, Deserialize)]
struct Img2ImgResponse {
    images: Vec<String>,
    #[serde(default)]
    parameters: Option<Value>,
}

pub fn data_uri(payload: &str) -> DataUri {
    format!("{DATA_URI_PREFIX}{payload}")
}

/// Turns an img2img response body into data URIs, keeping the service's order.
pub fn decode_images(body: &[u8]) -> Result<Vec<DataUri>> {
    let response: Img2ImgResponse = serde_json::from_slice(body)
        .map_err(|err| BoothError::decode(format!("img2img response: {err}")))?;

    if let Some(parameters) = &response.parameters {
        debug!(target: "diffusion", %parameters, "img2img parameters");
    }

    Ok(response.images.iter().map(|image| data_uri(image)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> DiffusionOptions {
        DiffusionOptions::new(
            "AAA",
            "p",
            "m",
            ControlSet {
                openpose: ControlNetOptions::enabled(0.5),
                depth: ControlNetOptions::enabled(0.6),
                softedge: ControlNetOptions::enabled(0.2),
            },
        )
    }

    #[test]
    fn clamps_weights_into_unit_range() {
        assert_eq!(clamp_weight(-0.3), 0.0);
        assert_eq!(clamp_weight(1.4), 1.0);
        assert_eq!(clamp_weight(0.45), 0.45);
        assert_eq!(clamp_weight(0.0), 0.0);
        assert_eq!(clamp_weight(1.0), 1.0);
        assert_eq!(clamp_weight(f32::NAN), 0.0);
    }

    #[test]
    fn minimal_options_get_every_default() {
        let options = minimal();
        let body = serde_json::to_value(build_request(&options)).unwrap();

        assert_eq!(body["prompt"], "p");
        assert_eq!(body["negative_prompt"], "");
        assert_eq!(body["init_images"], json!(["AAA"]));
        assert_eq!(body["seed"], -1);
        assert_eq!(body["steps"], 20);
        assert_eq!(body["width"], 512);
        assert_eq!(body["height"], 512);
        assert_eq!(body["cfg_scale"], 7.0);
        assert_eq!(body["n_iter"], 1);
        assert_eq!(body["batch_size"], 1);
        assert_eq!(body["denoising_strength"].as_f64().unwrap() as f32, 0.95);
        assert_eq!(body["sampler_name"], "DPM++ 2M Karras");
        assert_eq!(body["override_settings"]["sd_model_checkpoint"], "m");
    }

    #[test]
    fn control_net_units_follow_openpose_depth_softedge() {
        let mut options = minimal();
        options.resolution = Some(768);
        options.control.depth.control_mode = ControlMode::ControlNetMoreImportant;
        let body = serde_json::to_value(build_request(&options)).unwrap();

        let args = body["alwayson_scripts"]["ControlNet"]["args"]
            .as_array()
            .unwrap();
        assert_eq!(args.len(), 3);

        assert_eq!(args[0]["module"], "openpose_full");
        assert_eq!(args[0]["model"], "control_v11p_sd15_openpose");
        assert_eq!(args[0]["weight"], 0.5);
        assert_eq!(args[0]["control_mode"], "Balanced");

        assert_eq!(args[1]["module"], "depth_midas");
        assert_eq!(args[1]["model"], "control_v11f1p_sd15_depth");
        assert_eq!(args[1]["control_mode"], "ControlNet is more important");

        assert_eq!(args[2]["module"], "softedge_pidinet");
        assert_eq!(args[2]["model"], "control_v11p_sd15_softedge");

        for arg in args {
            assert_eq!(arg["enabled"], true);
            assert_eq!(arg["processor_res"], 768);
            assert_eq!(arg["resize_mode"], "Crop and Resize");
        }
        assert_eq!(body["width"], 768);
        assert_eq!(body["height"], 768);
    }

    #[test]
    fn explicit_options_override_defaults() {
        let mut options = minimal();
        options.negative_prompt = Some("blurry".to_string());
        options.seed = Some(42);
        options.steps = Some(30);
        options.sampler = Some("Euler a".to_string());
        let request = build_request(&options);

        assert_eq!(request.negative_prompt, "blurry");
        assert_eq!(request.seed, 42);
        assert_eq!(request.steps, 30);
        assert_eq!(request.sampler_name, "Euler a");
    }

    #[test]
    fn out_of_range_weights_are_clamped_at_the_boundary() {
        let mut options = minimal();
        options.control.openpose.weight = 1.7;
        options.control.softedge.weight = -2.0;
        let request = build_request(&options);

        let args = &request.alwayson_scripts.control_net.args;
        assert_eq!(args[0].weight, 1.0);
        assert_eq!(args[1].weight, 0.6);
        assert_eq!(args[2].weight, 0.0);
    }

    #[test]
    fn decodes_images_into_data_uris_in_order() {
        let uris = decode_images(br#"{"images": ["Zm9v"]}"#).unwrap();
        assert_eq!(uris, vec!["data:image/png;base64,Zm9v".to_string()]);

        let uris = decode_images(br#"{"images": ["b25l", "dHdv"], "parameters": {"steps": 20}}"#)
            .unwrap();
        assert_eq!(
            uris,
            vec![
                "data:image/png;base64,b25l".to_string(),
                "data:image/png;base64,dHdv".to_string()
            ]
        );
    }

    #[test]
    fn missing_images_is_a_decode_error() {
        let err = decode_images(b"{}").unwrap_err();
        assert!(err.is_decode());

        let err = decode_images(b"<html>bad gateway</html>").unwrap_err();
        assert!(err.is_decode());
    }
}
