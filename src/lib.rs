//! Photo booth back end: turns a (gender, age) selection and a style preset
//! into a Stable Diffusion web UI img2img request.

pub mod api;
pub mod character;
pub mod config;
pub mod diffusion;
pub mod errors;
pub mod orchestrator;
pub mod presets;
pub mod util;
