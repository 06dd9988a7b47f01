mod builtin;

use tracing::debug;

use crate::{
    character::{Age, CharacterRegistry, Gender},
    diffusion::{ControlNetOptions, ControlSet, DiffusionOptions, clamp_weight},
    errors::{BoothError, Result},
};

/// Replaced by the composer's phrase when a prompt is rendered.
pub const CHARACTER_PLACEHOLDER: &str = "{character}";

pub fn render_template(template: &str, phrase: &str) -> String {
    template.replace(CHARACTER_PLACEHOLDER, phrase)
}

pub fn default_icon(key: &str) -> String {
    format!("/icons/{key}.png")
}

/// Control-net weights a preset always applies, each clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlWeights {
    pub depth: f32,
    pub openpose: f32,
    pub softedge: f32,
}

impl ControlWeights {
    pub fn new(depth: f32, openpose: f32, softedge: f32) -> Self {
        Self {
            depth: clamp_weight(depth),
            openpose: clamp_weight(openpose),
            softedge: clamp_weight(softedge),
        }
    }

    pub fn control_set(&self) -> ControlSet {
        ControlSet {
            openpose: ControlNetOptions::enabled(self.openpose),
            depth: ControlNetOptions::enabled(self.depth),
            softedge: ControlNetOptions::enabled(self.softedge),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub key: String,
    pub label: String,
    pub icon: String,
    /// Name in the [`CharacterRegistry`].
    pub composer: String,
    pub template: String,
    pub model: String,
    pub weights: ControlWeights,
}

/// What a preset produced for one selection.
#[derive(Debug, Clone)]
pub struct PresetRequest {
    pub phrase: String,
    pub options: DiffusionOptions,
}

impl Preset {
    pub fn build(
        &self,
        characters: &CharacterRegistry,
        image: &str,
        gender: Gender,
        age: Age,
    ) -> Result<PresetRequest> {
        let phrase = characters.compose(&self.composer, gender, age)?;
        let prompt = render_template(&self.template, &phrase);
        debug!(target: "presets", preset = %self.key, %prompt, "prompt rendered");

        Ok(PresetRequest {
            phrase,
            options: DiffusionOptions::new(
                image,
                prompt,
                self.model.clone(),
                self.weights.control_set(),
            ),
        })
    }

    fn validate(&self, characters: &CharacterRegistry) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(BoothError::invalid("preset key is empty"));
        }
        if !characters.contains(&self.composer) {
            return Err(BoothError::invalid(format!(
                "preset {} uses unknown character set {}",
                self.key, self.composer
            )));
        }
        if !self.template.contains(CHARACTER_PLACEHOLDER) {
            return Err(BoothError::invalid(format!(
                "preset {} template has no {CHARACTER_PLACEHOLDER} placeholder",
                self.key
            )));
        }
        Ok(())
    }
}

/// Presets in display order, keys unique.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
}

impl PresetRegistry {
    pub fn builtin(characters: &CharacterRegistry) -> Result<Self> {
        Self::from_presets(builtin::presets(), characters)
    }

    pub fn from_presets(presets: Vec<Preset>, characters: &CharacterRegistry) -> Result<Self> {
        let mut registry = Self {
            presets: Vec::with_capacity(presets.len()),
        };
        registry.extend(presets, characters)?;
        Ok(registry)
    }

    /// Appends presets, rejecting duplicate keys and unknown character sets.
    /// Either the whole batch is registered or none of it is.
    pub fn extend(
        &mut self,
        presets: impl IntoIterator<Item = Preset>,
        characters: &CharacterRegistry,
    ) -> Result<()> {
        let batch: Vec<Preset> = presets.into_iter().collect();
        for (position, preset) in batch.iter().enumerate() {
            preset.validate(characters)?;
            let earlier_in_batch = batch[..position]
                .iter()
                .any(|other| other.key == preset.key);
            if earlier_in_batch || self.get(&preset.key).is_some() {
                return Err(BoothError::invalid(format!(
                    "duplicate preset key: {}",
                    preset.key
                )));
            }
        }
        self.presets.extend(batch);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
