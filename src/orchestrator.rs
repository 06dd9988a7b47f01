use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::{
    character::{Age, CharacterRegistry, Gender},
    config::AppConfig,
    diffusion::{DataUri, DiffusionClient},
    errors::{BoothError, Result},
    presets::{Preset, PresetRegistry},
};

/// Outcome of one preset run.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub request_id: Uuid,
    pub preset: String,
    pub prompt: String,
    pub images: Vec<DataUri>,
}

/// Ties the character sets, presets and the image service together.
#[derive(Clone)]
pub struct Booth {
    characters: Arc<CharacterRegistry>,
    presets: Arc<PresetRegistry>,
    client: DiffusionClient,
}

impl Booth {
    pub fn new(
        characters: Arc<CharacterRegistry>,
        presets: Arc<PresetRegistry>,
        client: DiffusionClient,
    ) -> Self {
        Self {
            characters,
            presets,
            client,
        }
    }

    /// Built-in tables plus the presets from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let characters = CharacterRegistry::builtin()?;
        let mut presets = PresetRegistry::builtin(&characters)?;
        presets.extend(config.presets.iter().cloned(), &characters)?;
        let client = DiffusionClient::from_config(&config.diffusion)?;

        info!(
            target: "booth",
            presets = presets.len(),
            diffusion = %client.base_url(),
            "booth ready"
        );

        Ok(Self::new(Arc::new(characters), Arc::new(presets), client))
    }

    pub fn characters(&self) -> &CharacterRegistry {
        &self.characters
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn client(&self) -> &DiffusionClient {
        &self.client
    }

    pub fn preset(&self, key: &str) -> Result<&Preset> {
        self.presets
            .get(key)
            .ok_or_else(|| BoothError::UnknownPreset(key.to_string()))
    }

    /// Renders the preset for this selection and sends it to the image service.
    pub async fn generate(
        &self,
        preset_key: &str,
        image: &str,
        gender: Gender,
        age: Age,
    ) -> Result<Generation> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate", %request_id, preset = preset_key, %gender, %age);

        async {
            let preset = self.preset(preset_key)?;
            let request = preset.build(&self.characters, image, gender, age)?;
            let images = self.client.send(&request.options).await?;

            info!(target: "booth", images = images.len(), "generation finished");

            Ok::<_, BoothError>(Generation {
                request_id,
                preset: preset.key.clone(),
                prompt: request.options.prompt,
                images,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DiffusionConfig, ServerConfig, UploadConfig},
        presets::{ControlWeights, default_icon},
    };

    fn config(presets: Vec<Preset>) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
            },
            diffusion: DiffusionConfig::default(),
            uploads: UploadConfig {
                dir: "uploads".into(),
                prefix: "/diffusion".to_string(),
                public_host: String::new(),
            },
            presets,
        }
    }

    fn noir(composer: &str) -> Preset {
        Preset {
            key: "noir".to_string(),
            label: "Film Noir".to_string(),
            icon: default_icon("noir"),
            composer: composer.to_string(),
            template: "film noir still, {character}".to_string(),
            model: "v1-5-pruned-emaonly.safetensors".to_string(),
            weights: ControlWeights::new(0.7, 0.8, 0.4),
        }
    }

    #[test]
    fn configured_presets_follow_the_builtins() {
        let booth = Booth::from_config(&config(vec![noir("homosapiens")])).unwrap();
        assert_eq!(booth.presets().len(), 17);
        assert_eq!(
            booth.presets().iter().last().map(|preset| preset.key.as_str()),
            Some("noir")
        );
    }

    #[test]
    fn configured_preset_with_unknown_set_fails_start_up() {
        let err = Booth::from_config(&config(vec![noir("villains")])).err().unwrap();
        assert!(matches!(err, BoothError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_preset_fails_before_any_request() {
        let booth = Booth::from_config(&config(Vec::new())).unwrap();
        let err = booth
            .generate("nope", "Zm9v", Gender::Male, Age::Young)
            .await
            .unwrap_err();
        assert!(matches!(err, BoothError::UnknownPreset(_)));
    }
}
