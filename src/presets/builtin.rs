use super::{ControlWeights, Preset};

// checkpoints expected on the web UI
const DREAMSHAPER: &str = "dreamshaper8Pruned.hz5Q.safetensors";
const ABSOLUTE_REALITY: &str = "absolutereality181.n8IR.safetensors";
const ANIME_PASTEL_DREAM: &str = "animepasteldreamSoft.lTTK.safetensors";
const WESTERN_ANI: &str = "westernanidiffusion.EpVW.safetensors";
const CLAZY: &str = "clazy2600.xYzn.ckpt";
const CARICATURIZER: &str = "caricaturizer_pcrc_style.uwgn1lmj.q5b.ckpt";

struct Entry {
    key: &'static str,
    label: &'static str,
    composer: &'static str,
    template: &'static str,
    model: &'static str,
    // depth, openpose, softedge
    weights: (f32, f32, f32),
}

const ENTRIES: &[Entry] = &[
    Entry {
        key: "free",
        label: "Free",
        composer: "persons",
        template: "{character}",
        model: DREAMSHAPER,
        weights: (0.6, 0.5, 0.2),
    },
    Entry {
        key: "neotokyo",
        label: "Neo Tokyo",
        composer: "persons",
        template: "neotokio, 90s anime, {character} with glasses, looking at the camera, portrait, evening, narrow alley in the background, bright neon signs <lora:NEOTOKIO_V0.01:0.7>",
        model: DREAMSHAPER,
        weights: (1.0, 0.8, 0.4),
    },
    Entry {
        key: "kids",
        label: "Kids",
        composer: "healthyboy",
        template: "kids illustration, children's cartoon, happy {character}, looking at the camera, kitchen in the background <lora:coolkidsMERGEV25.Qqci:1>",
        model: DREAMSHAPER,
        weights: (0.7, 0.8, 0.4),
    },
    Entry {
        key: "western",
        label: "Western Comic",
        composer: "randomhero",
        template: "western comic, portrait, {character}, looking to the side, city with skyscrapers in the background",
        model: WESTERN_ANI,
        weights: (0.7, 0.8, 0.4),
    },
    Entry {
        key: "gotcha",
        label: "Gotcha",
        composer: "persons",
        template: "stylized cartoon, illustration, portrait of a {character} as an animal, looking sideways, forest in the background <lora:gotchaV001.Yu4Z:0.4>",
        model: DREAMSHAPER,
        weights: (0.5, 0.2, 0.1),
    },
    Entry {
        key: "watercolor",
        label: "Watercolor",
        composer: "persons",
        template: "watercolor painting, hand-drawn illustration, portrait of a {character}, looking sideways, clear white paper background <lora:watercolorv1.7lox:1>",
        model: DREAMSHAPER,
        weights: (0.7, 0.8, 0.4),
    },
    Entry {
        key: "astronaut",
        label: "Astronaut",
        composer: "persons",
        template: "portrait of a {character} as a NASA astronaut in a spacesuit before rocket launch, space photography in the background, realistic photo, shot on DSLR",
        model: ABSOLUTE_REALITY,
        weights: (0.4, 0.8, 0.4),
    },
    Entry {
        key: "marble",
        label: "Marble",
        composer: "persons",
        template: "marble sculpture in a museum, bust of a {character}, greek hills, art gallery in the background, realistic photo",
        model: ABSOLUTE_REALITY,
        weights: (0.5, 1.0, 0.4),
    },
    Entry {
        key: "anime",
        label: "Anime",
        composer: "anime",
        template: "anime illustration, movie still, {character}, smiling and happy, looking sideways, bright sun, summer, small town in the background",
        model: ANIME_PASTEL_DREAM,
        weights: (1.0, 0.8, 0.6),
    },
    Entry {
        key: "retro",
        label: "Retro",
        composer: "persons",
        template: "stylized retro illustration, {character}, low palette, pastel colors, sharp lines, band album cover",
        model: DREAMSHAPER,
        weights: (0.8, 0.4, 0.4),
    },
    Entry {
        key: "pencil",
        label: "Pencil",
        composer: "persons",
        template: "very rough sketch, pencil drawing, a {character}, black-and white, hand-drawn, scribble",
        model: DREAMSHAPER,
        weights: (0.8, 0.8, 0.6),
    },
    Entry {
        key: "clay",
        label: "Clay",
        composer: "healthyboy",
        template: "clazy style, claymation, stopmotion, small clay figure of a {character}, vibrant colors, fantastic plastic <lora:ClayAnimationRedmond15-ClayAnimation-Clay:1>",
        model: CLAZY,
        weights: (0.7, 0.8, 0.4),
    },
    Entry {
        key: "vaporwave",
        label: "Vaporwave",
        composer: "persons",
        template: "vaporwave, illustration, vibrant colors, neon background, purple, flying hair, smiling {character}",
        model: DREAMSHAPER,
        weights: (1.0, 0.8, 0.6),
    },
    Entry {
        key: "scifi",
        label: "Sci-Fi",
        composer: "persons",
        template: "futuristic sci-fi, {character}, neon lights illumination, distant night city in the background",
        model: DREAMSHAPER,
        weights: (1.0, 0.8, 0.6),
    },
    Entry {
        key: "caricature",
        label: "Caricature",
        composer: "persons",
        template: "caricature, hand-drawn illustration, portrait of a {character}, looking sideways",
        model: CARICATURIZER,
        weights: (0.6, 0.3, 0.0),
    },
    Entry {
        key: "impasto",
        label: "Impasto",
        composer: "persons",
        template: "((impasto)), intricate oil painting, thick textured paint, artistic, old holland classic colors, portrait of a {character}, looking to the front",
        model: DREAMSHAPER,
        weights: (0.6, 0.5, 0.8),
    },
];

pub(super) fn presets() -> Vec<Preset> {
    ENTRIES
        .iter()
        .map(|entry| {
            let (depth, openpose, softedge) = entry.weights;
            Preset {
                key: entry.key.to_string(),
                label: entry.label.to_string(),
                icon: super::default_icon(entry.key),
                composer: entry.composer.to_string(),
                template: entry.template.to_string(),
                model: entry.model.to_string(),
                weights: ControlWeights::new(depth, openpose, softedge),
            }
        })
        .collect()
}
