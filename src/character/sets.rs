use std::sync::Arc;

use super::{
    Age, Gender,
    composer::{CharacterMatrix, Composer, IndexSource, MatrixComposer, OsIndexSource, RandomComposer},
};
use crate::errors::{BoothError, Result};

const HEALTHYBOY: CharacterMatrix = [
    ["young girl", "mother", "grandmother"],
    ["young kid", "adult", "grandparent"],
    ["young boy", "father", "grandfather"],
];

const PERSONS: CharacterMatrix = [
    ["young girl", "woman", "old woman"],
    ["young person", "person", "old person"],
    ["young boy", "man", "old man"],
];

const HOMOSAPIENS: CharacterMatrix = [
    ["young female", "female", "old female"],
    ["young person", "person", "old person"],
    ["young male", "male", "old male"],
];

const ANIME: CharacterMatrix = [
    ["1girl", "1woman", "old 1woman grandmother"],
    ["kid", "person", "grandparent"],
    ["1boy", "1man", "old 1man grandfather"],
];

const SUPERMAN: CharacterMatrix = [
    ["young supergirl", "supergirl", "old supergirl"],
    [
        "young person in superman costume",
        "person in superman costume",
        "old person in superman costume",
    ],
    ["young superman", "superman", "old superman"],
];

const BATMAN: CharacterMatrix = [
    ["young batgirl", "batgirl", "old batgirl"],
    [
        "young person in batman costume",
        "person in batman costume",
        "old person in batman costume",
    ],
    ["young batman", "batman", "old batman"],
];

const JOKER: CharacterMatrix = [
    [
        "young female joker villain",
        "female joker villain",
        "old female joker villain",
    ],
    [
        "young person as the joker villain",
        "person as the joker villain",
        "old person as the joker villain",
    ],
    ["young joker villain", "joker villain", "old joker villain"],
];

const HULK: CharacterMatrix = [
    ["young she-hulk", "she-hulk", "old she-hulk"],
    ["young hulk person", "hulk person", "old hulk person"],
    ["young hulk", "hulk", "old hulk"],
];

// scarlet witch x doctor strange
const WITCH: CharacterMatrix = [
    ["young scarlet witch", "scarlet witch", "old scarlet witch"],
    [
        "young sorcerer or witch person",
        "sorcerer or witch person",
        "old sorcerer or witch person",
    ],
    ["young doctor strange", "doctor strange", "old doctor strange"],
];

const MATRICES: [(&str, CharacterMatrix); 9] = [
    ("healthyboy", HEALTHYBOY),
    ("persons", PERSONS),
    ("homosapiens", HOMOSAPIENS),
    ("anime", ANIME),
    ("superman", SUPERMAN),
    ("batman", BATMAN),
    ("joker", JOKER),
    ("hulk", HULK),
    ("witch", WITCH),
];

/// Character sets `randomhero` draws from.
const HEROES: [&str; 5] = ["superman", "batman", "joker", "hulk", "witch"];

pub const RANDOM_HERO: &str = "randomhero";

/// Named composers, fixed after construction.
pub struct CharacterRegistry {
    composers: Vec<(&'static str, Arc<dyn Composer>)>,
}

impl CharacterRegistry {
    pub fn builtin() -> Result<Self> {
        Self::with_index_source(Arc::new(OsIndexSource))
    }

    /// Same sets as [`CharacterRegistry::builtin`], with `randomhero` drawing from `source`.
    pub fn with_index_source(source: Arc<dyn IndexSource>) -> Result<Self> {
        let mut composers: Vec<(&'static str, Arc<dyn Composer>)> = MATRICES
            .iter()
            .map(|(name, matrix)| {
                (*name, Arc::new(MatrixComposer::new(*matrix)) as Arc<dyn Composer>)
            })
            .collect();

        let heroes = HEROES
            .iter()
            .map(|hero| {
                composers
                    .iter()
                    .find(|(name, _)| name == hero)
                    .map(|(_, composer)| composer.clone())
                    .ok_or_else(|| BoothError::other(format!("hero set {hero} is not registered")))
            })
            .collect::<Result<Vec<_>>>()?;

        composers.push((RANDOM_HERO, Arc::new(RandomComposer::new(heroes, source)?)));

        Ok(Self { composers })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Composer>> {
        self.composers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, composer)| composer.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.composers.iter().any(|(key, _)| *key == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.composers.iter().map(|(name, _)| *name)
    }

    pub fn compose(&self, name: &str, gender: Gender, age: Age) -> Result<String> {
        let composer = self
            .get(name)
            .ok_or_else(|| BoothError::invalid(format!("unknown character set: {name}")))?;
        Ok(composer.compose(gender, age))
    }
}
