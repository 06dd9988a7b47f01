mod composer;
mod sets;

pub use composer::{
    CharacterMatrix, Composer, IndexSource, MatrixComposer, OsIndexSource, RandomComposer,
};
pub use sets::{CharacterRegistry, RANDOM_HERO};

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::BoothError;

/// Row of a [`CharacterMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Person,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Female, Gender::Person, Gender::Male];

    pub fn index(self) -> usize {
        match self {
            Gender::Female => 0,
            Gender::Person => 1,
            Gender::Male => 2,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, BoothError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| BoothError::invalid(format!("gender index {index} out of range")))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Person => "Person",
            Gender::Male => "Male",
        }
    }
}

impl FromStr for Gender {
    type Err = BoothError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "female" => Ok(Gender::Female),
            "person" => Ok(Gender::Person),
            "male" => Ok(Gender::Male),
            other => Err(BoothError::invalid(format!("unknown gender: {other:?}"))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column of a [`CharacterMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Age {
    Young,
    Middle,
    Old,
}

impl Age {
    pub const ALL: [Age; 3] = [Age::Young, Age::Middle, Age::Old];

    pub fn index(self) -> usize {
        match self {
            Age::Young => 0,
            Age::Middle => 1,
            Age::Old => 2,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, BoothError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| BoothError::invalid(format!("age index {index} out of range")))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Age::Young => "Young",
            Age::Middle => "Middle",
            Age::Old => "Old",
        }
    }
}

impl FromStr for Age {
    type Err = BoothError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "young" => Ok(Age::Young),
            "middle" => Ok(Age::Middle),
            "old" => Ok(Age::Old),
            other => Err(BoothError::invalid(format!("unknown age: {other:?}"))),
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
