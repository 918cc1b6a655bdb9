//! Animal capability vocabulary.

use serde::{Deserialize, Serialize};

/// Animal categories an NGO can declare and a report is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalKind {
    Dogs,
    Cats,
    Birds,
    Wildlife,
    Farm,
    Reptiles,
    Exotic,
    Other,
}

impl AnimalKind {
    pub const ALL: [Self; 8] = [
        Self::Dogs,
        Self::Cats,
        Self::Birds,
        Self::Wildlife,
        Self::Farm,
        Self::Reptiles,
        Self::Exotic,
        Self::Other,
    ];

    /// Capability id as stored on NGO profiles.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dogs => "dogs",
            Self::Cats => "cats",
            Self::Birds => "birds",
            Self::Wildlife => "wildlife",
            Self::Farm => "farm",
            Self::Reptiles => "reptiles",
            Self::Exotic => "exotic",
            Self::Other => "other",
        }
    }

    /// Parse an exact capability id, ignoring case and surrounding space.
    #[must_use]
    pub fn from_capability(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    /// Classify a free-text animal type. Unrecognised input is `Other`.
    #[must_use]
    pub fn classify(animal_type: &str) -> Self {
        let word = animal_type.trim().to_lowercase();
        if let Some(kind) = Self::from_capability(&word) {
            return kind;
        }

        match word.as_str() {
            "dog" | "puppy" | "puppies" => Self::Dogs,
            "cat" | "kitten" | "kittens" => Self::Cats,
            "bird" | "parrot" | "parrots" | "pigeon" | "pigeons" | "crow" | "crows" => {
                Self::Birds
            }
            "farm animal" | "farm animals" | "cow" | "cows" | "cattle" | "buffalo" | "goat"
            | "goats" | "horse" | "horses" | "donkey" | "donkeys" | "pig" | "pigs" | "sheep" => {
                Self::Farm
            }
            "reptile" | "snake" | "snakes" | "lizard" | "lizards" | "turtle" | "turtles"
            | "tortoise" | "tortoises" => Self::Reptiles,
            "monkey" | "monkeys" | "deer" | "fox" | "foxes" | "squirrel" | "squirrels" => {
                Self::Wildlife
            }
            "exotic pet" | "exotic pets" | "rabbit" | "rabbits" | "hamster" | "hamsters" => {
                Self::Exotic
            }
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for AnimalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
