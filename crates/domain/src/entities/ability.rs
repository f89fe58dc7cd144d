//! The six core abilities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the six fixed ability codes.
///
/// Declaration order is the conventional sheet order, so maps keyed by
/// `Ability` iterate (and serialize) STR, DEX, CON, INT, WIS, CHA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "STR")]
    Str,
    #[serde(rename = "DEX")]
    Dex,
    #[serde(rename = "CON")]
    Con,
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "WIS")]
    Wis,
    #[serde(rename = "CHA")]
    Cha,
}

impl Ability {
    /// All six abilities in sheet order.
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    /// The three-letter code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Ability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(Ability::Str),
            "dex" | "dexterity" => Ok(Ability::Dex),
            "con" | "constitution" => Ok(Ability::Con),
            "int" | "intelligence" => Ok(Ability::Int),
            "wis" | "wisdom" => Ok(Ability::Wis),
            "cha" | "charisma" => Ok(Ability::Cha),
            _ => Err(DomainError::parse(format!("Unknown ability: {}", s))),
        }
    }
}

/// A single ability score as stored on a character sheet.
///
/// On input a bare integer is accepted in place of the `{name, score}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AbilityScoreInput")]
pub struct AbilityScore {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub score: i32,
}

impl AbilityScore {
    pub fn new(ability: Ability, score: i32) -> Self {
        Self {
            name: ability.code().to_string(),
            score,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AbilityScoreInput {
    Score(i32),
    Full {
        #[serde(default)]
        name: String,
        score: i32,
    },
}

impl From<AbilityScoreInput> for AbilityScore {
    fn from(input: AbilityScoreInput) -> Self {
        match input {
            AbilityScoreInput::Score(score) => Self {
                name: String::new(),
                score,
            },
            AbilityScoreInput::Full { name, score } => Self { name, score },
        }
    }
}
