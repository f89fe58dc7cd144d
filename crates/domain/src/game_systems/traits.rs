//! Rules module traits.
//!
//! A rules module turns a raw [`Character`] into validation issues and
//! [`DerivedStats`]. Modules are loaded once per manifest and shared, so
//! they must be stateless with respect to characters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::dnd5e::MAX_LEVEL;
use crate::derived::DerivedStats;
use crate::entities::{Ability, Character, Skill};

/// Core trait all rules modules implement.
pub trait RulesModule: Send + Sync {
    /// Unique identifier for this module (e.g., "fivee_stock").
    fn id(&self) -> &str;

    /// Human-readable name; defaults to the id.
    fn display_name(&self) -> &str {
        self.id()
    }

    /// Starting ability scores for a new character.
    fn template_abilities(&self) -> BTreeMap<Ability, i32>;

    /// Skills a new character starts with.
    fn template_skills(&self) -> Vec<Skill>;

    /// Human-readable problems with the sheet. Never fails; an empty list
    /// means the character is valid.
    fn validate(&self, character: &Character) -> Vec<String>;

    /// Compute derived statistics. Always succeeds, even for characters
    /// that fail validation.
    fn derive(&self, character: &Character) -> DerivedStats;
}

/// Type of spellcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasterType {
    /// Full caster (Wizard, Cleric, Druid, Sorcerer, Bard)
    Full,
    /// Half caster (Paladin, Ranger)
    Half,
    /// Third caster (Eldritch Knight, Arcane Trickster)
    Third,
    /// Pact magic (Warlock)
    Pact,
}

impl CasterType {
    /// Row of the full-caster slot table this class level reads from.
    ///
    /// Pact casters have their own table and return their class level.
    pub fn caster_level(&self, class_level: i32) -> i32 {
        let class_level = class_level.clamp(0, MAX_LEVEL);
        match self {
            CasterType::Full | CasterType::Pact => class_level,
            CasterType::Half => (class_level + 1).div_euclid(2),
            CasterType::Third => (class_level + 2).div_euclid(3),
        }
    }

    /// Prepared-spell allowance contributed by the class level.
    pub fn preparation_levels(&self, class_level: i32) -> i32 {
        let class_level = class_level.clamp(0, MAX_LEVEL);
        match self {
            CasterType::Half => class_level.div_euclid(2),
            _ => class_level,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CasterType::Full => "full",
            CasterType::Half => "half",
            CasterType::Third => "third",
            CasterType::Pact => "pact",
        }
    }
}

impl fmt::Display for CasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
