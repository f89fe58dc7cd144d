//! Derived statistics - everything a rules module computes from a character.
//!
//! Serialized as a JSON mapping; optional parts are omitted when absent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entities::{Ability, ArmorCategory};
use crate::game_systems::CasterType;

/// Result of deriving a character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub proficiency_bonus: i32,
    /// Effective scores after feat and item bonuses
    pub ability_scores: BTreeMap<Ability, i32>,
    pub ability_mods: BTreeMap<Ability, i32>,
    pub saving_throws: BTreeMap<Ability, i32>,
    pub saving_throw_proficiencies: BTreeMap<Ability, bool>,
    /// Aggregated bonuses keyed by `"all"` or an ability code
    #[serde(default)]
    pub saving_throw_bonuses: BTreeMap<String, i32>,
    pub ac: ArmorClass,
    #[serde(default)]
    pub skills: BTreeMap<String, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_dice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellcasting: Option<SpellcastingSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companions: Vec<CompanionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonuses: Option<PartyBonuses>,
}

/// Armor class with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorClass {
    pub value: i32,
    pub breakdown: AcBreakdown,
    pub source: AcSource,
}

impl Default for ArmorClass {
    fn default() -> Self {
        Self {
            value: 10,
            breakdown: AcBreakdown { base: 10, shield: 0 },
            source: AcSource::Unarmored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcBreakdown {
    pub base: i32,
    pub shield: i32,
}

/// Which candidate produced the base AC.
///
/// Serialized as `"unarmored"`, `"armor(<category>)"` or `"mage_armor"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSource {
    Unarmored,
    Armor(ArmorCategory),
    MageArmor,
}

impl fmt::Display for AcSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcSource::Unarmored => f.write_str("unarmored"),
            AcSource::Armor(category) => write!(f, "armor({})", category),
            AcSource::MageArmor => f.write_str("mage_armor"),
        }
    }
}

impl std::str::FromStr for AcSource {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unarmored" => Ok(AcSource::Unarmored),
            "mage_armor" => Ok(AcSource::MageArmor),
            other => other
                .strip_prefix("armor(")
                .and_then(|rest| rest.strip_suffix(')'))
                .ok_or_else(|| crate::DomainError::parse(format!("Unknown AC source: {}", s)))?
                .parse()
                .map(AcSource::Armor),
        }
    }
}

impl Serialize for AcSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AcSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Slot counts for spell levels 1..=9.
///
/// Serialized as a mapping `"1"`..`"9"` → count, always with all nine keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpellSlots([u8; 9]);

impl SpellSlots {
    pub fn new(slots: [u8; 9]) -> Self {
        Self(slots)
    }

    /// Slots of the given spell level (1-based); 0 outside 1..=9.
    pub fn get(&self, level: usize) -> u8 {
        match level {
            1..=9 => self.0[level - 1],
            _ => 0,
        }
    }

    pub fn set(&mut self, level: usize, count: u8) {
        if (1..=9).contains(&level) {
            self.0[level - 1] = count;
        }
    }

    /// Element-wise sum.
    pub fn add(&self, other: &SpellSlots) -> SpellSlots {
        let mut out = self.0;
        for (slot, extra) in out.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_add(*extra);
        }
        SpellSlots(out)
    }

    /// Element-wise maximum.
    pub fn max_with(&self, other: &SpellSlots) -> SpellSlots {
        let mut out = self.0;
        for (slot, theirs) in out.iter_mut().zip(other.0.iter()) {
            *slot = (*slot).max(*theirs);
        }
        SpellSlots(out)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }
}

impl Serialize for SpellSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<String, u8> = (1..=9usize)
            .map(|level| (level.to_string(), self.get(level)))
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpellSlots {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, u8>::deserialize(deserializer)?;
        let mut slots = SpellSlots::default();
        for (key, count) in map {
            let level: usize = key
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("bad spell level: {}", key)))?;
            slots.set(level, count);
        }
        Ok(slots)
    }
}

/// Aggregate spellcasting across classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellcastingSummary {
    /// Summed over every non-pact class
    pub slots: SpellSlots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pact_slots: Option<SpellSlots>,
    /// One block per casting class, ordered by class name
    pub classes: Vec<ClassSpellcasting>,
}

/// Spellcasting block for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpellcasting {
    pub class: String,
    pub caster_type: CasterType,
    pub class_level: i32,
    pub spellcasting_ability: Ability,
    pub spell_save_dc: i32,
    pub spell_attack_mod: i32,
    pub slots: SpellSlots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_spells: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_spells: Option<Vec<String>>,
}

/// Derived view of one companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub ability_scores: BTreeMap<Ability, i32>,
    pub ability_mods: BTreeMap<Ability, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    pub bonuses: crate::entities::CompanionBonuses,
}

/// Party-wide benefits collected from all companions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyBonuses {
    pub help_action: bool,
    pub shared_senses: Vec<String>,
}
