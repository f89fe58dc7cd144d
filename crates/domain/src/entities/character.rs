//! Character entity - the raw sheet a rules module validates and derives from
//!
//! The character stores only what a player enters. Everything computed
//! (modifiers, AC, slots) lives in [`crate::DerivedStats`] and is rebuilt on
//! every derivation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityScore};
use super::companion::Companion;
use super::feat::Feat;
use super::item::Item;
use super::spellcasting::SpellcastingState;
use crate::error::DomainError;

/// A skill and the ability that governs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub ability: Ability,
}

impl Skill {
    pub fn new(name: impl Into<String>, ability: Ability) -> Self {
        Self {
            name: name.into(),
            ability,
        }
    }
}

/// Proficiencies entered directly on the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proficiencies {
    #[serde(default)]
    pub saving_throws: BTreeMap<Ability, bool>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Proficiencies {
    pub fn has_save(&self, ability: Ability) -> bool {
        self.saving_throws.get(&ability).copied().unwrap_or(false)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}

/// A player character.
///
/// # Design Decision
///
/// Public fields: the sheet is a data-transfer shape with no invariants the
/// type could protect. Out-of-range levels or missing abilities are reported
/// by the rules module's `validate`, never rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub level: i32,
    /// Rules module id; empty means "use the configured default"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(
        default,
        rename = "class",
        alias = "class_",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_dice: Option<String>,
    #[serde(default)]
    pub abilities: BTreeMap<Ability, AbilityScore>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub feats: Vec<Feat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub proficiencies: Proficiencies,
    #[serde(default, skip_serializing_if = "SpellcastingState::is_empty")]
    pub spellcasting: SpellcastingState,
    #[serde(default)]
    pub companions: Vec<Companion>,
}

impl Character {
    pub fn new(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            level,
            module: String::new(),
            class_name: None,
            subclass: None,
            race: None,
            background: None,
            alignment: None,
            hit_points: None,
            hit_dice: None,
            abilities: BTreeMap::new(),
            skills: Vec::new(),
            items: Vec::new(),
            feats: Vec::new(),
            notes: None,
            proficiencies: Proficiencies::default(),
            spellcasting: SpellcastingState::default(),
            companions: Vec::new(),
        }
    }

    // Builder methods

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }

    pub fn with_ability(mut self, ability: Ability, score: i32) -> Self {
        self.abilities
            .insert(ability, AbilityScore::new(ability, score));
        self
    }

    /// Set all six abilities to `score`.
    pub fn with_all_abilities(mut self, score: i32) -> Self {
        for ability in Ability::ALL {
            self = self.with_ability(ability, score);
        }
        self
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_feat(mut self, feat: Feat) -> Self {
        self.feats.push(feat);
        self
    }

    pub fn with_companion(mut self, companion: Companion) -> Self {
        self.companions.push(companion);
        self
    }

    pub fn with_spellcasting(mut self, spellcasting: SpellcastingState) -> Self {
        self.spellcasting = spellcasting;
        self
    }

    /// Raw score for an ability, if the sheet has one.
    pub fn score(&self, ability: Ability) -> Option<i32> {
        self.abilities.get(&ability).map(|a| a.score)
    }

    /// Raw scores for the abilities present on the sheet.
    pub fn raw_scores(&self) -> BTreeMap<Ability, i32> {
        self.abilities
            .iter()
            .map(|(ability, score)| (*ability, score.score))
            .collect()
    }

    /// Whether the primary class matches `class` (case-insensitive).
    pub fn is_class(&self, class: &str) -> bool {
        self.class_name
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(class))
    }

    /// Parse a character from JSON, reporting shape errors as
    /// [`DomainError::InvalidCharacter`].
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DomainError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
