//! Feats taken by a character and the prerequisites a ruleset attaches to them.
//!
//! A character's feat carries only a name and optional property overrides;
//! the rules module supplies stock properties and prerequisites, looked up by
//! name, and merges the two with [`FeatProps::merged_with`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::item::ArmorCategory;

/// A feat as recorded on a character sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    #[serde(default)]
    pub props: FeatProps,
}

impl Feat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: FeatProps::default(),
        }
    }

    pub fn with_props(mut self, props: FeatProps) -> Self {
        self.props = props;
        self
    }
}

/// Typed property bag for feats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatProps {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ability_bonuses: BTreeMap<Ability, i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_proficiencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saving_throw_proficiencies: Vec<Ability>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub saving_throw_bonuses: BTreeMap<String, i32>,

    /// Extra hit points per character level (Tough)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_per_level: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub armor_proficiencies: Vec<ArmorCategory>,

    /// An ability increase the player still has to pick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_choices: Option<AbilityChoices>,

    /// Abilities the saving throw proficiency may be chosen from (Resilient)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saving_throw_choice: Vec<Ability>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_choice_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_proficiency: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_proficiency_count: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A pending "+N to one of these abilities" choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityChoices {
    pub abilities: Vec<Ability>,
    #[serde(default = "default_choice_amount")]
    pub amount: i32,
}

fn default_choice_amount() -> i32 {
    1
}

fn pick_map<K: Ord + Clone, V: Clone>(
    overrides: &BTreeMap<K, V>,
    stock: &BTreeMap<K, V>,
) -> BTreeMap<K, V> {
    if overrides.is_empty() {
        stock.clone()
    } else {
        overrides.clone()
    }
}

fn pick_vec<T: Clone>(overrides: &[T], stock: &[T]) -> Vec<T> {
    if overrides.is_empty() {
        stock.to_vec()
    } else {
        overrides.to_vec()
    }
}

impl FeatProps {
    /// Combine stock properties (`self`) with a character's overrides.
    ///
    /// Every field takes the override when it is present and non-empty,
    /// otherwise the stock value. `extra` keys are merged, overrides winning.
    pub fn merged_with(&self, overrides: &FeatProps) -> FeatProps {
        let mut extra = self.extra.clone();
        extra.extend(
            overrides
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        FeatProps {
            ability_bonuses: pick_map(&overrides.ability_bonuses, &self.ability_bonuses),
            skill_proficiencies: pick_vec(&overrides.skill_proficiencies, &self.skill_proficiencies),
            saving_throw_proficiencies: pick_vec(
                &overrides.saving_throw_proficiencies,
                &self.saving_throw_proficiencies,
            ),
            saving_throw_bonuses: pick_map(
                &overrides.saving_throw_bonuses,
                &self.saving_throw_bonuses,
            ),
            hp_per_level: overrides.hp_per_level.or(self.hp_per_level),
            armor_proficiencies: pick_vec(&overrides.armor_proficiencies, &self.armor_proficiencies),
            ability_choices: overrides
                .ability_choices
                .clone()
                .or_else(|| self.ability_choices.clone()),
            saving_throw_choice: pick_vec(&overrides.saving_throw_choice, &self.saving_throw_choice),
            skill_choice_count: overrides.skill_choice_count.or(self.skill_choice_count),
            shield_proficiency: overrides.shield_proficiency.or(self.shield_proficiency),
            weapon_proficiency_count: overrides
                .weapon_proficiency_count
                .or(self.weapon_proficiency_count),
            extra,
        }
    }
}

/// Requirements a character must meet to take a feat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatPrerequisites {
    /// Every listed minimum must be met
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ability_scores: BTreeMap<Ability, i32>,

    /// At least one listed minimum must be met
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ability_scores_any: BTreeMap<Ability, i32>,

    #[serde(default)]
    pub proficiencies: ProficiencyPrerequisites,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyPrerequisites {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub armor: Vec<ArmorCategory>,
}

impl FeatPrerequisites {
    pub fn is_empty(&self) -> bool {
        self.ability_scores.is_empty()
            && self.ability_scores_any.is_empty()
            && self.proficiencies.armor.is_empty()
    }

    /// One message per unmet requirement, each naming the feat.
    ///
    /// `scores` are raw ability scores (before any feat or item bonus) and
    /// `armor` is the set of armor categories granted from other sources.
    pub fn unmet(
        &self,
        feat_name: &str,
        scores: &BTreeMap<Ability, i32>,
        armor: &BTreeSet<ArmorCategory>,
    ) -> Vec<String> {
        let score_of = |ability: &Ability| scores.get(ability).copied().unwrap_or(0);
        let mut issues = Vec::new();

        for (ability, min) in &self.ability_scores {
            if score_of(ability) < *min {
                issues.push(format!("Feat '{}' requires {} {}", feat_name, ability, min));
            }
        }

        if !self.ability_scores_any.is_empty()
            && !self
                .ability_scores_any
                .iter()
                .any(|(ability, min)| score_of(ability) >= *min)
        {
            let options = self
                .ability_scores_any
                .iter()
                .map(|(ability, min)| format!("{} {}", ability, min))
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(format!("Feat '{}' requires one of {}", feat_name, options));
        }

        for category in &self.proficiencies.armor {
            if !armor.contains(category) {
                issues.push(format!(
                    "Feat '{}' requires {} armor proficiency",
                    feat_name, category
                ));
            }
        }

        issues
    }
}
