//! Companions (familiars, beasts) attached to a character.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ability::Ability;

/// A companion on a character sheet.
///
/// `template` names a stat block the rules module knows about; `abilities`
/// and `bonuses` override the template's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub abilities: BTreeMap<Ability, i32>,
    #[serde(default)]
    pub bonuses: CompanionBonuses,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Companion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: None,
            abilities: BTreeMap::new(),
            bonuses: CompanionBonuses::default(),
            notes: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Benefits a companion grants to the party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanionBonuses {
    /// The companion can take the Help action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_action: Option<bool>,
    /// Senses the owner can borrow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_senses: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CompanionBonuses {
    /// Overlay `self` on top of `base`; set fields in `self` win.
    pub fn merged_over(&self, base: &CompanionBonuses) -> CompanionBonuses {
        let mut extra = base.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        CompanionBonuses {
            help_action: self.help_action.or(base.help_action),
            shared_senses: self
                .shared_senses
                .clone()
                .or_else(|| base.shared_senses.clone()),
            extra,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.help_action.is_none() && self.shared_senses.is_none() && self.extra.is_empty()
    }
}
