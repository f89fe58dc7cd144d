//! Item entity - equipment carried by a character
//!
//! Items affect derivation only through their property bag. Each known effect
//! kind is its own optional field; anything else is kept in `extra` so newer
//! payloads survive a round trip through older modules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::spellcasting::SpellList;
use crate::error::DomainError;

/// Something a character carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub props: ItemProps,
}

fn default_quantity() -> u32 {
    1
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            props: ItemProps::default(),
        }
    }

    pub fn with_props(mut self, props: ItemProps) -> Self {
        self.props = props;
        self
    }

    /// Whether this item is a spellbook, either by name or by carrying one.
    pub fn is_spellbook(&self) -> bool {
        self.props.spellbook.is_some() || self.name.eq_ignore_ascii_case("spellbook")
    }
}

/// Typed property bag for items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemProps {
    /// Worn armor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorDescriptor>,

    /// Bonus added on top of the chosen base AC (shields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_bonus: Option<i32>,

    /// Alternative base AC when no armor is worn (13 = mage armor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac_base: Option<i32>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ability_bonuses: BTreeMap<Ability, i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_proficiencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saving_throw_proficiencies: Vec<Ability>,

    /// Keyed by `"all"` or an ability code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub saving_throw_bonuses: BTreeMap<String, i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellbook: Option<Spellbook>,

    /// Unknown/extension properties
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Armor category; heavy armor ignores DEX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorCategory {
    #[default]
    Light,
    Medium,
    Heavy,
}

impl ArmorCategory {
    /// Whether the DEX modifier contributes to AC in this category.
    pub fn allows_dex(&self) -> bool {
        matches!(self, ArmorCategory::Light | ArmorCategory::Medium)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmorCategory::Light => "light",
            ArmorCategory::Medium => "medium",
            ArmorCategory::Heavy => "heavy",
        }
    }
}

impl fmt::Display for ArmorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmorCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "medium" => Ok(Self::Medium),
            "heavy" => Ok(Self::Heavy),
            _ => Err(DomainError::parse(format!("Unknown armor category: {}", s))),
        }
    }
}

/// Armor stats carried in an item's `armor` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorDescriptor {
    #[serde(default = "default_armor_base")]
    pub base: i32,
    #[serde(default)]
    pub category: ArmorCategory,
    /// Maximum DEX contribution (medium armor); `None` means uncapped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex_cap: Option<i32>,
}

fn default_armor_base() -> i32 {
    10
}

impl ArmorDescriptor {
    pub fn new(base: i32, category: ArmorCategory, dex_cap: Option<i32>) -> Self {
        Self {
            base,
            category,
            dex_cap,
        }
    }

    /// AC this armor yields for the given DEX modifier.
    pub fn armor_class(&self, dex_mod: i32) -> i32 {
        if !self.category.allows_dex() {
            return self.base;
        }
        let dex_part = match self.dex_cap {
            Some(cap) => dex_mod.min(cap),
            None => dex_mod,
        };
        self.base.saturating_add(dex_part)
    }
}

/// Contents of a wizard's spellbook item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spellbook {
    #[serde(default)]
    pub prepared: SpellList,
}
