//! Class, feat and companion tables for the stock 5e ruleset.
//!
//! The tables shipped in `rulesets/fivee_stock/` are embedded at build time
//! so the ruleset works without its directory on disk. Units loaded from a
//! module's subsystems (or its entry unit) are merged on top, keyed
//! case-insensitively by name; later units override earlier ones.

use std::collections::{BTreeMap, BTreeSet};

use dndcs_domain::{
    Ability, ArmorCategory, CompanionBonuses, FeatPrerequisites, FeatProps,
};
use serde::{Deserialize, Serialize};

use crate::error::LoaderResult;
use crate::modules::Unit;

/// Exported table names recognized in units.
pub const CLASSES_TABLE: &str = "CLASSES";
pub const FEATS_TABLE: &str = "FEATS";
pub const COMPANIONS_TABLE: &str = "COMPANIONS";

const EMBEDDED_UNITS: [(&str, &str); 3] = [
    (
        "classes/basic",
        include_str!("../../../rulesets/fivee_stock/classes/basic.yaml"),
    ),
    (
        "feats/basic",
        include_str!("../../../rulesets/fivee_stock/feats/basic.yaml"),
    ),
    (
        "companions/basic",
        include_str!("../../../rulesets/fivee_stock/companions/basic.yaml"),
    ),
];

/// One row of the class table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub hit_die: i32,
    #[serde(default)]
    pub saving_throws: Vec<Ability>,
    #[serde(default)]
    pub armor_proficiencies: Vec<ArmorCategory>,
    #[serde(default)]
    pub shield_proficiency: bool,
    /// Unlock level → feature names
    #[serde(default)]
    pub features: BTreeMap<u8, Vec<String>>,
}

impl ClassDef {
    /// Features unlocked at or below `level`, in table order.
    pub fn features_up_to(&self, level: i32) -> Vec<String> {
        self.features
            .iter()
            .filter(|(unlock, _)| i32::from(**unlock) <= level)
            .flat_map(|(_, names)| names.iter().cloned())
            .collect()
    }
}

/// Stock definition of a feat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: FeatPrerequisites,
    #[serde(default)]
    pub props: FeatProps,
}

/// Stat block a companion can be built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanionTemplate {
    #[serde(default)]
    pub abilities: BTreeMap<Ability, i32>,
    #[serde(default)]
    pub ac: Option<i32>,
    #[serde(default)]
    pub hit_points: Option<i32>,
    #[serde(default)]
    pub bonuses: CompanionBonuses,
}

/// Lookup tables, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockTables {
    classes: BTreeMap<String, ClassDef>,
    feats: BTreeMap<String, FeatDef>,
    companions: BTreeMap<String, CompanionTemplate>,
}

impl StockTables {
    /// Tables compiled into the crate.
    pub fn embedded() -> LoaderResult<Self> {
        let mut tables = Self::default();
        for (name, content) in EMBEDDED_UNITS {
            tables.absorb(&Unit::from_yaml(name, content)?)?;
        }
        Ok(tables)
    }

    /// Merge every table `unit` exports over the current entries.
    pub fn absorb(&mut self, unit: &Unit) -> LoaderResult<()> {
        if let Some(classes) = unit.export_as::<BTreeMap<String, ClassDef>>(CLASSES_TABLE)? {
            self.classes
                .extend(classes.into_iter().map(|(name, def)| (name.to_lowercase(), def)));
        }
        if let Some(feats) = unit.export_as::<Vec<FeatDef>>(FEATS_TABLE)? {
            self.feats
                .extend(feats.into_iter().map(|def| (def.name.to_lowercase(), def)));
        }
        if let Some(companions) =
            unit.export_as::<BTreeMap<String, CompanionTemplate>>(COMPANIONS_TABLE)?
        {
            self.companions
                .extend(companions.into_iter().map(|(name, t)| (name.to_lowercase(), t)));
        }
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(&name.trim().to_lowercase())
    }

    pub fn feat(&self, name: &str) -> Option<&FeatDef> {
        self.feats.get(&name.trim().to_lowercase())
    }

    pub fn companion(&self, name: &str) -> Option<&CompanionTemplate> {
        self.companions.get(&name.trim().to_lowercase())
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    pub fn feat_names(&self) -> Vec<&str> {
        self.feats.values().map(|f| f.name.as_str()).collect()
    }

    /// Armor categories a class grants.
    pub fn class_armor(&self, class: Option<&str>) -> BTreeSet<ArmorCategory> {
        class
            .and_then(|c| self.class(c))
            .map(|def| def.armor_proficiencies.iter().copied().collect())
            .unwrap_or_default()
    }
}
