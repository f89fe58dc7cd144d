//! Stock D&D 5e ruleset.
//!
//! Built from the embedded Basic Rules tables plus whatever the module's
//! subsystems (and entry unit) add on top. See `tables` for the data
//! layout and `spellcasting` for multiclass slot aggregation.

mod companions;
mod spellcasting;
pub mod tables;

use std::collections::{BTreeMap, BTreeSet};

use dndcs_domain::{
    ability_modifiers, average_hit_points, clamp_level, effective_scores, proficiency_bonus,
    resolve_armor_class, save_bonus_totals, saving_throws, skill_total, Ability, ArmorCategory,
    Character, DerivedStats, FeatProps, RulesModule, Skill, MAX_LEVEL,
};
use tracing::debug;

use crate::error::LoaderResult;
use crate::modules::{ModuleBase, ModuleContext, RuleModuleManifest};

pub use tables::{ClassDef, CompanionTemplate, FeatDef, StockTables};

/// Skills every 5e character starts with.
const STOCK_SKILLS: [(&str, Ability); 18] = [
    ("Athletics", Ability::Str),
    ("Acrobatics", Ability::Dex),
    ("Sleight of Hand", Ability::Dex),
    ("Stealth", Ability::Dex),
    ("Arcana", Ability::Int),
    ("History", Ability::Int),
    ("Investigation", Ability::Int),
    ("Nature", Ability::Int),
    ("Religion", Ability::Int),
    ("Animal Handling", Ability::Wis),
    ("Insight", Ability::Wis),
    ("Medicine", Ability::Wis),
    ("Perception", Ability::Wis),
    ("Survival", Ability::Wis),
    ("Deception", Ability::Cha),
    ("Intimidation", Ability::Cha),
    ("Performance", Ability::Cha),
    ("Persuasion", Ability::Cha),
];

const TEMPLATE_SCORE: i32 = 10;

/// The stock 5e rules module.
#[derive(Debug, Clone)]
pub struct FiveEStockModule {
    base: ModuleBase,
    tables: StockTables,
}

impl FiveEStockModule {
    /// Class name manifests use in their entry point.
    pub const CLASS_NAME: &'static str = "FiveEStockModule";

    /// Import paths that export [`Self::CLASS_NAME`].
    pub const IMPORT_PATHS: [&'static str; 2] = [
        "dndcs_rulesets.fivee_stock.module",
        "dndcs.modules.fivee_stock.module",
    ];

    pub const DEFAULT_ID: &'static str = "fivee_stock";

    /// Build the ruleset for a manifest, layering its units over the
    /// embedded tables.
    pub fn from_context(ctx: ModuleContext) -> LoaderResult<Self> {
        let base = ModuleBase::new(ctx.manifest)?;
        let mut tables = StockTables::embedded()?;
        for unit in base.units() {
            tables.absorb(unit)?;
        }
        if let Some(unit) = &ctx.entry_unit {
            tables.absorb(unit)?;
        }
        debug!(
            module = %base.id(),
            classes = tables.class_names().len(),
            feats = tables.feat_names().len(),
            "Stock tables ready"
        );
        Ok(Self { base, tables })
    }

    /// The ruleset with only its embedded tables, under the default id.
    pub fn standalone() -> LoaderResult<Self> {
        let entry_point = format!("{}:{}", Self::IMPORT_PATHS[0], Self::CLASS_NAME);
        let manifest = RuleModuleManifest::new(Self::DEFAULT_ID, entry_point);
        Self::from_context(ModuleContext::new(manifest))
    }

    pub fn tables(&self) -> &StockTables {
        &self.tables
    }

    /// Stock props merged with each feat's own props, character winning.
    fn feat_props(&self, character: &Character) -> Vec<FeatProps> {
        character
            .feats
            .iter()
            .map(|feat| match self.tables.feat(&feat.name) {
                Some(stock) => stock.props.merged_with(&feat.props),
                None => feat.props.clone(),
            })
            .collect()
    }

    /// Armor categories from the class table and every feat except the one
    /// at `skip`.
    fn granted_armor(
        &self,
        character: &Character,
        props: &[FeatProps],
        skip: usize,
    ) -> BTreeSet<ArmorCategory> {
        let mut armor = self.tables.class_armor(character.class_name.as_deref());
        for (i, feat) in props.iter().enumerate() {
            if i != skip {
                armor.extend(feat.armor_proficiencies.iter().copied());
            }
        }
        armor
    }

    fn skills_for(&self, character: &Character) -> Vec<Skill> {
        let mut skills = self.template_skills();
        for skill in &character.skills {
            match skills
                .iter_mut()
                .find(|s| s.name.eq_ignore_ascii_case(&skill.name))
            {
                Some(existing) => *existing = skill.clone(),
                None => skills.push(skill.clone()),
            }
        }
        skills
    }
}

impl RulesModule for FiveEStockModule {
    fn id(&self) -> &str {
        let id = self.base.id();
        if id.is_empty() {
            Self::DEFAULT_ID
        } else {
            id
        }
    }

    fn display_name(&self) -> &str {
        self.base.manifest().display_name()
    }

    fn template_abilities(&self) -> BTreeMap<Ability, i32> {
        Ability::ALL.iter().map(|a| (*a, TEMPLATE_SCORE)).collect()
    }

    fn template_skills(&self) -> Vec<Skill> {
        STOCK_SKILLS
            .iter()
            .map(|(name, ability)| Skill::new(*name, *ability))
            .collect()
    }

    fn validate(&self, character: &Character) -> Vec<String> {
        let mut issues = Vec::new();

        if !(1..=MAX_LEVEL).contains(&character.level) {
            issues.push("Level must be 1..20 for this module.".to_string());
        }

        for ability in Ability::ALL {
            if character.score(ability).is_none() {
                issues.push(format!("Missing ability: {}", ability));
            }
        }

        let class_levels: i64 = character
            .spellcasting
            .classes
            .values()
            .map(|level| i64::from(*level))
            .sum();
        if class_levels > i64::from(character.level) {
            issues.push(format!(
                "Class levels total {} but character level is {}",
                class_levels, character.level
            ));
        }

        let raw = character.raw_scores();
        let props = self.feat_props(character);
        for (i, feat) in character.feats.iter().enumerate() {
            let Some(stock) = self.tables.feat(&feat.name) else {
                continue;
            };
            let armor = self.granted_armor(character, &props, i);
            issues.extend(stock.prerequisites.unmet(&feat.name, &raw, &armor));
        }

        issues
    }

    fn derive(&self, character: &Character) -> DerivedStats {
        let pb = proficiency_bonus(character.level);
        let feats = self.feat_props(character);
        let items: Vec<_> = character.items.iter().map(|item| &item.props).collect();

        let scores = effective_scores(
            &character.raw_scores(),
            feats
                .iter()
                .map(|f| &f.ability_bonuses)
                .chain(items.iter().map(|p| &p.ability_bonuses)),
        );
        let mods = ability_modifiers(&scores);
        let class = character
            .class_name
            .as_deref()
            .and_then(|name| self.tables.class(name));

        // Saving throws
        let mut proficient: BTreeSet<Ability> = class
            .map(|c| c.saving_throws.iter().copied().collect())
            .unwrap_or_default();
        proficient.extend(
            Ability::ALL
                .iter()
                .copied()
                .filter(|ability| character.proficiencies.has_save(*ability)),
        );
        proficient.extend(feats.iter().flat_map(|f| f.saving_throw_proficiencies.iter().copied()));
        proficient.extend(items.iter().flat_map(|p| p.saving_throw_proficiencies.iter().copied()));

        let save_bonuses = save_bonus_totals(
            items
                .iter()
                .map(|p| &p.saving_throw_bonuses)
                .chain(feats.iter().map(|f| &f.saving_throw_bonuses)),
        );
        let saves = saving_throws(&mods, pb, &proficient, &save_bonuses);

        let dex = mods.get(&Ability::Dex).copied().unwrap_or(0);
        let ac = resolve_armor_class(&character.items, dex);

        // Skills
        let mut skill_profs = character.proficiencies.clone();
        skill_profs.skills.extend(
            feats
                .iter()
                .flat_map(|f| f.skill_proficiencies.iter())
                .chain(items.iter().flat_map(|p| p.skill_proficiencies.iter()))
                .cloned(),
        );
        let skills = self
            .skills_for(character)
            .into_iter()
            .map(|skill| {
                let proficient = skill_profs.has_skill(&skill.name);
                let total = skill_total(&mods, skill.ability, pb, proficient);
                (skill.name, total)
            })
            .collect();

        let mut derived = DerivedStats {
            proficiency_bonus: pb,
            ability_scores: scores,
            saving_throws: saves,
            saving_throw_proficiencies: Ability::ALL
                .iter()
                .map(|a| (*a, proficient.contains(a)))
                .collect(),
            saving_throw_bonuses: save_bonuses,
            ac,
            skills,
            ..Default::default()
        };

        if let Some(class) = class {
            let level = clamp_level(character.level);
            let con = mods.get(&Ability::Con).copied().unwrap_or(0);
            let per_level = feats
                .iter()
                .filter_map(|f| f.hp_per_level)
                .fold(0i32, i32::saturating_add);
            derived.hit_points = Some(
                average_hit_points(class.hit_die, level, con)
                    .saturating_add(per_level.saturating_mul(level)),
            );
            derived.hit_dice = Some(format!("{}d{}", level, class.hit_die));
            derived.class_features = Some(class.features_up_to(character.level));
        }

        derived.spellcasting = spellcasting::summarize(character, &mods, pb);
        let (companions, bonuses) = companions::summarize(&character.companions, &self.tables);
        derived.companions = companions;
        derived.bonuses = bonuses;
        derived.ability_mods = mods;

        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dndcs_domain::{AcSource, Companion, Feat, Item, ItemProps, SpellcastingState};
    use tempfile::TempDir;

    fn module() -> FiveEStockModule {
        FiveEStockModule::standalone().expect("stock module")
    }

    fn fighter(level: i32) -> Character {
        Character::new("Brakka", level)
            .with_class("fighter")
            .with_all_abilities(10)
    }

    #[test]
    fn templates_cover_abilities_and_skills() {
        let module = module();
        assert_eq!(module.id(), "fivee_stock");
        assert_eq!(module.template_abilities().len(), 6);
        assert!(module.template_abilities().values().all(|s| *s == 10));
        assert_eq!(module.template_skills().len(), 18);
    }

    #[test]
    fn validate_reports_level_and_missing_abilities() {
        let module = module();
        let character = Character::new("Nobody", 0).with_ability(Ability::Str, 10);

        let issues = module.validate(&character);
        assert!(issues.contains(&"Level must be 1..20 for this module.".to_string()));
        assert!(issues.contains(&"Missing ability: DEX".to_string()));
        assert!(!issues.contains(&"Missing ability: STR".to_string()));
        assert_eq!(module.validate(&character), issues);
    }

    #[test]
    fn valid_character_has_no_issues() {
        assert!(module().validate(&fighter(3)).is_empty());
    }

    #[test]
    fn feat_prerequisite_issue_names_the_feat() {
        let module = module();
        let character = fighter(1).with_feat(Feat::new("athlete"));
        let issues = module.validate(&character);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("athlete"));
    }

    #[test]
    fn armor_prerequisite_uses_class_and_other_feats() {
        let module = module();
        let wizard = Character::new("Ilse", 4)
            .with_class("wizard")
            .with_all_abilities(10)
            .with_feat(Feat::new("Heavily Armored"));
        let issues = module.validate(&wizard);
        assert_eq!(
            issues,
            vec!["Feat 'Heavily Armored' requires medium armor proficiency".to_string()]
        );

        let trained = wizard.with_feat(Feat::new("Moderately Armored"));
        let issues = module.validate(&trained);
        assert_eq!(
            issues,
            vec!["Feat 'Moderately Armored' requires light armor proficiency".to_string()]
        );

        assert!(module.validate(&fighter(4).with_feat(Feat::new("Heavily Armored"))).is_empty());
    }

    #[test]
    fn multiclass_levels_cannot_exceed_character_level() {
        let module = module();
        let character = fighter(3).with_spellcasting(
            dndcs_domain::SpellcastingState::default()
                .with_class_level("wizard", 3)
                .with_class_level("cleric", 1),
        );
        let issues = module.validate(&character);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("4"));
    }

    #[test]
    fn feat_ability_bonus_feeds_modifiers() {
        let module = module();
        let character = fighter(1)
            .with_ability(Ability::Str, 15)
            .with_feat(Feat::new("Athlete").with_props(FeatProps {
                ability_bonuses: BTreeMap::from([(Ability::Str, 1)]),
                ..Default::default()
            }));
        let derived = module.derive(&character);
        assert_eq!(derived.ability_scores.get(&Ability::Str), Some(&16));
        assert_eq!(derived.ability_mods.get(&Ability::Str), Some(&3));
    }

    #[test]
    fn skilled_feat_grants_chosen_skills() {
        let module = module();
        let character = fighter(1).with_feat(Feat::new("Skilled").with_props(FeatProps {
            skill_proficiencies: vec!["arcana".into(), "Athletics".into(), "Stealth".into()],
            ..Default::default()
        }));
        let derived = module.derive(&character);
        for skill in ["Arcana", "Athletics", "Stealth"] {
            assert_eq!(derived.skills.get(skill), Some(&derived.proficiency_bonus), "{skill}");
        }
        assert_eq!(derived.skills.get("History"), Some(&0));
    }

    #[test]
    fn sheet_proficiencies_count_case_insensitively() {
        let module = module();
        let mut character = fighter(1).with_ability(Ability::Int, 14);
        character.proficiencies.skills = vec!["ARCANA".into()];
        character.proficiencies.saving_throws =
            BTreeMap::from([(Ability::Int, true), (Ability::Dex, false)]);
        let derived = module.derive(&character);

        assert_eq!(derived.skills.get("Arcana"), Some(&(2 + 2)));
        assert_eq!(derived.saving_throw_proficiencies.get(&Ability::Int), Some(&true));
        assert_eq!(derived.saving_throw_proficiencies.get(&Ability::Dex), Some(&false));
        assert_eq!(derived.saving_throws.get(&Ability::Int), Some(&(2 + 2)));
    }

    #[test]
    fn character_skill_overrides_template_ability() {
        let module = module();
        let character = fighter(1)
            .with_ability(Ability::Cha, 16)
            .with_skill(Skill::new("athletics", Ability::Cha))
            .with_skill(Skill::new("Smithing", Ability::Str));
        let derived = module.derive(&character);

        assert_eq!(derived.skills.get("athletics"), Some(&3));
        assert!(!derived.skills.contains_key("Athletics"));
        assert_eq!(derived.skills.get("Smithing"), Some(&0));
        assert_eq!(derived.skills.len(), 19);
    }

    #[test]
    fn item_bonus_and_save_proficiency() {
        let module = module();
        let belt = Item::new("Belt of Strength").with_props(ItemProps {
            ability_bonuses: BTreeMap::from([(Ability::Str, 2)]),
            saving_throw_proficiencies: vec![Ability::Str],
            ..Default::default()
        });
        let character = Character::new("Ilse", 1)
            .with_class("wizard")
            .with_all_abilities(10)
            .with_item(belt);
        let derived = module.derive(&character);

        assert_eq!(derived.ability_mods.get(&Ability::Str), Some(&1));
        assert_eq!(derived.saving_throw_proficiencies.get(&Ability::Str), Some(&true));
        assert_eq!(derived.saving_throws.get(&Ability::Str), Some(&(1 + derived.proficiency_bonus)));
    }

    #[test]
    fn cloak_adds_to_every_save() {
        let module = module();
        let cloak = Item::new("Cloak of Protection").with_props(ItemProps {
            saving_throw_bonuses: BTreeMap::from([("ALL".to_string(), 1)]),
            ..Default::default()
        });
        let character = fighter(1).with_ability(Ability::Str, 16).with_item(cloak);
        let derived = module.derive(&character);

        assert_eq!(derived.saving_throw_bonuses.get("all"), Some(&1));
        assert_eq!(derived.saving_throws.get(&Ability::Str), Some(&(3 + 2 + 1)));
        assert_eq!(derived.saving_throws.get(&Ability::Wis), Some(&1));
    }

    #[test]
    fn class_features_and_hit_points() {
        let module = module();
        let character = fighter(5)
            .with_ability(Ability::Con, 14)
            .with_feat(Feat::new("tough"));
        let derived = module.derive(&character);

        // 10 + 2 + 4 * (6 + 2), then Tough
        assert_eq!(derived.hit_points, Some(44 + 10));
        assert_eq!(derived.hit_dice.as_deref(), Some("5d10"));
        let features = derived.class_features.expect("features");
        assert!(features.contains(&"Extra Attack".to_string()));
        assert!(features.contains(&"Second Wind".to_string()));
    }

    #[test]
    fn unknown_class_derives_without_class_data() {
        let module = module();
        let character = Character::new("Odd", 3)
            .with_class("artificer")
            .with_all_abilities(10);
        let derived = module.derive(&character);

        assert!(derived.hit_points.is_none());
        assert!(derived.class_features.is_none());
        assert!(derived.spellcasting.is_none());
        assert!(derived.saving_throw_proficiencies.values().all(|p| !p));
    }

    #[test]
    fn armor_class_from_items() {
        let module = module();
        let mage_armor = Item::new("Mage Armor").with_props(ItemProps {
            ac_base: Some(13),
            ..Default::default()
        });
        let character = fighter(1)
            .with_ability(Ability::Dex, 16)
            .with_item(mage_armor);
        let derived = module.derive(&character);

        assert_eq!(derived.ac.value, 16);
        assert_eq!(derived.ac.source, AcSource::MageArmor);
    }

    #[test]
    fn familiar_grants_party_bonuses() {
        let module = module();
        let character = Character::new("Ilse", 1)
            .with_class("wizard")
            .with_all_abilities(10)
            .with_companion(Companion::new("Hoot").with_template("owl"));
        let derived = module.derive(&character);

        assert_eq!(derived.companions[0].ability_mods.get(&Ability::Dex), Some(&2));
        let bonuses = derived.bonuses.expect("party bonuses");
        assert!(bonuses.help_action);
        assert!(bonuses.shared_senses.contains(&"darkvision".to_string()));
    }

    #[test]
    fn derive_survives_invalid_characters() {
        let module = module();
        let derived = module.derive(&Character::new("Blank", -3));
        assert_eq!(derived.proficiency_bonus, 2);
        assert_eq!(derived.ac.value, 10);
        assert!(derived.hit_points.is_none());
    }

    #[test]
    fn huge_levels_derive_at_the_level_cap() {
        let module = module();
        let huge = Character::new("Huge", 2_000_000_000)
            .with_class("fighter")
            .with_all_abilities(10)
            .with_feat(Feat::new("Tough"));
        let capped = Character {
            level: 20,
            ..huge.clone()
        };

        let derived = module.derive(&huge);
        assert_eq!(derived.hit_points, module.derive(&capped).hit_points);
        // 10 + 19 * 6, then Tough at 2 per level
        assert_eq!(derived.hit_points, Some(124 + 40));
        assert_eq!(derived.hit_dice.as_deref(), Some("20d10"));
        assert_eq!(derived.proficiency_bonus, 6);
        assert!(module
            .validate(&huge)
            .contains(&"Level must be 1..20 for this module.".to_string()));
    }

    #[test]
    fn oversized_class_levels_are_still_compared() {
        let module = module();
        let character = Character::new("Sum", 20)
            .with_class("wizard")
            .with_all_abilities(10)
            .with_spellcasting(
                SpellcastingState::default()
                    .with_class_level("wizard", i32::MAX)
                    .with_class_level("cleric", 1),
            );

        let issues = module.validate(&character);
        assert!(issues.contains(&format!(
            "Class levels total {} but character level is 20",
            i64::from(i32::MAX) + 1
        )));

        let sc = module.derive(&character).spellcasting.expect("casts");
        assert_eq!(sc.slots.get(9), 1);
    }

    #[test]
    fn subsystem_units_extend_stock_tables() {
        let temp_dir = TempDir::new().expect("temp dir");
        let feats = temp_dir.path().join("feats");
        std::fs::create_dir_all(&feats).expect("feats dir");
        std::fs::write(
            feats.join("homebrew.yaml"),
            "FEATS:\n  - name: Stubborn\n    props:\n      saving_throw_proficiencies: [WIS]\n",
        )
        .expect("write unit");

        let manifest = RuleModuleManifest::new("homebrew5e", "x:FiveEStockModule")
            .with_manifest_dir(temp_dir.path())
            .with_subsystems(&["feats"]);
        let module =
            FiveEStockModule::from_context(ModuleContext::new(manifest)).expect("module");
        assert_eq!(module.id(), "homebrew5e");

        let derived = module.derive(&fighter(1).with_feat(Feat::new("stubborn")));
        assert_eq!(derived.saving_throw_proficiencies.get(&Ability::Wis), Some(&true));
    }

    #[test]
    fn entry_unit_is_absorbed_last() {
        let unit = crate::modules::Unit::from_yaml(
            "rules",
            "CLASSES:\n  fighter:\n    hit_die: 12\n    saving_throws: [STR, CON]\n",
        )
        .expect("unit");
        let mut ctx = ModuleContext::new(RuleModuleManifest::new("big5e", "rules:FiveEStockModule"));
        ctx.entry_unit = Some(unit);
        let module = FiveEStockModule::from_context(ctx).expect("module");

        let derived = module.derive(&fighter(1));
        assert_eq!(derived.hit_dice.as_deref(), Some("1d12"));
        assert_eq!(derived.class_features, Some(Vec::new()));
    }
}
