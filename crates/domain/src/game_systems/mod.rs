//! Game system rules.
//!
//! `traits` defines the [`RulesModule`] contract every ruleset implements;
//! `dnd5e` holds the 5e formulas and tables rulesets build on.

mod dnd5e;
mod traits;

// D&D 5e exports
pub use dnd5e::{
    ability_modifier, ability_modifiers, average_hit_points, caster_type, clamp_level,
    effective_scores,
    max_prepared_spells, proficiency_bonus, progression_slots, resolve_armor_class,
    save_bonus_totals, saving_throws, skill_ability, skill_total, spellcasting_ability,
    spells_known, uses_spell_preparation, MAX_LEVEL, SAVE_BONUS_ALL,
};

// Core traits
pub use traits::{CasterType, RulesModule};
