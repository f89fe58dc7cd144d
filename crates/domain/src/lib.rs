//! DnDCS domain layer.
//!
//! Holds the character data model consumed by rule modules, the derived
//! statistics they produce, and the D&D 5e arithmetic shared between
//! rulesets. Nothing in this crate touches the filesystem.

pub mod derived;
pub mod entities;
pub mod error;
pub mod game_systems;

// Re-export all entities (explicit list in entities/mod.rs)
pub use entities::{
    Ability, AbilityChoices, AbilityScore, ArmorCategory, ArmorDescriptor, Character,
    ClassSpellState, Companion, CompanionBonuses, Feat, FeatPrerequisites, FeatProps, Item,
    ItemProps, ProficiencyPrerequisites, Proficiencies, Skill, SpellList, Spellbook,
    SpellcastingState,
};

pub use derived::{
    AcBreakdown, AcSource, ArmorClass, ClassSpellcasting, CompanionSummary, DerivedStats,
    PartyBonuses, SpellSlots, SpellcastingSummary,
};

pub use error::DomainError;

// Re-export game system traits and 5e arithmetic
pub use game_systems::{
    ability_modifier, ability_modifiers, average_hit_points, caster_type, clamp_level,
    effective_scores, max_prepared_spells, proficiency_bonus, progression_slots, resolve_armor_class,
    save_bonus_totals, saving_throws, skill_ability, skill_total, spellcasting_ability, spells_known,
    uses_spell_preparation, CasterType, RulesModule, MAX_LEVEL, SAVE_BONUS_ALL,
};
