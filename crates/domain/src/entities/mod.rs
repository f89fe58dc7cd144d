//! Character data model - the raw attributes a rules module derives from

mod ability;
mod character;
mod companion;
mod feat;
mod item;
mod spellcasting;

pub use ability::{Ability, AbilityScore};
pub use character::{Character, Proficiencies, Skill};
pub use companion::{Companion, CompanionBonuses};
pub use feat::{AbilityChoices, Feat, FeatPrerequisites, FeatProps, ProficiencyPrerequisites};
pub use item::{ArmorCategory, ArmorDescriptor, Item, ItemProps, Spellbook};
pub use spellcasting::{ClassSpellState, SpellList, SpellcastingState};
