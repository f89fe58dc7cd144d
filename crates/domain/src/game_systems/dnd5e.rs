//! D&D 5th Edition arithmetic.
//!
//! Stateless formulas and tables shared by every 5e ruleset: modifiers,
//! proficiency, armor class, saves, skills, hit points and spell slot
//! progressions. Ruleset-specific data (class tables, feats) lives with the
//! ruleset that owns it.

use std::collections::{BTreeMap, BTreeSet};

use super::traits::CasterType;
use crate::derived::{AcBreakdown, AcSource, ArmorClass, SpellSlots};
use crate::entities::{Ability, Item};

/// Key in `saving_throw_bonuses` that applies to every save.
pub const SAVE_BONUS_ALL: &str = "all";

/// Highest level the progression tables cover.
pub const MAX_LEVEL: i32 = 20;

/// A character or class level pulled into the 1..=20 range the tables
/// cover. Out-of-range levels are reported by validation, not rejected.
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(1, MAX_LEVEL)
}

/// floor((score - 10) / 2)
pub fn ability_modifier(score: i32) -> i32 {
    // D&D uses floor division, Rust's / rounds toward zero
    score.saturating_sub(10).div_euclid(2)
}

/// 2 at level 1, +1 every four levels, topping out at 6.
pub fn proficiency_bonus(level: i32) -> i32 {
    2 + (clamp_level(level) - 1) / 4
}

/// Raw scores plus every ability bonus, for the abilities present.
pub fn effective_scores<'a>(
    raw: &BTreeMap<Ability, i32>,
    bonuses: impl IntoIterator<Item = &'a BTreeMap<Ability, i32>>,
) -> BTreeMap<Ability, i32> {
    let mut scores = raw.clone();
    for bonus in bonuses {
        for (ability, amount) in bonus {
            if let Some(score) = scores.get_mut(ability) {
                *score = score.saturating_add(*amount);
            }
        }
    }
    scores
}

pub fn ability_modifiers(scores: &BTreeMap<Ability, i32>) -> BTreeMap<Ability, i32> {
    scores
        .iter()
        .map(|(ability, score)| (*ability, ability_modifier(*score)))
        .collect()
}

/// Best base AC among unarmored, worn armor and mage armor, plus the best
/// shield.
///
/// Candidates are visited in order (unarmored first, then items in list
/// order); a later candidate replaces the current best only when strictly
/// greater. Mage armor counts only while no armor has been seen.
pub fn resolve_armor_class(items: &[Item], dex_mod: i32) -> ArmorClass {
    let mut best = 10 + dex_mod;
    let mut source = AcSource::Unarmored;
    let mut shield = 0;
    let mut wearing_armor = false;

    for item in items {
        let props = &item.props;
        if let Some(armor) = &props.armor {
            wearing_armor = true;
            let ac = armor.armor_class(dex_mod);
            if ac > best {
                best = ac;
                source = AcSource::Armor(armor.category);
            }
        }
        if let Some(bonus) = props.shield_bonus {
            shield = shield.max(bonus);
        }
        if props.ac_base == Some(13) && !wearing_armor {
            let ac = 13 + dex_mod;
            if ac > best {
                best = ac;
                source = AcSource::MageArmor;
            }
        }
    }

    ArmorClass {
        value: best.saturating_add(shield),
        breakdown: AcBreakdown { base: best, shield },
        source,
    }
}

/// Sum bonus maps, normalizing keys to `"all"` or an ability code.
///
/// Keys that are neither are kept verbatim so they still show up in the
/// derived output.
pub fn save_bonus_totals<'a>(
    sources: impl IntoIterator<Item = &'a BTreeMap<String, i32>>,
) -> BTreeMap<String, i32> {
    let mut totals = BTreeMap::new();
    for source in sources {
        for (key, amount) in source {
            let key = if key.eq_ignore_ascii_case(SAVE_BONUS_ALL) {
                SAVE_BONUS_ALL.to_string()
            } else {
                key.parse::<Ability>()
                    .map(|a| a.code().to_string())
                    .unwrap_or_else(|_| key.clone())
            };
            let total = totals.entry(key).or_insert(0i32);
            *total = total.saturating_add(*amount);
        }
    }
    totals
}

/// Saving throw totals for all six abilities.
///
/// An ability missing from `mods` contributes a modifier of 0.
pub fn saving_throws(
    mods: &BTreeMap<Ability, i32>,
    proficiency_bonus: i32,
    proficient: &BTreeSet<Ability>,
    bonuses: &BTreeMap<String, i32>,
) -> BTreeMap<Ability, i32> {
    let all = bonuses.get(SAVE_BONUS_ALL).copied().unwrap_or(0);
    Ability::ALL
        .iter()
        .map(|ability| {
            let mut total = mods.get(ability).copied().unwrap_or(0).saturating_add(all);
            if proficient.contains(ability) {
                total = total.saturating_add(proficiency_bonus);
            }
            total = total.saturating_add(bonuses.get(ability.code()).copied().unwrap_or(0));
            (*ability, total)
        })
        .collect()
}

pub fn skill_total(
    mods: &BTreeMap<Ability, i32>,
    ability: Ability,
    proficiency_bonus: i32,
    proficient: bool,
) -> i32 {
    let modifier = mods.get(&ability).copied().unwrap_or(0);
    if proficient {
        modifier + proficiency_bonus
    } else {
        modifier
    }
}

/// Get the skill's associated ability for D&D 5e.
pub fn skill_ability(skill: &str) -> Option<Ability> {
    match skill.to_lowercase().as_str() {
        "athletics" => Some(Ability::Str),
        "acrobatics" | "sleight of hand" | "stealth" => Some(Ability::Dex),
        "arcana" | "history" | "investigation" | "nature" | "religion" => Some(Ability::Int),
        "animal handling" | "insight" | "medicine" | "perception" | "survival" => {
            Some(Ability::Wis)
        }
        "deception" | "intimidation" | "performance" | "persuasion" => Some(Ability::Cha),
        _ => None,
    }
}

/// Max HP taking the full die at first level and the rounded-up average after.
///
/// Levels outside 1..=20 are clamped.
pub fn average_hit_points(hit_die: i32, level: i32, con_mod: i32) -> i32 {
    let first_level_hp = hit_die.saturating_add(con_mod);
    let avg_roll = (hit_die / 2).saturating_add(1); // Average rounded up
    let later_levels = clamp_level(level) - 1;
    first_level_hp.saturating_add(later_levels.saturating_mul(avg_roll.saturating_add(con_mod)))
}

// Spell slot progression tables

/// Full-caster slots by caster level 1..=20.
const FULL_CASTER_SLOTS: [[u8; 9]; 20] = [
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

fn full_caster_slots(caster_level: i32) -> SpellSlots {
    match caster_level {
        1..=20 => SpellSlots::new(FULL_CASTER_SLOTS[(caster_level - 1) as usize]),
        l if l > 20 => SpellSlots::new(FULL_CASTER_SLOTS[19]),
        _ => SpellSlots::default(),
    }
}

fn warlock_slots(level: i32) -> SpellSlots {
    // Warlock pact magic - fewer slots but higher level
    let (count, slot_level) = match level {
        1 => (1, 1),
        2 => (2, 1),
        3..=4 => (2, 2),
        5..=6 => (2, 3),
        7..=8 => (2, 4),
        9..=10 => (2, 5),
        11..=16 => (3, 5),
        l if l >= 17 => (4, 5),
        _ => (0, 0),
    };

    let mut slots = SpellSlots::default();
    slots.set(slot_level, count);
    slots
}

/// Slots a single class contributes at the given class level.
///
/// Pact casters read the warlock table; everyone else reads the full-caster
/// table at their caster level.
pub fn progression_slots(caster_type: CasterType, class_level: i32) -> SpellSlots {
    match caster_type {
        CasterType::Pact => warlock_slots(class_level),
        other => full_caster_slots(other.caster_level(class_level)),
    }
}

// Spells known tables (0-indexed, level 1 = index 1)
const SORCERER_SPELLS_KNOWN: &[u32] = &[
    0, // level 0 (unused)
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 15, 15,
];

const BARD_SPELLS_KNOWN: &[u32] = &[
    0, // level 0
    4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15, 15, 16, 18, 19, 19, 20, 22, 22, 22,
];

const WARLOCK_SPELLS_KNOWN: &[u32] = &[
    0, // level 0
    2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15,
];

const THIRD_CASTER_SPELLS_KNOWN: &[u32] = &[
    0, // level 0
    0, 0, 3, 4, 4, 4, 5, 6, 6, 7, 8, 8, 9, 10, 10, 11, 11, 11, 12, 13,
];

const ELDRITCH_KNIGHT: &str = "eldritch knight";
const ARCANE_TRICKSTER: &str = "arcane trickster";

/// Canonical casting key for a class, folding third-caster subclasses in.
fn casting_key(class: &str, subclass: Option<&str>) -> String {
    let class = class.trim().to_lowercase();
    let subclass = subclass.map(|s| s.trim().to_lowercase());
    match (class.as_str(), subclass.as_deref()) {
        ("fighter", Some(ELDRITCH_KNIGHT)) => ELDRITCH_KNIGHT.to_string(),
        ("rogue", Some(ARCANE_TRICKSTER)) => ARCANE_TRICKSTER.to_string(),
        _ => class,
    }
}

pub fn caster_type(class: &str, subclass: Option<&str>) -> Option<CasterType> {
    match casting_key(class, subclass).as_str() {
        "wizard" | "cleric" | "druid" | "sorcerer" | "bard" => Some(CasterType::Full),
        "paladin" | "ranger" => Some(CasterType::Half),
        "warlock" => Some(CasterType::Pact),
        ELDRITCH_KNIGHT | ARCANE_TRICKSTER => Some(CasterType::Third),
        _ => None,
    }
}

pub fn spellcasting_ability(class: &str, subclass: Option<&str>) -> Option<Ability> {
    match casting_key(class, subclass).as_str() {
        "wizard" | ELDRITCH_KNIGHT | ARCANE_TRICKSTER => Some(Ability::Int),
        "cleric" | "druid" | "ranger" => Some(Ability::Wis),
        "sorcerer" | "bard" | "paladin" | "warlock" => Some(Ability::Cha),
        _ => None,
    }
}

/// Maximum spells known for known-spell casters; `None` for everyone else.
pub fn spells_known(class: &str, subclass: Option<&str>, level: i32) -> Option<u32> {
    let table = match casting_key(class, subclass).as_str() {
        "sorcerer" => SORCERER_SPELLS_KNOWN,
        "bard" => BARD_SPELLS_KNOWN,
        "warlock" => WARLOCK_SPELLS_KNOWN,
        ELDRITCH_KNIGHT | ARCANE_TRICKSTER => THIRD_CASTER_SPELLS_KNOWN,
        _ => return None, // Prepared casters don't have a limit
    };
    let index = level.clamp(0, 20) as usize;
    Some(table.get(index).copied().unwrap_or(0))
}

pub fn uses_spell_preparation(class: &str) -> bool {
    matches!(
        class.trim().to_lowercase().as_str(),
        "wizard" | "cleric" | "druid" | "paladin" | "ranger"
    )
}

/// max(1, class contribution + casting modifier)
pub fn max_prepared_spells(caster_type: CasterType, class_level: i32, ability_mod: i32) -> u32 {
    caster_type
        .preparation_levels(class_level)
        .saturating_add(ability_mod)
        .max(1) as u32
}
