//! Multiclass spellcasting aggregation.

use std::collections::BTreeMap;

use dndcs_domain::{
    caster_type, max_prepared_spells, progression_slots, spellcasting_ability, spells_known,
    uses_spell_preparation, Ability, CasterType, Character, ClassSpellcasting, SpellList,
    SpellSlots, SpellcastingSummary,
};

/// Class name and level pairs a character casts with, lowercased.
///
/// `spellcasting.classes` wins; otherwise the primary class at character
/// level.
fn casting_levels(character: &Character) -> Vec<(String, i32)> {
    if !character.spellcasting.classes.is_empty() {
        return character
            .spellcasting
            .classes
            .iter()
            .map(|(class, level)| (class.trim().to_lowercase(), *level))
            .collect();
    }
    character
        .class_name
        .as_deref()
        .map(|class| vec![(class.trim().to_lowercase(), character.level)])
        .unwrap_or_default()
}

/// Wizards without their own spell state read the first spellbook they
/// carry. A book known only by name has nothing prepared.
fn spellbook_prepared(character: &Character) -> Option<SpellList> {
    character.items.iter().find(|item| item.is_spellbook()).map(|item| {
        item.props
            .spellbook
            .as_ref()
            .map(|book| book.prepared.clone())
            .unwrap_or_default()
    })
}

fn class_block(
    character: &Character,
    class: &str,
    class_level: i32,
    mods: &BTreeMap<Ability, i32>,
    proficiency_bonus: i32,
) -> Option<ClassSpellcasting> {
    // The subclass belongs to the primary class only
    let subclass = if character.is_class(class) {
        character.subclass.as_deref()
    } else {
        None
    };

    let caster = caster_type(class, subclass)?;
    let ability = spellcasting_ability(class, subclass)?;
    let modifier = mods.get(&ability).copied().unwrap_or(0);
    let state = character.spellcasting.class_state(class);

    let mut block = ClassSpellcasting {
        class: class.to_string(),
        caster_type: caster,
        class_level,
        spellcasting_ability: ability,
        spell_save_dc: 8 + proficiency_bonus + modifier,
        spell_attack_mod: proficiency_bonus + modifier,
        slots: progression_slots(caster, class_level),
        known_max: None,
        known_spells: None,
        prepared_max: None,
        prepared_spells: None,
    };

    if let Some(max) = spells_known(class, subclass, class_level) {
        let known = state
            .as_ref()
            .and_then(|s| s.known.as_ref())
            .map(|list| list.capped(max as usize))
            .unwrap_or_default();
        block.known_max = Some(max);
        block.known_spells = Some(known);
    }

    if uses_spell_preparation(class) {
        let max = max_prepared_spells(caster, class_level, modifier);
        let prepared = match state.as_ref().and_then(|s| s.prepared.clone()) {
            Some(list) => Some(list),
            None if class == "wizard" && state.is_none() => spellbook_prepared(character),
            None => None,
        };
        block.prepared_max = Some(max);
        block.prepared_spells = Some(
            prepared
                .map(|list| list.capped(max as usize))
                .unwrap_or_default(),
        );
    }

    Some(block)
}

/// Slots and per-class blocks for every caster class; `None` when the
/// character casts nothing.
pub fn summarize(
    character: &Character,
    mods: &BTreeMap<Ability, i32>,
    proficiency_bonus: i32,
) -> Option<SpellcastingSummary> {
    let mut classes: Vec<ClassSpellcasting> = casting_levels(character)
        .into_iter()
        .filter_map(|(class, level)| class_block(character, &class, level, mods, proficiency_bonus))
        .collect();
    if classes.is_empty() {
        return None;
    }
    classes.sort_by(|a, b| a.class.cmp(&b.class));

    let mut slots = SpellSlots::default();
    let mut pact_slots: Option<SpellSlots> = None;
    for block in &classes {
        if block.caster_type == CasterType::Pact {
            pact_slots = Some(match pact_slots {
                Some(current) => current.max_with(&block.slots),
                None => block.slots,
            });
        } else {
            slots = slots.add(&block.slots);
        }
    }

    Some(SpellcastingSummary {
        slots,
        pact_slots,
        classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dndcs_domain::{
        ability_modifiers, ClassSpellState, Item, ItemProps, Spellbook, SpellcastingState,
    };

    fn summary(character: &Character) -> Option<SpellcastingSummary> {
        let mods = ability_modifiers(&character.raw_scores());
        summarize(character, &mods, dndcs_domain::proficiency_bonus(character.level))
    }

    #[test]
    fn non_casters_have_no_summary() {
        let fighter = Character::new("Brakka", 5)
            .with_class("fighter")
            .with_all_abilities(12);
        assert!(summary(&fighter).is_none());
    }

    #[test]
    fn paladin_is_a_half_caster() {
        let paladin = Character::new("Ser Aldo", 4)
            .with_class("Paladin")
            .with_all_abilities(10)
            .with_ability(Ability::Cha, 14);
        let sc = summary(&paladin).expect("paladin casts");

        assert_eq!(sc.slots.get(1), 3);
        assert!(sc.pact_slots.is_none());
        let block = &sc.classes[0];
        assert_eq!(block.class, "paladin");
        assert_eq!(block.caster_type, CasterType::Half);
        assert_eq!(block.prepared_max, Some(4));
        assert_eq!(block.spell_save_dc, 8 + 2 + 2);
    }

    #[test]
    fn multiclass_slots_are_summed() {
        let character = Character::new("Mixed", 5)
            .with_class("paladin")
            .with_all_abilities(12)
            .with_spellcasting(
                SpellcastingState::default()
                    .with_class_level("wizard", 3)
                    .with_class_level("paladin", 2),
            );
        let sc = summary(&character).expect("casts");

        assert_eq!(sc.slots.get(1), 6);
        assert_eq!(sc.slots.get(2), 2);
        let names: Vec<_> = sc.classes.iter().map(|c| c.class.as_str()).collect();
        assert_eq!(names, vec!["paladin", "wizard"]);
    }

    #[test]
    fn warlock_slots_stay_separate() {
        let character = Character::new("Hex", 5)
            .with_class("warlock")
            .with_all_abilities(10)
            .with_ability(Ability::Cha, 16)
            .with_spellcasting(
                SpellcastingState::default()
                    .with_class_level("warlock", 5)
                    .with_class_level("cleric", 1),
            );
        let sc = summary(&character).expect("casts");

        let pact = sc.pact_slots.expect("pact slots");
        assert_eq!(pact.get(3), 2);
        assert_eq!(sc.slots.get(3), 0);
        assert_eq!(sc.slots.get(1), 2);

        let warlock = sc.classes.iter().find(|c| c.class == "warlock").expect("warlock");
        assert_eq!(warlock.known_max, Some(6));
        assert_eq!(warlock.prepared_max, None);
    }

    #[test]
    fn known_spells_are_capped_in_level_order() {
        let known: SpellList = serde_json::from_value(serde_json::json!({
            "2": ["Mirror Image", "Shield"],
            "1": ["Shield", "Magic Missile", "Sleep"],
            "0": ["Fire Bolt"]
        }))
        .expect("spell list");
        let character = Character::new("Sorc", 2)
            .with_class("sorcerer")
            .with_all_abilities(10)
            .with_spellcasting(SpellcastingState::default().with_class_state(
                "Sorcerer",
                ClassSpellState {
                    known: Some(known),
                    ..Default::default()
                },
            ));
        let sc = summary(&character).expect("casts");

        let block = &sc.classes[0];
        assert_eq!(block.known_max, Some(3));
        assert_eq!(
            block.known_spells.as_deref(),
            Some(&["Shield".to_string(), "Magic Missile".to_string(), "Sleep".to_string()][..])
        );
    }

    #[test]
    fn wizard_falls_back_to_spellbook() {
        let book = Item::new("Spellbook").with_props(ItemProps {
            spellbook: Some(Spellbook {
                prepared: SpellList::Flat(vec![
                    "Shield".into(),
                    "Sleep".into(),
                    "Burning Hands".into(),
                    "Mage Armor".into(),
                    "Identify".into(),
                ]),
            }),
            ..Default::default()
        });
        let wizard = Character::new("Ilse", 1)
            .with_class("wizard")
            .with_all_abilities(10)
            .with_ability(Ability::Int, 14)
            .with_item(book);
        let sc = summary(&wizard).expect("casts");

        let block = &sc.classes[0];
        assert_eq!(block.prepared_max, Some(3));
        assert_eq!(block.prepared_spells.as_ref().map(Vec::len), Some(3));
        assert_eq!(sc.slots.get(1), 2);
    }

    #[test]
    fn first_spellbook_wins_even_without_props() {
        let filled = Item::new("Traveling Tome").with_props(ItemProps {
            spellbook: Some(Spellbook {
                prepared: SpellList::Flat(vec!["Shield".into()]),
            }),
            ..Default::default()
        });
        let blank_first = Character::new("Ilse", 1)
            .with_class("wizard")
            .with_item(Item::new("Rope"))
            .with_item(Item::new("spellbook"))
            .with_item(filled.clone());
        assert_eq!(spellbook_prepared(&blank_first), Some(SpellList::default()));

        let sc = summary(&blank_first.with_all_abilities(10)).expect("casts");
        assert_eq!(sc.classes[0].prepared_spells, Some(Vec::new()));

        let filled_only = Character::new("Ilse", 1).with_class("wizard").with_item(filled);
        assert_eq!(
            spellbook_prepared(&filled_only).map(|list| list.ordered()),
            Some(vec!["Shield".to_string()])
        );
        assert!(spellbook_prepared(&Character::new("Bare", 1)).is_none());
    }

    #[test]
    fn free_form_spellcasting_keys_do_not_hide_class_state() {
        let character = Character::from_value(serde_json::json!({
            "name": "Aria",
            "level": 3,
            "class": "wizard",
            "abilities": {"STR": 8, "DEX": 14, "CON": 12, "INT": 16, "WIS": 10, "CHA": 10},
            "spellcasting": {
                "ability": "INT",
                "ritual_book": true,
                "wizard": {"prepared": {"1": ["Shield", "Sleep"], "2": ["Misty Step"]}}
            }
        }))
        .expect("character");
        let sc = summary(&character).expect("casts");

        assert_eq!(
            sc.classes[0].prepared_spells.as_deref(),
            Some(&["Shield".to_string(), "Sleep".to_string(), "Misty Step".to_string()][..])
        );
    }

    #[test]
    fn eldritch_knight_casts_as_third_caster() {
        let knight = Character::new("Kael", 7)
            .with_class("Fighter")
            .with_subclass("Eldritch Knight")
            .with_all_abilities(10)
            .with_ability(Ability::Int, 16);
        let sc = summary(&knight).expect("casts");

        let block = &sc.classes[0];
        assert_eq!(block.caster_type, CasterType::Third);
        assert_eq!(block.spellcasting_ability, Ability::Int);
        assert_eq!(block.known_max, Some(5));
        assert_eq!(sc.slots.get(1), 4);
        assert_eq!(sc.slots.get(2), 2);
    }
}
