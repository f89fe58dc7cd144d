//! Per-class spell state recorded on a character.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A list of spell names, either flat or grouped by spell level.
///
/// Grouped lists use the spell level as a string key (`"1"`..`"9"`); other
/// keys (cantrips under `"0"`, typos) are ignored when flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpellList {
    Flat(Vec<String>),
    ByLevel(BTreeMap<String, Vec<String>>),
}

impl Default for SpellList {
    fn default() -> Self {
        SpellList::Flat(Vec::new())
    }
}

impl SpellList {
    /// Spell names in ascending spell level, then input order, without
    /// duplicates (first occurrence kept).
    pub fn ordered(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |spell: &String| {
            if !out.contains(spell) {
                out.push(spell.clone());
            }
        };

        match self {
            SpellList::Flat(spells) => spells.iter().for_each(&mut push),
            SpellList::ByLevel(levels) => {
                for level in 1..=9u8 {
                    if let Some(spells) = levels.get(&level.to_string()) {
                        spells.iter().for_each(&mut push);
                    }
                }
            }
        }
        out
    }

    /// [`ordered`](Self::ordered), truncated to `cap` entries.
    pub fn capped(&self, cap: usize) -> Vec<String> {
        let mut spells = self.ordered();
        spells.truncate(cap);
        spells
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SpellList::Flat(spells) => spells.is_empty(),
            SpellList::ByLevel(levels) => levels.values().all(Vec::is_empty),
        }
    }
}

/// Known/prepared spells for one class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSpellState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known: Option<SpellList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared: Option<SpellList>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The `spellcasting` section of a character.
///
/// `classes` maps class name to class level for multiclass casters. Every
/// other key is kept as written; object-shaped entries are read back as a
/// class's [`ClassSpellState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellcastingState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub classes: BTreeMap<String, i32>,
    #[serde(flatten)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl SpellcastingState {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.entries.is_empty()
    }

    /// Spell state for a class, matched case-insensitively.
    ///
    /// Entries that are not shaped like a class state read as `None`.
    pub fn class_state(&self, class: &str) -> Option<ClassSpellState> {
        self.entries
            .iter()
            .filter(|(name, value)| name.eq_ignore_ascii_case(class) && value.is_object())
            .find_map(|(_, value)| ClassSpellState::deserialize(value).ok())
    }

    pub fn with_class_level(mut self, class: impl Into<String>, level: i32) -> Self {
        self.classes.insert(class.into(), level);
        self
    }

    pub fn with_class_state(self, class: impl Into<String>, state: ClassSpellState) -> Self {
        match serde_json::to_value(state) {
            Ok(value) => self.with_entry(class, value),
            Err(_) => self,
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn by_level_lists_flatten_in_level_order() {
        let list: SpellList = serde_json::from_value(json!({
            "3": ["Fireball"],
            "1": ["Shield", "Magic Missile"],
            "0": ["Light"],
            "10": ["Nonsense"],
            "2": ["Misty Step", "Shield"]
        }))
        .expect("by-level list");

        assert_eq!(
            list.ordered(),
            vec!["Shield", "Magic Missile", "Misty Step", "Fireball"]
        );
        assert_eq!(list.capped(2), vec!["Shield", "Magic Missile"]);
    }

    #[test]
    fn flat_lists_keep_input_order() {
        let list = SpellList::Flat(vec!["Bless".into(), "Bane".into(), "Bless".into()]);
        assert_eq!(list.ordered(), vec!["Bless", "Bane"]);
    }

    #[test]
    fn class_state_sits_beside_class_levels() {
        let state: SpellcastingState = serde_json::from_value(json!({
            "classes": {"wizard": 3, "paladin": 2},
            "Wizard": {"prepared": {"1": ["Shield"]}},
            "paladin": {"prepared": []}
        }))
        .expect("spellcasting state");

        assert_eq!(state.classes.get("wizard"), Some(&3));
        let wizard = state.class_state("wizard").expect("wizard state");
        assert_eq!(
            wizard.prepared.as_ref().map(SpellList::ordered),
            Some(vec!["Shield".to_string()])
        );
        assert!(state.class_state("paladin").is_some());
        assert!(state.class_state("bard").is_none());
    }

    #[test]
    fn scalar_entries_are_kept_verbatim() {
        let raw = json!({
            "classes": {"wizard": 3},
            "ability": "INT",
            "notes": ["ritual caster"],
            "wizard": {"known": ["Shield"], "school": "evocation"}
        });
        let state: SpellcastingState =
            serde_json::from_value(raw.clone()).expect("free-form spellcasting");

        assert_eq!(state.entries.get("ability"), Some(&json!("INT")));
        assert!(state.class_state("ability").is_none());
        assert!(state.class_state("notes").is_none());
        let wizard = state.class_state("Wizard").expect("wizard state");
        assert_eq!(wizard.extra.get("school"), Some(&json!("evocation")));

        let again = serde_json::to_value(&state).expect("serialize");
        assert_eq!(again, raw);
    }

    #[test]
    fn class_state_builder_writes_an_object_entry() {
        let state = SpellcastingState::default().with_class_state(
            "cleric",
            ClassSpellState {
                prepared: Some(SpellList::Flat(vec!["Bless".into()])),
                ..Default::default()
            },
        );
        assert_eq!(state.entries.get("cleric"), Some(&json!({"prepared": ["Bless"]})));
        assert!(!state.is_empty());
    }
}
