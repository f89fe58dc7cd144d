//! Companion summaries and party-wide bonuses.

use dndcs_domain::{ability_modifiers, Companion, CompanionSummary, PartyBonuses};

use super::tables::StockTables;

fn summarize_one(companion: &Companion, tables: &StockTables) -> CompanionSummary {
    let template = companion
        .template
        .as_deref()
        .and_then(|name| tables.companion(name));

    let mut ability_scores = template.map(|t| t.abilities.clone()).unwrap_or_default();
    ability_scores.extend(companion.abilities.iter().map(|(a, s)| (*a, *s)));

    let bonuses = match template {
        Some(t) => companion.bonuses.merged_over(&t.bonuses),
        None => companion.bonuses.clone(),
    };

    CompanionSummary {
        name: companion.name.clone(),
        template: companion.template.clone(),
        ability_mods: ability_modifiers(&ability_scores),
        ability_scores,
        ac: template.and_then(|t| t.ac),
        hit_points: template.and_then(|t| t.hit_points),
        bonuses,
    }
}

/// Per-companion summaries plus the bonuses they grant the party.
///
/// Bonuses are `None` without companions.
pub fn summarize(
    companions: &[Companion],
    tables: &StockTables,
) -> (Vec<CompanionSummary>, Option<PartyBonuses>) {
    let summaries: Vec<CompanionSummary> = companions
        .iter()
        .map(|companion| summarize_one(companion, tables))
        .collect();
    if summaries.is_empty() {
        return (summaries, None);
    }

    let mut party = PartyBonuses::default();
    for summary in &summaries {
        if summary.bonuses.help_action == Some(true) {
            party.help_action = true;
        }
        for sense in summary.bonuses.shared_senses.iter().flatten() {
            if !party.shared_senses.contains(sense) {
                party.shared_senses.push(sense.clone());
            }
        }
    }

    (summaries, Some(party))
}
