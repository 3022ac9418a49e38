//! Spellcasting block normalization.

use std::collections::BTreeMap;

use bestiary_domain::{
    AbilityKey, ActionBody, ActionComponents, ActionRecord, Diagnostic, DisplaySlot,
    LeveledSpells, Recharge, SpellList, SpellcastingBlock, Trait,
};
use tracing::{debug, warn};

use super::actions::render_entry;
use super::fivetools_types::{FiveToolsEntry, FiveToolsSpellRef, FiveToolsSpellcasting};
use super::markup::{clean_name, resolve_text};

const UNKNOWN_SPELL: &str = "Unknown Spell";

/// Normalize one raw spellcasting block.
///
/// `index` is the block's position in the creature's spellcasting list and
/// only names the field in diagnostics.
pub fn normalize_spellcasting(
    raw: &FiveToolsSpellcasting,
    index: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> SpellcastingBlock {
    let field = format!("spellcasting[{}]", index);

    let mut spells = SpellList {
        will: clean_spells(&raw.will, &format!("{}.will", field), diagnostics),
        ..SpellList::default()
    };
    spells.daily = clean_groups(&raw.daily, &format!("{}.daily", field), diagnostics);
    spells.rest_long = clean_groups(&raw.rest_long, &format!("{}.restLong", field), diagnostics);
    spells.recharge = clean_groups(&raw.recharge, &format!("{}.recharge", field), diagnostics);

    for (level_key, level) in &raw.spells {
        let level_field = format!("{}.spells.{}", field, level_key);
        let Ok(level_number) = level_key.trim().parse::<u8>() else {
            warn!(field = %level_field, "Spell level is not a number");
            diagnostics.push(Diagnostic::new(
                level_field,
                "Spell level is not a number",
                level_key.clone(),
            ));
            continue;
        };
        spells.leveled.insert(
            level_number,
            LeveledSpells {
                slots: level.slots,
                spells: clean_spells(&level.spells, &level_field, diagnostics),
            },
        );
    }

    let summary = spells.summary_lines();

    SpellcastingBlock {
        name: block_name(raw),
        header_entries: resolve_entries(&raw.header_entries),
        footer_entries: resolve_entries(&raw.footer_entries),
        ability: raw.ability.as_deref().and_then(AbilityKey::from_code),
        display_as: display_slot(raw.display_as.as_deref()),
        spells,
        summary,
    }
}

/// Block name without its recharge marker. A single recharge group other
/// than "1" is named in the title: "Innate Spellcasting (Recharge 5–6)".
fn block_name(raw: &FiveToolsSpellcasting) -> String {
    let name = clean_name(raw.name.as_deref().unwrap_or("Spellcasting"));
    let mut keys = raw.recharge.keys();
    match (keys.next(), keys.next()) {
        (Some(key), None) if key != "1" => format!("{} (Recharge {}–6)", name, key),
        _ => name,
    }
}

fn display_slot(display_as: Option<&str>) -> DisplaySlot {
    match display_as {
        None | Some("trait") => DisplaySlot::Trait,
        Some("action") => DisplaySlot::Action,
        Some("bonus") => DisplaySlot::Bonus,
        Some("reaction") => DisplaySlot::Reaction,
        Some(other) => {
            debug!(display_as = other, "Unknown spellcasting slot, shown as a trait");
            DisplaySlot::Trait
        }
    }
}

fn resolve_entries(entries: &[FiveToolsEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(render_entry)
        .map(|text| resolve_text(&text))
        .filter(|text| !text.is_empty())
        .collect()
}

fn clean_groups(
    groups: &BTreeMap<String, Vec<FiveToolsSpellRef>>,
    field: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<String, Vec<String>> {
    groups
        .iter()
        .map(|(frequency, refs)| {
            let group_field = format!("{}.{}", field, frequency);
            (frequency.clone(), clean_spells(refs, &group_field, diagnostics))
        })
        .collect()
}

fn clean_spells(
    refs: &[FiveToolsSpellRef],
    field: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    refs.iter()
        .map(|spell| match spell {
            FiveToolsSpellRef::Name(text)
            | FiveToolsSpellRef::Entry { entry: text, .. }
            | FiveToolsSpellRef::Named { name: text } => clean_spell(text),
            FiveToolsSpellRef::Unknown(value) => {
                warn!(field, raw = %value, "Unrecognized spell reference");
                diagnostics.push(Diagnostic::new(
                    field,
                    "Unrecognized spell reference shape",
                    value.to_string(),
                ));
                UNKNOWN_SPELL.to_string()
            }
        })
        .collect()
}

/// Markup resolved and the trailing `*` footnote marker dropped.
fn clean_spell(text: &str) -> String {
    resolve_text(text).trim_end_matches('*').trim_end().to_string()
}

/// A trait-slot block as a trait.
pub fn to_trait(block: &SpellcastingBlock) -> Trait {
    Trait {
        name: block.name.clone(),
        body: ActionBody::text(block.display_text()),
        spellcasting: true,
    }
}

/// An action, bonus action or reaction slot block as an action record.
pub fn to_action_record(block: &SpellcastingBlock) -> ActionRecord {
    ActionRecord {
        name: block.name.clone(),
        recharge: block
            .recharge_min()
            .and_then(|min| Recharge::from_min(min).ok()),
        usage: None,
        damage: Vec::new(),
        components: ActionComponents::default(),
        body: ActionBody::text(block.display_text()),
        ongoing_effects: Vec::new(),
        spellcasting: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> FiveToolsSpellcasting {
        serde_json::from_value(value).expect("spellcasting block")
    }

    #[test]
    fn innate_daily_each() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({
                "name": "Innate Spellcasting",
                "headerEntries": ["The fey's spellcasting ability is Charisma ({@dc 13})."],
                "daily": {"3e": ["{@spell charm person}", "{@spell sleep}*"]},
                "ability": "cha"
            })),
            0,
            &mut diagnostics,
        );

        assert_eq!(block.summary, vec!["3/day each: charm person, sleep".to_string()]);
        assert_eq!(block.ability, Some(AbilityKey::Cha));
        assert_eq!(block.display_as, DisplaySlot::Trait);
        assert_eq!(
            block.header_entries,
            vec!["The fey's spellcasting ability is Charisma (DC 13).".to_string()]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn leveled_single_slot() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({
                "name": "Spellcasting",
                "spells": {
                    "0": {"spells": ["{@spell light}"]},
                    "1": {"slots": 1, "spells": ["{@spell magic missile}"]},
                    "2": {"slots": 3, "spells": ["{@spell hold person}"]}
                }
            })),
            0,
            &mut diagnostics,
        );
        assert_eq!(
            block.summary,
            vec![
                "Cantrips (at will): light".to_string(),
                "1st level (1 slot): magic missile".to_string(),
                "2nd level (3 slots): hold person".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_spell_reference_is_reported() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({
                "name": "Spellcasting",
                "will": ["{@spell mage hand}", {"entry": "{@spell light}"}, {"name": "shield"}, 42]
            })),
            1,
            &mut diagnostics,
        );
        assert_eq!(
            block.spells.will,
            vec!["mage hand", "light", "shield", UNKNOWN_SPELL]
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].field, "spellcasting[1].will");
        assert_eq!(diagnostics[0].raw, "42");
    }

    #[test]
    fn bad_level_key_is_reported() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({"name": "Spellcasting", "spells": {"x": {"spells": ["a"]}}})),
            0,
            &mut diagnostics,
        );
        assert!(block.spells.leveled.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn recharge_in_name_and_action_slot() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({
                "name": "Spellcasting {@recharge 5}",
                "displayAs": "bonus",
                "recharge": {"5": ["{@spell misty step}"]}
            })),
            0,
            &mut diagnostics,
        );
        assert_eq!(block.name, "Spellcasting (Recharge 5–6)");
        assert_eq!(block.display_as, DisplaySlot::Bonus);
        assert_eq!(block.summary, vec!["Recharge 5–6: misty step".to_string()]);

        let record = to_action_record(&block);
        assert!(record.spellcasting);
        assert_eq!(record.recharge, Some(Recharge::from_min(5).expect("valid")));
        assert_eq!(record.body.display_text(), "Recharge 5–6: misty step");
    }

    #[test]
    fn trait_carries_header_summary_footer() {
        let mut diagnostics = Vec::new();
        let block = normalize_spellcasting(
            &raw(json!({
                "name": "Spellcasting",
                "headerEntries": ["The mage casts:"],
                "will": ["{@spell light}"],
                "footerEntries": ["It needs no components."],
                "displayAs": "something-new"
            })),
            0,
            &mut diagnostics,
        );
        let as_trait = to_trait(&block);
        assert!(as_trait.spellcasting);
        assert_eq!(
            as_trait.body.display_text(),
            "The mage casts: At will: light It needs no components."
        );
        assert_eq!(block.display_as, DisplaySlot::Trait);
    }
}
