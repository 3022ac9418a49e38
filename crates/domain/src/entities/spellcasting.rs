//! Innate and prepared spellcasting blocks.
//!
//! Spells are grouped by how often they can be cast. The summary lines are
//! the stat-block phrasing of each group ("At will: ...", "3/day each: ...",
//! "1st level (4 slots): ...").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::AbilityKey;

/// Where a spellcasting block is shown in the stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySlot {
    #[default]
    Trait,
    Action,
    Bonus,
    Reaction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeveledSpells {
    /// Slot count; cantrips and some innate lists have none
    pub slots: Option<u32>,
    pub spells: Vec<String>,
}

/// Spells keyed by casting frequency.
///
/// `daily`, `rest_long` and `recharge` are keyed by their raw frequency
/// string ("1", "3e"); an `e` suffix means the uses are per spell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellList {
    pub will: Vec<String>,
    pub daily: BTreeMap<String, Vec<String>>,
    pub rest_long: BTreeMap<String, Vec<String>>,
    pub recharge: BTreeMap<String, Vec<String>>,
    pub leveled: BTreeMap<u8, LeveledSpells>,
}

impl SpellList {
    /// One line per frequency group, in stat-block order: at will, daily
    /// (most uses first), per long rest, recharge, then spell levels
    /// ascending.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.will.is_empty() {
            lines.push(format!("At will: {}", self.will.join(", ")));
        }

        for (freq, spells) in by_uses_descending(&self.daily) {
            let (count, each) = split_frequency(freq);
            let label = match (count, each) {
                (_, true) => format!("{}/day each", count),
                ("1", false) => "once per day".to_string(),
                (_, false) => format!("{} times per day", count),
            };
            lines.push(format!("{}: {}", label, spells.join(", ")));
        }

        for (freq, spells) in by_uses_descending(&self.rest_long) {
            let (count, each) = split_frequency(freq);
            let suffix = if each { " each" } else { "" };
            lines.push(format!(
                "{}/long rest{}: {}",
                count,
                suffix,
                spells.join(", ")
            ));
        }

        for (min_roll, spells) in &self.recharge {
            lines.push(format!("Recharge {}–6: {}", min_roll, spells.join(", ")));
        }

        for (level, leveled) in &self.leveled {
            let spells = leveled.spells.join(", ");
            match (*level, leveled.slots) {
                (0, _) => lines.push(format!("Cantrips (at will): {}", spells)),
                (level, Some(slots)) => {
                    let noun = if slots == 1 { "slot" } else { "slots" };
                    lines.push(format!(
                        "{} level ({} {}): {}",
                        ordinal(level),
                        slots,
                        noun,
                        spells
                    ));
                }
                (level, None) => lines.push(format!("{} level: {}", ordinal(level), spells)),
            }
        }

        lines
    }
}

/// "3e" -> ("3", true), "2" -> ("2", false)
fn split_frequency(freq: &str) -> (&str, bool) {
    match freq.strip_suffix('e') {
        Some(count) => (count, true),
        None => (freq, false),
    }
}

fn by_uses_descending(groups: &BTreeMap<String, Vec<String>>) -> Vec<(&str, &Vec<String>)> {
    let mut ordered: Vec<(&str, &Vec<String>)> = groups
        .iter()
        .map(|(freq, spells)| (freq.as_str(), spells))
        .collect();
    // Stable sort keeps "1" ahead of "1e" for equal counts
    ordered.sort_by_key(|(freq, _)| {
        std::cmp::Reverse(split_frequency(freq).0.parse::<u32>().unwrap_or(0))
    });
    ordered
}

/// "1st", "2nd", "3rd", then "Nth".
pub fn ordinal(level: u8) -> String {
    match level {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{}th", n),
    }
}

/// A normalized spellcasting block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellcastingBlock {
    pub name: String,
    pub header_entries: Vec<String>,
    pub footer_entries: Vec<String>,
    pub ability: Option<AbilityKey>,
    pub display_as: DisplaySlot,
    pub spells: SpellList,
    pub summary: Vec<String>,
}

impl SpellcastingBlock {
    /// Header, spell summary and footer as one paragraph.
    pub fn display_text(&self) -> String {
        self.header_entries
            .iter()
            .chain(self.summary.iter())
            .chain(self.footer_entries.iter())
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The lowest recharge roll, when the block has recharge spells.
    pub fn recharge_min(&self) -> Option<u8> {
        self.spells
            .recharge
            .keys()
            .filter_map(|key| key.parse::<u8>().ok())
            .min()
    }
}
