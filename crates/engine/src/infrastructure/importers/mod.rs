//! Content importers for 5etools bestiary data.
//!
//! Reads raw 5etools monster records and converts them to the normalized
//! creature model in `bestiary_domain`: markup tags are resolved to plain
//! text, and damage, attacks, actions and spellcasting are extracted into
//! structured records.

mod actions;
mod damage;
mod fivetools;
mod fivetools_types;
mod markup;
mod spellcasting;

#[cfg(test)]
mod bestiary_tests;

pub use actions::{
    is_attack, is_multiattack, parse_action, parse_attack, parse_body, parse_legendary,
    parse_multiattack, parse_recharge, parse_trait, parse_usage, ActionKind,
};
pub use damage::{extract_damage, extract_healing, find_dice, DamageExtraction};
pub use fivetools::{decode_record, map_creature, FiveToolsImporter, ImportError};
pub use fivetools_types::{FiveToolsBestiaryFile, FiveToolsEntryBlock, FiveToolsMonster};
pub use markup::{
    classify_attack, clean_name, resolve_text, Rewrite, TagCategory, TagRule, TAG_RULES,
};
pub use spellcasting::{normalize_spellcasting, to_action_record, to_trait};
