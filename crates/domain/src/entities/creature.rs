//! The normalized creature entity.
//!
//! A [`Creature`] is produced once per source record and carries everything
//! a display layer needs without further text processing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::action::{ActionRecord, Actions, LegendaryActions, Trait};
use super::diagnostic::Diagnostic;
use super::spellcasting::SpellcastingBlock;
use crate::value_objects::{AbilityScores, Initiative};

/// Armor class: a bare number, or a value with the armor it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArmorClass {
    Flat(u32),
    Detailed {
        value: Option<u32>,
        /// "natural armor", "plate armor", "shield"
        sources: Vec<String>,
        special: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitPoints {
    pub average: Option<u32>,
    pub formula: Option<String>,
    /// Free-text hit points ("equal to the summoner's level")
    pub special: Option<String>,
}

/// A movement mode's value: feet, or a flag such as `canHover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeedValue {
    Feet(u32),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateSpeed {
    pub number: u32,
    pub condition: Option<String>,
}

/// Movement modes keyed by name ("walk", "fly", "canHover").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speed {
    #[serde(flatten)]
    pub modes: BTreeMap<String, SpeedValue>,
    /// Cleaned condition text per mode ("(hover)", "in wolf form")
    pub speed_conditions: BTreeMap<String, String>,
    pub alternate: BTreeMap<String, Vec<AlternateSpeed>>,
}

/// A sense's range in feet, or its bare presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SenseValue {
    Range(u32),
    Present(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Senses {
    /// Keyed by lower-cased sense name ("darkvision")
    #[serde(flatten)]
    pub ranges: BTreeMap<String, SenseValue>,
    pub passive_perception: Option<u32>,
}

/// A resistance, immunity or vulnerability line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefenseEntry {
    Type(String),
    Conditional {
        types: Vec<String>,
        /// "from nonmagical attacks"
        condition: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub source: String,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendaryGroupRef {
    pub name: String,
    pub source: String,
}

/// A normalized creature stat block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    // Identity
    pub id: Option<u64>,
    pub name: String,
    pub alias: Vec<String>,
    pub is_named_creature: bool,
    pub group: Vec<String>,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub creature_type: Option<String>,
    pub alignment: Vec<String>,
    pub source: String,
    pub page: Option<u32>,
    pub other_sources: Vec<SourceRef>,
    pub srd52: bool,
    pub basic_rules2024: bool,
    pub dragon_age: Option<String>,
    pub sound_clip: Option<String>,

    // Combat statistics
    pub ac: Option<ArmorClass>,
    pub hp: Option<HitPoints>,
    pub speed: Speed,
    pub challenge_rating: Option<String>,
    pub experience: Option<u32>,
    pub proficiency_bonus: Option<u8>,
    pub initiative: Initiative,

    // Abilities and skills
    pub abilities: AbilityScores,
    pub skills: BTreeMap<String, String>,
    pub senses: Senses,
    pub languages: Vec<String>,

    // Equipment
    pub gear: Vec<String>,
    pub attached_items: Vec<String>,

    // Defenses
    pub vulnerabilities: Vec<DefenseEntry>,
    pub resistances: Vec<DefenseEntry>,
    pub immunities: Vec<DefenseEntry>,
    pub condition_immunities: Vec<DefenseEntry>,

    // Features and actions
    pub traits: Vec<Trait>,
    pub actions: Actions,
    pub bonus_actions: Vec<ActionRecord>,
    pub reactions: Vec<ActionRecord>,
    pub legendary: Option<LegendaryActions>,
    pub spellcasting: Vec<SpellcastingBlock>,

    // Additional data
    pub environment: Vec<String>,
    pub treasure: Vec<String>,
    pub legendary_group: Option<LegendaryGroupRef>,
    pub token_url: Option<String>,
    pub has_token: bool,
    pub has_fluff: bool,
    pub has_fluff_images: bool,

    /// Data-quality notes raised while mapping this record
    pub diagnostics: Vec<Diagnostic>,
}
