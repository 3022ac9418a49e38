//! Type definitions for 5etools bestiary JSON.
//!
//! These types mirror the 5etools monster schema. Fields that appear in
//! several shapes are untagged enums, and each of them ends in an
//! `Unknown(serde_json::Value)` variant so an unexpected shape is reported
//! by the mapper instead of failing the whole record. Optional scalar and
//! list fields are wrapped in [`Lenient`] for the same reason. Only `name`
//! and the section lists (entry blocks, defenses, gear, spellcasting) are
//! structural.
//!
//! Note: Some fields are parsed but not yet used in the conversion to domain types.
//! They are kept to stay compatible with the JSON schema.

#![allow(dead_code)]

use serde::Deserialize;
use std::collections::BTreeMap;

/// A bestiary file: either the 5etools `{"monster": [...]}` wrapper or a bare
/// array of records. Records stay as raw JSON so each one can fail on its own.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsBestiaryFile {
    Wrapped { monster: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl FiveToolsBestiaryFile {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            Self::Wrapped { monster } => monster,
            Self::Bare(records) => records,
        }
    }
}

/// One value or a list of them (`"size": "M"` vs `"size": ["M"]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::Many(items) => items.first(),
            Self::One(item) => Some(item),
        }
    }
}

/// A field that keeps its raw JSON when it does not have the expected
/// shape, so a bad value never fails the rest of the record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Unknown(serde_json::Value),
}

impl<T> Lenient<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown(_) => None,
        }
    }
}

/// A list of strings where the list and each element may be malformed.
pub type FiveToolsTextList = Option<Lenient<Vec<Lenient<String>>>>;

/// `true`, or a string naming the entry (5etools uses both for SRD flags).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsFlag {
    Bool(bool),
    Name(String),
    Unknown(serde_json::Value),
}

impl FiveToolsFlag {
    pub fn is_set(flag: &Option<FiveToolsFlag>) -> bool {
        match flag {
            Some(FiveToolsFlag::Bool(value)) => *value,
            Some(FiveToolsFlag::Name(_)) => true,
            Some(FiveToolsFlag::Unknown(_)) | None => false,
        }
    }
}

/// A monster in 5etools format.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiveToolsMonster {
    pub name: String,
    #[serde(default)]
    pub source: Option<Lenient<String>>,
    #[serde(default)]
    pub page: Option<Lenient<u32>>,
    #[serde(default)]
    pub alias: FiveToolsTextList,
    #[serde(default)]
    pub group: FiveToolsTextList,
    #[serde(default)]
    pub is_named_creature: Option<Lenient<bool>>,
    #[serde(default)]
    pub other_sources: Option<Lenient<Vec<Lenient<FiveToolsSourceRef>>>>,
    #[serde(default)]
    pub srd52: Option<FiveToolsFlag>,
    #[serde(default)]
    pub basic_rules2024: Option<FiveToolsFlag>,
    #[serde(default)]
    pub dragon_age: Option<Lenient<String>>,
    #[serde(default)]
    pub sound_clip: Option<Lenient<FiveToolsSoundClip>>,

    #[serde(default)]
    pub size: Option<OneOrMany<String>>,
    #[serde(default, rename = "type")]
    pub creature_type: Option<FiveToolsCreatureType>,
    #[serde(default)]
    pub alignment: Vec<FiveToolsAlignment>,
    #[serde(default)]
    pub alignment_prefix: Option<Lenient<String>>,

    #[serde(default)]
    pub ac: Option<OneOrMany<FiveToolsArmorClass>>,
    #[serde(default)]
    pub hp: Option<FiveToolsHitPoints>,
    #[serde(default)]
    pub speed: Option<FiveToolsSpeed>,

    #[serde(default, rename = "str")]
    pub strength: Option<FiveToolsScore>,
    #[serde(default, rename = "dex")]
    pub dexterity: Option<FiveToolsScore>,
    #[serde(default, rename = "con")]
    pub constitution: Option<FiveToolsScore>,
    #[serde(default, rename = "int")]
    pub intelligence: Option<FiveToolsScore>,
    #[serde(default, rename = "wis")]
    pub wisdom: Option<FiveToolsScore>,
    #[serde(default, rename = "cha")]
    pub charisma: Option<FiveToolsScore>,
    #[serde(default)]
    pub save: Option<Lenient<BTreeMap<String, serde_json::Value>>>,
    #[serde(default)]
    pub skill: Option<Lenient<BTreeMap<String, serde_json::Value>>>,

    #[serde(default)]
    pub senses: FiveToolsTextList,
    #[serde(default)]
    pub passive: Option<FiveToolsPassive>,
    #[serde(default)]
    pub languages: FiveToolsTextList,

    #[serde(default)]
    pub resist: Vec<FiveToolsDefense>,
    #[serde(default)]
    pub immune: Vec<FiveToolsDefense>,
    #[serde(default)]
    pub vulnerable: Vec<FiveToolsDefense>,
    #[serde(default)]
    pub condition_immune: Vec<FiveToolsDefense>,

    #[serde(default)]
    pub gear: Vec<FiveToolsGearRef>,
    #[serde(default)]
    pub attached_items: FiveToolsTextList,

    #[serde(default)]
    pub cr: Option<FiveToolsChallenge>,

    #[serde(default, rename = "trait")]
    pub traits: Vec<FiveToolsEntryBlock>,
    #[serde(default)]
    pub action: Vec<FiveToolsEntryBlock>,
    #[serde(default)]
    pub bonus: Vec<FiveToolsEntryBlock>,
    #[serde(default)]
    pub reaction: Vec<FiveToolsEntryBlock>,
    #[serde(default)]
    pub legendary: Option<Vec<FiveToolsEntryBlock>>,
    #[serde(default)]
    pub legendary_actions: Option<Lenient<u32>>,
    #[serde(default)]
    pub legendary_actions_lair: Option<Lenient<u32>>,
    #[serde(default)]
    pub legendary_header: Vec<FiveToolsEntry>,
    #[serde(default)]
    pub legendary_group: Option<Lenient<FiveToolsLegendaryGroup>>,
    #[serde(default)]
    pub spellcasting: Vec<FiveToolsSpellcasting>,

    #[serde(default)]
    pub environment: FiveToolsTextList,
    #[serde(default)]
    pub treasure: FiveToolsTextList,
    #[serde(default)]
    pub token_url: Option<Lenient<String>>,
    #[serde(default)]
    pub has_token: Option<Lenient<bool>>,
    #[serde(default)]
    pub has_fluff: Option<Lenient<bool>>,
    #[serde(default)]
    pub has_fluff_images: Option<Lenient<bool>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsSourceRef {
    pub source: String,
    #[serde(default)]
    pub page: Option<Lenient<u32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsSoundClip {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsLegendaryGroup {
    pub name: String,
    #[serde(default)]
    pub source: String,
}

// === Type and alignment ===

/// Creature type: "dragon", or a structured descriptor with tags.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsCreatureType {
    Simple(String),
    Detailed(FiveToolsTypeDetail),
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiveToolsTypeDetail {
    #[serde(rename = "type")]
    pub base: FiveToolsTypeBase,
    #[serde(default)]
    pub tags: Vec<FiveToolsTypeTag>,
    #[serde(default)]
    pub swarm_size: Option<String>,
}

/// Base type, possibly "choose one of".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsTypeBase {
    Name(String),
    Choose { choose: Vec<String> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsTypeTag {
    Name(String),
    Prefixed {
        tag: String,
        #[serde(default)]
        prefix: Option<String>,
    },
    Unknown(serde_json::Value),
}

/// Alignment entry: a code ("C"), a weighted group, or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsAlignment {
    Code(String),
    Group {
        alignment: Vec<String>,
        #[serde(default)]
        chance: Option<u32>,
        #[serde(default)]
        note: Option<String>,
    },
    Special {
        special: String,
    },
    Unknown(serde_json::Value),
}

// === Defenses ===

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsArmorClass {
    Flat(u32),
    // Before `Detailed`, whose fields all default
    Special {
        special: String,
    },
    Detailed {
        #[serde(default)]
        ac: Option<u32>,
        #[serde(default)]
        from: Vec<String>,
        #[serde(default)]
        condition: Option<String>,
    },
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsHitPoints {
    Flat(u32),
    Detailed {
        #[serde(default)]
        average: Option<u32>,
        #[serde(default)]
        formula: Option<String>,
        #[serde(default)]
        special: Option<String>,
    },
    Unknown(serde_json::Value),
}

/// A resistance/immunity/vulnerability entry.
///
/// The group form nests further entries under a key named after the list
/// it sits in (`resist`, `immune`, `vulnerable` or `conditionImmune`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsDefense {
    Type(String),
    Group(FiveToolsDefenseGroup),
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiveToolsDefenseGroup {
    #[serde(
        default,
        rename = "resist",
        alias = "immune",
        alias = "vulnerable",
        alias = "conditionImmune"
    )]
    pub types: Option<Vec<FiveToolsDefense>>,
    #[serde(default)]
    pub special: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub pre_note: Option<String>,
}

// === Speed, scores, senses ===

/// Movement modes. Unrecognized keys land in `modes`.
#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsSpeed {
    #[serde(default)]
    pub alternate: BTreeMap<String, Vec<FiveToolsSpeedValue>>,
    #[serde(default)]
    pub choose: Option<serde_json::Value>,
    #[serde(flatten)]
    pub modes: BTreeMap<String, FiveToolsSpeedValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsSpeedValue {
    Feet(u32),
    Flag(bool),
    Conditional {
        number: u32,
        #[serde(default)]
        condition: Option<String>,
    },
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsScore {
    Value(i32),
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsPassive {
    Value(u32),
    Text(String),
    Unknown(serde_json::Value),
}

/// Challenge rating: "1/4", a bare number, or `{cr, xp}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsChallenge {
    Text(String),
    Number(u32),
    Detailed {
        cr: String,
        #[serde(default)]
        xp: Option<u32>,
        #[serde(default)]
        lair: Option<String>,
        #[serde(default)]
        coven: Option<String>,
    },
    Unknown(serde_json::Value),
}

// === Equipment ===

/// Gear reference: a tagged string, or one of the object forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsGearRef {
    Name(String),
    Named {
        name: String,
    },
    Item {
        item: String,
        #[serde(default)]
        quantity: Option<u32>,
    },
    Entry {
        entry: String,
    },
    Unknown(serde_json::Value),
}

// === Entries ===

/// A named block of entries (trait, action, reaction, legendary action).
#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsEntryBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<FiveToolsEntry>,
}

impl FiveToolsEntryBlock {
    /// The first entry when it is prose, else "".
    pub fn first_prose(&self) -> &str {
        match self.entries.first() {
            Some(FiveToolsEntry::Prose(text)) => text,
            _ => "",
        }
    }
}

/// One element of an `entries` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsEntry {
    Prose(String),
    Node(FiveToolsEntryNode),
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FiveToolsEntryNode {
    List {
        #[serde(default)]
        items: Vec<FiveToolsEntry>,
    },
    Item {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        entries: Vec<FiveToolsEntry>,
        #[serde(default)]
        entry: Option<String>,
    },
    Entries {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        entries: Vec<FiveToolsEntry>,
    },
}

// === Spellcasting ===

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiveToolsSpellcasting {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub header_entries: Vec<FiveToolsEntry>,
    #[serde(default)]
    pub footer_entries: Vec<FiveToolsEntry>,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub display_as: Option<String>,
    #[serde(default)]
    pub will: Vec<FiveToolsSpellRef>,
    #[serde(default)]
    pub daily: BTreeMap<String, Vec<FiveToolsSpellRef>>,
    #[serde(default)]
    pub rest_long: BTreeMap<String, Vec<FiveToolsSpellRef>>,
    #[serde(default)]
    pub recharge: BTreeMap<String, Vec<FiveToolsSpellRef>>,
    #[serde(default)]
    pub spells: BTreeMap<String, FiveToolsSpellLevel>,
    #[serde(default)]
    pub hidden: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiveToolsSpellLevel {
    #[serde(default)]
    pub slots: Option<u32>,
    #[serde(default)]
    pub lower: Option<u8>,
    #[serde(default)]
    pub spells: Vec<FiveToolsSpellRef>,
}

/// Spell reference: a tagged string, or one of the object forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiveToolsSpellRef {
    Name(String),
    Entry {
        entry: String,
        #[serde(default)]
        hidden: bool,
    },
    Named {
        name: String,
    },
    Unknown(serde_json::Value),
}
