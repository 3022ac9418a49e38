//! Attacks, special actions, reactions, traits and legendary actions.

use serde::{Deserialize, Serialize};

use super::damage::{DamageInstance, DamageSummary, OngoingEffect};
use crate::value_objects::{AbilityKey, Recharge};

/// Whether any of an attack's damage only applies under a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageKind {
    #[default]
    Standard,
    Conditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
    Melee,
    Ranged,
}

/// Reach or range in feet.
///
/// Ranged attacks may carry a long range ("range 80/320 ft."). Hybrid
/// attacks ("reach 5 ft. or range 20/60 ft.") are ranged with the melee
/// reach kept alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRange {
    pub normal: u32,
    pub long: Option<u32>,
    pub kind: RangeKind,
    pub reach: Option<u32>,
}

impl AttackRange {
    pub fn melee(reach: u32) -> Self {
        Self {
            normal: reach,
            long: None,
            kind: RangeKind::Melee,
            reach: None,
        }
    }

    pub fn ranged(normal: u32, long: Option<u32>) -> Self {
        Self {
            normal,
            long,
            kind: RangeKind::Ranged,
            reach: None,
        }
    }

    pub fn with_reach(mut self, reach: u32) -> Self {
        self.reach = Some(reach);
        self
    }
}

/// "(3/Day)" style limits parsed from an action name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimit {
    pub count: u32,
    /// Lower-cased period ("day", "long rest")
    pub period: String,
}

/// Texts following the first and second save-failure markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailures {
    pub first: Option<String>,
    pub second: Option<String>,
}

/// Structured summary of an attack's prose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackComponents {
    /// "Melee Weapon Attack:" and friends
    pub attack_type: Option<String>,
    pub to_hit: Option<i32>,
    /// Display form: "5 ft", "80/320 ft", "reach 5 ft. or range 20 ft"
    pub range: Option<String>,
    pub damage_average: Option<i32>,
    pub damage_formula: Option<String>,
    /// Primary damage type, or "variable" when the type is chosen at use
    pub damage_type: Option<String>,
    pub additional_damage: Vec<DamageSummary>,
    /// The list after "damage of a type chosen ...:"
    pub damage_options: Option<String>,
    pub save_ability: Option<AbilityKey>,
    /// "Dexterity Saving Throw"
    pub save_type: Option<String>,
    #[serde(rename = "saveDC")]
    pub save_dc: Option<u32>,
    pub save_failures: Option<SaveFailures>,
}

/// An action whose first paragraph makes an attack roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRecord {
    pub name: String,
    pub attack_modifier: Option<i32>,
    pub damage: Vec<DamageInstance>,
    pub damage_kind: DamageKind,
    pub range: Option<AttackRange>,
    pub recharge: Option<Recharge>,
    pub components: AttackComponents,
    pub text: String,
    pub ongoing_effects: Vec<OngoingEffect>,
}

/// One named sub-option of a list-structured action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOption {
    pub name: String,
    pub save_ability: Option<AbilityKey>,
    #[serde(rename = "saveDC")]
    pub save_dc: Option<u32>,
    /// Lower-cased shape ("emanation", "cone")
    pub area_type: Option<String>,
    /// "20-foot"
    pub area_size: Option<String>,
    pub damage: Vec<DamageInstance>,
    /// Hazards the option inflicts
    pub effects: Vec<String>,
    /// Lower-cased condition names
    pub conditions: Vec<String>,
    pub text: String,
}

/// Display body of an action or trait.
///
/// Flattened into the owning record, so a plain action serializes with a
/// `text` key and a list-structured one adds `description` and `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionBody {
    Structured {
        description: String,
        options: Vec<ActionOption>,
        /// Same as the description; kept so every body has display text
        text: String,
    },
    Text {
        text: String,
    },
}

impl ActionBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn structured(description: impl Into<String>, options: Vec<ActionOption>) -> Self {
        let description = description.into();
        Self::Structured {
            text: description.clone(),
            description,
            options,
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Self::Structured { text, .. } | Self::Text { text } => text,
        }
    }
}

impl Default for ActionBody {
    fn default() -> Self {
        Self::text(String::new())
    }
}

/// What a failed reaction save does: damage when the text states it,
/// otherwise the cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FailureEffect {
    Damage(DamageSummary),
    Text(String),
}

/// Trigger/response details present only on reactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDetails {
    /// Text between the trigger and response markers
    pub trigger: Option<String>,
    /// "Dexterity Saving Throw", or the raw response code
    pub response_type: Option<String>,
    /// Who must save, e.g. "one creature the dragon can see"
    pub target: Option<String>,
    pub failure: Option<FailureEffect>,
}

/// Structured summary of a non-attack action's first paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionComponents {
    pub save_ability: Option<AbilityKey>,
    pub save_type: Option<String>,
    #[serde(rename = "saveDC")]
    pub save_dc: Option<u32>,
    pub area_type: Option<String>,
    pub area_size: Option<String>,
    pub damage: Vec<DamageSummary>,
    pub conditions: Vec<String>,
    pub reaction: Option<ReactionDetails>,
}

/// A special action, bonus action or reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub name: String,
    pub recharge: Option<Recharge>,
    pub usage: Option<UsageLimit>,
    /// Damage instances followed by healing instances
    pub damage: Vec<DamageInstance>,
    pub components: ActionComponents,
    #[serde(flatten)]
    pub body: ActionBody,
    pub ongoing_effects: Vec<OngoingEffect>,
    /// True when the record was folded in from a spellcasting block
    #[serde(default)]
    pub spellcasting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trait {
    pub name: String,
    #[serde(flatten)]
    pub body: ActionBody,
    #[serde(default)]
    pub spellcasting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAttack {
    pub text: String,
    /// Lower-cased names of the attacks the text mentions
    pub attacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendaryAction {
    pub name: String,
    /// Legendary action points spent; 1 unless "(Costs N Actions)"
    pub cost: u32,
    pub text: String,
    pub damage: Vec<DamageInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendaryActions {
    /// Actions per round, 3 unless the record says otherwise
    pub count: u32,
    pub count_lair: Option<u32>,
    pub header: Vec<String>,
    pub actions: Vec<LegendaryAction>,
}

/// The creature's action section, split by shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actions {
    pub multi_attack: Option<MultiAttack>,
    pub attacks: Vec<AttackRecord>,
    pub special: Vec<ActionRecord>,
}
