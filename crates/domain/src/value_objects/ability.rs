//! Ability scores, modifiers, saves and initiative.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The six ability keys, in stat-block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKey {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl AbilityKey {
    pub const ALL: [AbilityKey; 6] = [
        AbilityKey::Str,
        AbilityKey::Dex,
        AbilityKey::Con,
        AbilityKey::Int,
        AbilityKey::Wis,
        AbilityKey::Cha,
    ];

    /// Three-letter code used by markup tags and save maps ("dex").
    pub fn code(&self) -> &'static str {
        match self {
            AbilityKey::Str => "str",
            AbilityKey::Dex => "dex",
            AbilityKey::Con => "con",
            AbilityKey::Int => "int",
            AbilityKey::Wis => "wis",
            AbilityKey::Cha => "cha",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            AbilityKey::Str => "Strength",
            AbilityKey::Dex => "Dexterity",
            AbilityKey::Con => "Constitution",
            AbilityKey::Int => "Intelligence",
            AbilityKey::Wis => "Wisdom",
            AbilityKey::Cha => "Charisma",
        }
    }

    /// Case-insensitive lookup by three-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.code().eq_ignore_ascii_case(code.trim()))
    }

    /// "Dexterity Saving Throw"
    pub fn saving_throw_label(&self) -> String {
        format!("{} Saving Throw", self.full_name())
    }
}

impl FromStr for AbilityKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| DomainError::parse(format!("Unknown ability: {}", s)))
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Ability modifier: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> i32 {
    // Integer division truncates toward zero; div_euclid floors for a positive divisor
    (score - 10).div_euclid(2)
}

/// One ability's score, derived modifier and saving-throw bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScore {
    value: i32,
    modifier: i32,
    save: i32,
}

impl AbilityScore {
    /// Build from a raw score and an optional proficient save bonus.
    ///
    /// Without a listed save bonus the save is the plain ability modifier.
    pub fn new(value: i32, save_bonus: Option<i32>) -> Self {
        let modifier = ability_modifier(value);
        Self {
            value,
            modifier,
            save: save_bonus.unwrap_or(modifier),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    pub fn save(&self) -> i32 {
        self.save
    }
}

/// All six abilities; every key is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub strength: AbilityScore,
    #[serde(rename = "dex")]
    pub dexterity: AbilityScore,
    #[serde(rename = "con")]
    pub constitution: AbilityScore,
    #[serde(rename = "int")]
    pub intelligence: AbilityScore,
    #[serde(rename = "wis")]
    pub wisdom: AbilityScore,
    #[serde(rename = "cha")]
    pub charisma: AbilityScore,
}

impl AbilityScores {
    /// Build the six scores from a lookup over ability keys.
    pub fn from_fn(mut score_for: impl FnMut(AbilityKey) -> AbilityScore) -> Self {
        Self {
            strength: score_for(AbilityKey::Str),
            dexterity: score_for(AbilityKey::Dex),
            constitution: score_for(AbilityKey::Con),
            intelligence: score_for(AbilityKey::Int),
            wisdom: score_for(AbilityKey::Wis),
            charisma: score_for(AbilityKey::Cha),
        }
    }

    pub fn get(&self, key: AbilityKey) -> &AbilityScore {
        match key {
            AbilityKey::Str => &self.strength,
            AbilityKey::Dex => &self.dexterity,
            AbilityKey::Con => &self.constitution,
            AbilityKey::Int => &self.intelligence,
            AbilityKey::Wis => &self.wisdom,
            AbilityKey::Cha => &self.charisma,
        }
    }
}

/// Initiative derived from the dexterity modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiative {
    modifier: i32,
    total: i32,
}

impl Initiative {
    pub fn from_dexterity_modifier(modifier: i32) -> Self {
        Self {
            modifier,
            total: 10 + modifier,
        }
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// Always `10 + modifier`.
    pub fn total(&self) -> i32 {
        self.total
    }
}
