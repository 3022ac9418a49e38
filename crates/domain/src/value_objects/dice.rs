//! Damage dice value objects and parsing
//!
//! Supports dice expressions as they appear in stat blocks: "1d8 + 3", "2d6",
//! "1d4 - 1", "d20". The average and canonical formula are always derived
//! from the dice fields; neither is ever read back from prose.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The expression is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY, XdY+Z or XdY-Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A dice expression like "2d6 + 3".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DiceParts")]
pub struct DamageDice {
    /// Number of dice (X in XdY)
    die_count: u8,
    /// Size of each die (Y in XdY)
    die_size: u8,
    /// Flat modifier added to the dice total (+Z or -Z)
    modifier: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiceParts {
    die_count: u8,
    die_size: u8,
    #[serde(default)]
    modifier: i32,
}

impl TryFrom<DiceParts> for DamageDice {
    type Error = DiceParseError;

    fn try_from(parts: DiceParts) -> Result<Self, Self::Error> {
        Self::new(parts.die_count, parts.die_size, parts.modifier)
    }
}

impl DamageDice {
    /// Create a dice expression, validating count and size.
    pub fn new(die_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if die_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            die_count,
            die_size,
            modifier,
        })
    }

    /// Parse a dice expression like "1d8 + 3", "2d6-1" or "d20".
    ///
    /// Whitespace anywhere in the expression is ignored, so "1d8+3" and
    /// "1d8 + 3" are equivalent.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = compact.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", compact))
        })?;

        let count_str = &compact[..d_pos];
        let die_count: u8 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count_str))
            })?
        };

        let after_d = &compact[d_pos + 1..];
        let (size_str, modifier) = match after_d.find(['+', '-']) {
            Some(0) => {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )))
            }
            Some(sign_pos) => {
                let magnitude_str = &after_d[sign_pos + 1..];
                let magnitude: i32 = magnitude_str.parse().map_err(|_| {
                    DiceParseError::InvalidFormat(format!("Invalid modifier: '{}'", magnitude_str))
                })?;
                let modifier = if after_d[sign_pos..].starts_with('-') {
                    -magnitude
                } else {
                    magnitude
                };
                (&after_d[..sign_pos], modifier)
            }
            None => (after_d, 0),
        };

        let die_size: u8 = size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", size_str))
        })?;

        Self::new(die_count, die_size, modifier)
    }

    pub fn die_count(&self) -> u8 {
        self.die_count
    }

    pub fn die_size(&self) -> u8 {
        self.die_size
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// Average roll: `floor(count * (size + 1) / 2) + modifier`.
    pub fn average(&self) -> i32 {
        let dice_total = i32::from(self.die_count) * (i32::from(self.die_size) + 1) / 2;
        dice_total.saturating_add(self.modifier)
    }

    /// Canonical rendering, e.g. "1d8 + 3". The modifier term is omitted when zero.
    pub fn formula(&self) -> String {
        match self.modifier {
            0 => format!("{}d{}", self.die_count, self.die_size),
            m if m < 0 => format!("{}d{} - {}", self.die_count, self.die_size, -i64::from(m)),
            m => format!("{}d{} + {}", self.die_count, self.die_size, m),
        }
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formula())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let dice = DamageDice::parse("2d6").expect("valid dice");
        assert_eq!(dice.die_count(), 2);
        assert_eq!(dice.die_size(), 6);
        assert_eq!(dice.modifier(), 0);
    }

    #[test]
    fn parse_with_spaced_modifier() {
        let dice = DamageDice::parse("1d8 + 3").expect("valid dice");
        assert_eq!(dice.die_count(), 1);
        assert_eq!(dice.die_size(), 8);
        assert_eq!(dice.modifier(), 3);
    }

    #[test]
    fn parse_negative_modifier() {
        let dice = DamageDice::parse("1d4 - 1").expect("valid dice");
        assert_eq!(dice.modifier(), -1);
        assert_eq!(dice.formula(), "1d4 - 1");
    }

    #[test]
    fn parse_shorthand() {
        let dice = DamageDice::parse("d20").expect("valid dice");
        assert_eq!(dice.die_count(), 1);
        assert_eq!(dice.die_size(), 20);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(DamageDice::parse(""), Err(DiceParseError::Empty));
        assert_eq!(DamageDice::parse("   "), Err(DiceParseError::Empty));
        assert!(matches!(
            DamageDice::parse("abc"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            DamageDice::parse("1d-5"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert_eq!(DamageDice::parse("0d6"), Err(DiceParseError::InvalidDiceCount));
        assert_eq!(DamageDice::parse("1d1"), Err(DiceParseError::InvalidDieSize));
    }

    #[test]
    fn average_is_floored_dice_mean_plus_modifier() {
        let dice = DamageDice::new(2, 6, 3).expect("valid dice");
        assert_eq!(dice.average(), 10);

        let dice = DamageDice::new(1, 8, 3).expect("valid dice");
        assert_eq!(dice.average(), 7);

        // 3 * 9 / 2 = 13.5, floored
        let dice = DamageDice::new(3, 8, 0).expect("valid dice");
        assert_eq!(dice.average(), 13);

        let dice = DamageDice::new(1, 4, -1).expect("valid dice");
        assert_eq!(dice.average(), 1);
    }

    #[test]
    fn formula_omits_zero_modifier() {
        assert_eq!(DamageDice::new(3, 6, 0).expect("valid").formula(), "3d6");
        assert_eq!(DamageDice::new(1, 8, 3).expect("valid").formula(), "1d8 + 3");
        assert_eq!(DamageDice::new(1, 8, 3).expect("valid").to_string(), "1d8 + 3");
    }
}
