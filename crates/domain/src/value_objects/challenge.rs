//! Challenge rating and the proficiency bonus derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

const MAX_PROFICIENCY_BONUS: u64 = 9;

/// A creature's challenge rating, kept as an exact ratio so "1/8", "1/4"
/// and "1/2" compare without floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallengeRating {
    numerator: u32,
    denominator: u32,
}

impl ChallengeRating {
    pub fn whole(value: u32) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    pub fn fraction(numerator: u32, denominator: u32) -> Result<Self, DomainError> {
        if denominator == 0 {
            return Err(DomainError::validation(
                "challenge rating denominator cannot be zero",
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Parse "5", "1/4" or " 1 / 2 ".
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let input = input.trim();
        match input.split_once('/') {
            Some((num, den)) => {
                let numerator = parse_part(num, input)?;
                let denominator = parse_part(den, input)?;
                Self::fraction(numerator, denominator)
            }
            None => Ok(Self::whole(parse_part(input, input)?)),
        }
    }

    /// Proficiency bonus: +2 below CR 5, then `min(9, 2 + floor(CR / 4))`.
    pub fn proficiency_bonus(&self) -> u8 {
        let numerator = u64::from(self.numerator);
        let denominator = u64::from(self.denominator);
        if numerator < 5 * denominator {
            return 2;
        }
        let quarter = numerator / (4 * denominator);
        // Bounded by MAX_PROFICIENCY_BONUS, so the cast cannot truncate
        (2 + quarter).min(MAX_PROFICIENCY_BONUS) as u8
    }
}

fn parse_part(part: &str, whole: &str) -> Result<u32, DomainError> {
    part.trim()
        .parse()
        .map_err(|_| DomainError::parse(format!("Invalid challenge rating: '{}'", whole)))
}

impl FromStr for ChallengeRating {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChallengeRating {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChallengeRating> for String {
    fn from(cr: ChallengeRating) -> Self {
        cr.to_string()
    }
}

impl fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}
