//! Recharge ranges for abilities that return on a d6 roll.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

const DIE_FACES: u8 = 6;

/// Inclusive d6 range that makes a spent feature available again.
///
/// Invariant: `1 <= min <= max <= 6`. "Recharge 5–6" is `{min: 5, max: 6}`;
/// a bare recharge marker means `{6, 6}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RechargeParts")]
pub struct Recharge {
    min: u8,
    max: u8,
}

#[derive(Deserialize)]
struct RechargeParts {
    min: u8,
    max: u8,
}

impl TryFrom<RechargeParts> for Recharge {
    type Error = DomainError;

    fn try_from(parts: RechargeParts) -> Result<Self, Self::Error> {
        Self::new(parts.min, parts.max)
    }
}

impl Recharge {
    pub fn new(min: u8, max: u8) -> Result<Self, DomainError> {
        if min == 0 || max > DIE_FACES {
            return Err(DomainError::validation(format!(
                "recharge range {}-{} must lie within 1-{}",
                min, max, DIE_FACES
            )));
        }
        if min > max {
            return Err(DomainError::validation(format!(
                "recharge min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// "Recharge N–6", the form written by a numbered recharge tag.
    pub fn from_min(min: u8) -> Result<Self, DomainError> {
        Self::new(min, DIE_FACES)
    }

    /// "Recharge N", a single face.
    pub fn exactly(face: u8) -> Result<Self, DomainError> {
        Self::new(face, face)
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }
}

impl Default for Recharge {
    fn default() -> Self {
        Self {
            min: DIE_FACES,
            max: DIE_FACES,
        }
    }
}

impl fmt::Display for Recharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "Recharge {}", self.min)
        } else {
            write!(f, "Recharge {}–{}", self.min, self.max)
        }
    }
}
