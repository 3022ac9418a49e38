//! Value objects - Immutable objects defined by their attributes

mod ability;
mod challenge;
mod dice;
mod recharge;

pub use ability::{ability_modifier, AbilityKey, AbilityScore, AbilityScores, Initiative};
pub use challenge::ChallengeRating;
pub use dice::{DamageDice, DiceParseError};
pub use recharge::Recharge;
