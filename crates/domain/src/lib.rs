//! Bestiary domain.
//!
//! The normalized creature model produced from 5etools stat blocks, and the
//! value objects it is built from: damage dice, recharge ranges, challenge
//! ratings and ability scores. Everything here is plain data with its
//! invariants enforced at construction; parsing of the markup lives in the
//! engine crate.

pub mod entities;
pub mod error;
pub mod value_objects;

pub use entities::{
    ordinal, ActionBody, ActionComponents, ActionOption, ActionRecord, Actions, AlternateSpeed,
    ArmorClass, AttackComponents, AttackRange, AttackRecord, ConditionalDamage, Creature,
    DamageInstance, DamageKind, DamageSummary, DefenseEntry, Diagnostic, DisplaySlot,
    EffectTrigger, FailureEffect, HitPoints, LegendaryAction, LegendaryActions, LegendaryGroupRef,
    LeveledSpells, MultiAttack, OngoingEffect, RangeKind, ReactionDetails, SaveFailures,
    SenseValue, Senses, SourceRef, Speed, SpeedValue, SpellList, SpellcastingBlock, Trait,
    UsageLimit, HEALING,
};
pub use error::DomainError;
pub use value_objects::{
    ability_modifier, AbilityKey, AbilityScore, AbilityScores, ChallengeRating, DamageDice,
    DiceParseError, Initiative, Recharge,
};
