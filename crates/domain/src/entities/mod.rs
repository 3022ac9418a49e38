//! Entities - the normalized creature and the records it is assembled from

mod action;
mod creature;
mod damage;
mod diagnostic;
mod spellcasting;

pub use action::{
    ActionBody, ActionComponents, ActionOption, ActionRecord, Actions, AttackComponents,
    AttackRange, AttackRecord, DamageKind, FailureEffect, LegendaryAction, LegendaryActions,
    MultiAttack, RangeKind, ReactionDetails, SaveFailures, Trait, UsageLimit,
};
pub use creature::{
    AlternateSpeed, ArmorClass, Creature, DefenseEntry, HitPoints, LegendaryGroupRef, SenseValue,
    Senses, SourceRef, Speed, SpeedValue,
};
pub use damage::{
    ConditionalDamage, DamageInstance, DamageSummary, EffectTrigger, OngoingEffect, HEALING,
};
pub use diagnostic::Diagnostic;
pub use spellcasting::{ordinal, DisplaySlot, LeveledSpells, SpellList, SpellcastingBlock};
