//! Damage and healing instances extracted from stat-block prose.
//!
//! A [`DamageInstance`] owns only its dice and type. Its average and formula
//! are computed whenever they are read or serialized, and recomputed when a
//! serialized instance is read back, so they can never disagree with the dice.

use serde::{Deserialize, Serialize};

use crate::value_objects::DamageDice;

/// Damage type used for healing instances.
pub const HEALING: &str = "healing";

/// Marks damage that only applies under a stated condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalDamage {
    pub is_conditional: bool,
    /// "normal" for the base branch, otherwise the condition text
    /// ("the target is prone").
    pub condition: String,
}

impl ConditionalDamage {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            is_conditional: true,
            condition: condition.into(),
        }
    }
}

/// One damage (or healing) roll: dice plus a lower-cased damage type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DamageInstanceView", from = "DamageInstanceView")]
pub struct DamageInstance {
    dice: DamageDice,
    damage_type: String,
    conditional: Option<ConditionalDamage>,
}

/// Wire shape of a damage instance. `average` and `formula` are ignored on
/// the way in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DamageInstanceView {
    #[serde(flatten)]
    dice: DamageDice,
    #[serde(rename = "type")]
    damage_type: String,
    #[serde(default, skip_deserializing)]
    average: i32,
    #[serde(default, skip_deserializing)]
    formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditional: Option<ConditionalDamage>,
}

impl From<DamageInstance> for DamageInstanceView {
    fn from(instance: DamageInstance) -> Self {
        Self {
            average: instance.dice.average(),
            formula: instance.dice.formula(),
            dice: instance.dice,
            damage_type: instance.damage_type,
            conditional: instance.conditional,
        }
    }
}

impl From<DamageInstanceView> for DamageInstance {
    fn from(view: DamageInstanceView) -> Self {
        Self {
            dice: view.dice,
            damage_type: view.damage_type,
            conditional: view.conditional,
        }
    }
}

impl DamageInstance {
    /// The damage type is stored lower-cased ("Slashing" becomes "slashing").
    pub fn new(dice: DamageDice, damage_type: impl Into<String>) -> Self {
        Self {
            dice,
            damage_type: damage_type.into().to_lowercase(),
            conditional: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditional = Some(ConditionalDamage::new(condition));
        self
    }

    pub fn dice(&self) -> DamageDice {
        self.dice
    }

    pub fn damage_type(&self) -> &str {
        &self.damage_type
    }

    pub fn conditional(&self) -> Option<&ConditionalDamage> {
        self.conditional.as_ref()
    }

    pub fn is_conditional(&self) -> bool {
        self.conditional
            .as_ref()
            .is_some_and(|conditional| conditional.is_conditional)
    }

    pub fn is_healing(&self) -> bool {
        self.damage_type == HEALING
    }

    pub fn average(&self) -> i32 {
        self.dice.average()
    }

    pub fn formula(&self) -> String {
        self.dice.formula()
    }

    /// Same dice, modifier and type; the condition marker is not compared.
    pub fn same_roll(&self, other: &DamageInstance) -> bool {
        self.dice == other.dice && self.damage_type == other.damage_type
    }

    pub fn summary(&self) -> DamageSummary {
        DamageSummary {
            average: self.average(),
            formula: self.formula(),
            damage_type: self.damage_type.clone(),
        }
    }
}

/// Average/formula/type triple used in component summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageSummary {
    pub average: i32,
    pub formula: String,
    #[serde(rename = "type")]
    pub damage_type: String,
}

/// When an ongoing effect deals its damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    StartOfTurn,
}

/// Damage over time, kept apart from the action's one-time damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingEffect {
    pub trigger: EffectTrigger,
    pub damage: DamageInstance,
    /// The sentence fragment the effect was lifted from.
    pub source_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dice(count: u8, size: u8, modifier: i32) -> DamageDice {
        DamageDice::new(count, size, modifier).expect("valid dice")
    }

    #[test]
    fn serializes_derived_fields() {
        let instance = DamageInstance::new(dice(1, 8, 3), "Slashing");
        let value = serde_json::to_value(&instance).expect("serialize");
        assert_eq!(
            value,
            json!({
                "dieCount": 1,
                "dieSize": 8,
                "modifier": 3,
                "type": "slashing",
                "average": 7,
                "formula": "1d8 + 3"
            })
        );
    }

    #[test]
    fn deserialize_recomputes_average_and_formula() {
        let value = json!({
            "dieCount": 2,
            "dieSize": 6,
            "modifier": 3,
            "type": "fire",
            "average": 999,
            "formula": "bogus"
        });
        let instance: DamageInstance = serde_json::from_value(value).expect("deserialize");
        assert_eq!(instance.average(), 10);
        let round_trip = serde_json::to_value(&instance).expect("serialize");
        assert_eq!(round_trip["average"], 10);
        assert_eq!(round_trip["formula"], "2d6 + 3");
    }

    #[test]
    fn conditional_marker() {
        let instance = DamageInstance::new(dice(1, 8, 0), "cold").with_condition("normal");
        assert!(instance.is_conditional());
        let value = serde_json::to_value(&instance).expect("serialize");
        assert_eq!(value["conditional"]["isConditional"], true);
        assert_eq!(value["conditional"]["condition"], "normal");
    }

    #[test]
    fn same_roll_ignores_condition() {
        let a = DamageInstance::new(dice(2, 6, 0), "fire");
        let b = DamageInstance::new(dice(2, 6, 0), "FIRE").with_condition("x");
        let c = DamageInstance::new(dice(2, 6, 1), "fire");
        assert!(a.same_roll(&b));
        assert!(!a.same_roll(&c));
    }

    #[test]
    fn ongoing_effect_trigger_wire_name() {
        let effect = OngoingEffect {
            trigger: EffectTrigger::StartOfTurn,
            damage: DamageInstance::new(dice(2, 6, 0), "fire"),
            source_text: "takes 7 (2d6) fire damage at the start of".to_string(),
        };
        let value = serde_json::to_value(&effect).expect("serialize");
        assert_eq!(value["trigger"], "start_of_turn");
        assert_eq!(value["damage"]["average"], 7);
        assert_eq!(value["sourceText"], "takes 7 (2d6) fire damage at the start of");
    }
}
