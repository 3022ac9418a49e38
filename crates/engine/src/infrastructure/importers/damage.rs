//! Damage and healing extraction from stat-block prose.
//!
//! Extraction runs in three stages. Ongoing damage ("takes 7 (2d6) fire
//! damage at the start of each of its turns") is lifted out first so it is
//! never counted as one-time damage. Then the "X damage, or Y damage if ..."
//! construction is tried; when its alternate branch is present the result is
//! final. Otherwise [`DAMAGE_RULES`] is evaluated in order and the first rule
//! with any match wins.
//!
//! Averages in the prose are ignored; every instance recomputes its own from
//! the dice.

use std::sync::OnceLock;

use bestiary_domain::{DamageDice, DamageInstance, EffectTrigger, OngoingEffect, HEALING};
use regex_lite::{Captures, Regex};

use super::markup::resolve_text;

/// Damage found in one piece of prose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageExtraction {
    pub instances: Vec<DamageInstance>,
    pub ongoing: Vec<OngoingEffect>,
}

impl DamageExtraction {
    pub fn is_conditional(&self) -> bool {
        self.instances.iter().any(DamageInstance::is_conditional)
    }
}

/// Where a rule takes the damage type from.
#[derive(Debug, Clone, Copy)]
enum TypeSource {
    Group(usize),
    Fixed(&'static str),
}

struct DamageRule {
    pattern: &'static str,
    dice_group: usize,
    damage_type: TypeSource,
}

/// Unconditional damage shapes, most specific first.
const DAMAGE_RULES: &[DamageRule] = &[
    // 7 ({@damage 1d8 + 3}) slashing damage
    DamageRule {
        pattern: r"(?i)(\d+)\s*\(\{@damage ([^}]+)\}\)\s+([a-z]+)\s+damage",
        dice_group: 2,
        damage_type: TypeSource::Group(3),
    },
    // {@h}7 ({@damage 1d8 + 3}) slashing damage
    DamageRule {
        pattern: r"(?i)\{@h\}(\d+)\s*\(\{@damage ([^}]+)\}\)\s+([a-z]+)\s+damage",
        dice_group: 2,
        damage_type: TypeSource::Group(3),
    },
    // 7 (1d8 + 3) piercing damage plus 13 (3d8) cold damage
    DamageRule {
        pattern: r"(?i)(\d+)\s*\((\d+d\d+(?:\s*[+-]\s*\d+)?)\)\s+([a-z]+)\s+damage",
        dice_group: 2,
        damage_type: TypeSource::Group(3),
    },
    // 22 ({@damage 4d10}) necrotic or radiant damage (the empyrean's choice)
    DamageRule {
        pattern: r"(?i)(\d+)\s*\(\{@damage ([^}]+)\}\)\s+([a-z]+\s+or\s+[a-z]+)\s+damage\s*\([^)]*choice[^)]*\)",
        dice_group: 2,
        damage_type: TypeSource::Group(3),
    },
    // {@h}10 ({@damage 3d6}) damage of a type chosen by the dragon
    DamageRule {
        pattern: r"(?i)(?:\{@h\})?(\d+)\s*\(\{@damage ([^}]+)\}\)\s+damage of a type",
        dice_group: 2,
        damage_type: TypeSource::Fixed("variable"),
    },
    // Hit: {@damage 1d8 + 3} slashing damage
    DamageRule {
        pattern: r"(?i)\{@(?:damage|h) ([^}]+)\}\s+([a-z]+)\s+damage",
        dice_group: 1,
        damage_type: TypeSource::Group(2),
    },
];

/// Healing shapes, most specific first.
const HEALING_RULES: &[DamageRule] = &[
    // 30 ({@dice 6d8 + 3}) hit points
    DamageRule {
        pattern: r"(?i)(\d+)\s*\(\{@dice ([^}]+)\}\)\s+hit points",
        dice_group: 2,
        damage_type: TypeSource::Fixed(HEALING),
    },
    // 30 (6d8 + 3) hit points
    DamageRule {
        pattern: r"(?i)(\d+)\s*\((\d+d\d+(?:\s*[+-]\s*\d+)?)\)\s+hit points",
        dice_group: 2,
        damage_type: TypeSource::Fixed(HEALING),
    },
];

// Tagged or raw dice inside the parentheses of the conditional shapes.
// Capture 2 is the tagged form, capture 3 the raw form.
const BASE_BEFORE_OR: &str = r"(?i)(?:\{@h\})?(\d+)\s*\((?:\{@damage ([^}]+)\}|(\d+d\d+(?:\s*[+-]\s*\d+)?))\)\s+([a-z]+)\s+damage[—,]?\s*or\b";
const ALTERNATE_AFTER_OR: &str = r"(?i)\bor\s+(\d+)\s*\((?:\{@damage ([^}]+)\}|(\d+d\d+(?:\s*[+-]\s*\d+)?))\)\s+([a-z]+)\s+damage\s+(?:if|when)\s+([^—.,]*?)(?:\s*(?:to\s+make|to\s+attack|if\s+|when\s+|plus\s+|\.|,|$))";
const PLUS_DAMAGE: &str = r"(?i)plus\s+(\d+)\s*\((?:\{@damage ([^}]+)\}|(\d+d\d+(?:\s*[+-]\s*\d+)?))\)\s+([a-z]+)\s+damage";
const ONGOING_DAMAGE: &str = r"(?i)(and it |^|, and )?(takes|suffers) (\d+) \(([^)]+)\) (\w+) damage at the (start|beginning) of";

static DAMAGE_RULE_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
static HEALING_RULE_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
static BASE_BEFORE_OR_REGEX: OnceLock<Regex> = OnceLock::new();
static ALTERNATE_AFTER_OR_REGEX: OnceLock<Regex> = OnceLock::new();
static PLUS_DAMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
static ONGOING_DAMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
static DICE_REGEX: OnceLock<Regex> = OnceLock::new();

fn compile(rules: &[DamageRule]) -> Vec<Regex> {
    rules
        .iter()
        .map(|rule| Regex::new(rule.pattern).expect("damage rule pattern is invalid"))
        .collect()
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("damage pattern is invalid"))
}

/// First `XdY[±Z]` expression in `text`.
pub fn find_dice(text: &str) -> Option<DamageDice> {
    let re = regex(&DICE_REGEX, r"\d+d\d+(?:\s*[+-]\s*\d+)?");
    let found = re.find(text)?;
    DamageDice::parse(found.as_str()).ok()
}

/// Dice from the tagged (2) or raw (3) capture of a conditional shape.
fn conditional_dice(caps: &Captures<'_>) -> Option<DamageDice> {
    caps.get(2).or_else(|| caps.get(3)).and_then(|m| find_dice(m.as_str()))
}

/// Extract one-time damage and ongoing effects from `text`.
pub fn extract_damage(text: &str) -> DamageExtraction {
    if text.is_empty() {
        return DamageExtraction::default();
    }

    let (remaining, ongoing) = extract_ongoing(text);

    if let Some(instances) = extract_conditional(&remaining) {
        return DamageExtraction { instances, ongoing };
    }

    let regexes = DAMAGE_RULE_REGEXES.get_or_init(|| compile(DAMAGE_RULES));
    let instances = first_matching_rule(DAMAGE_RULES, regexes, &remaining);
    DamageExtraction { instances, ongoing }
}

/// Healing instances, type `healing`.
pub fn extract_healing(text: &str) -> Vec<DamageInstance> {
    let regexes = HEALING_RULE_REGEXES.get_or_init(|| compile(HEALING_RULES));
    first_matching_rule(HEALING_RULES, regexes, text)
}

fn first_matching_rule(rules: &[DamageRule], regexes: &[Regex], text: &str) -> Vec<DamageInstance> {
    for (rule, re) in rules.iter().zip(regexes) {
        let mut found: Vec<DamageInstance> = Vec::new();
        for caps in re.captures_iter(text) {
            let Some(dice) = caps
                .get(rule.dice_group)
                .and_then(|m| find_dice(m.as_str()))
            else {
                continue;
            };
            let damage_type = match rule.damage_type {
                TypeSource::Group(group) => caps.get(group).map(|m| m.as_str()).unwrap_or_default(),
                TypeSource::Fixed(damage_type) => damage_type,
            };
            let instance = DamageInstance::new(dice, damage_type);
            if !found.iter().any(|existing| existing.same_roll(&instance)) {
                found.push(instance);
            }
        }
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Lift ongoing damage out of `text`, returning what is left.
fn extract_ongoing(text: &str) -> (String, Vec<OngoingEffect>) {
    let re = regex(&ONGOING_DAMAGE_REGEX, ONGOING_DAMAGE);
    let ongoing: Vec<OngoingEffect> = re
        .captures_iter(text)
        .filter_map(|caps| {
            let dice = find_dice(&caps[4])?;
            Some(OngoingEffect {
                trigger: EffectTrigger::StartOfTurn,
                damage: DamageInstance::new(dice, &caps[5]),
                source_text: caps[0].trim().to_string(),
            })
        })
        .collect();

    if ongoing.is_empty() {
        return (text.to_string(), ongoing);
    }
    (re.replace_all(text, "").into_owned(), ongoing)
}

/// "13 (3d6) cold damage, or 7 (1d8) cold damage if ..." shapes.
///
/// Returns `None` unless the alternate branch is present.
fn extract_conditional(text: &str) -> Option<Vec<DamageInstance>> {
    let alternate = regex(&ALTERNATE_AFTER_OR_REGEX, ALTERNATE_AFTER_OR);
    let alternates: Vec<DamageInstance> = alternate
        .captures_iter(text)
        .filter_map(|caps| {
            let dice = conditional_dice(&caps)?;
            let condition = resolve_text(caps[5].trim());
            Some(DamageInstance::new(dice, &caps[4]).with_condition(condition))
        })
        .collect();
    if alternates.is_empty() {
        return None;
    }

    let base = regex(&BASE_BEFORE_OR_REGEX, BASE_BEFORE_OR);
    let mut instances: Vec<DamageInstance> = base
        .captures_iter(text)
        .filter_map(|caps| {
            let dice = conditional_dice(&caps)?;
            Some(DamageInstance::new(dice, &caps[4]).with_condition("normal"))
        })
        .collect();
    instances.extend(alternates);

    let plus = regex(&PLUS_DAMAGE_REGEX, PLUS_DAMAGE);
    instances.extend(plus.captures_iter(text).filter_map(|caps| {
        let dice = conditional_dice(&caps)?;
        Some(DamageInstance::new(dice, &caps[4]))
    }));

    Some(instances)
}
