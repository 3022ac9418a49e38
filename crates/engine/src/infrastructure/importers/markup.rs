//! 5etools inline markup resolution.
//!
//! Stat-block prose embeds `{@tag args}` annotations. [`resolve_text`]
//! rewrites every recognized tag into display text, deletes the rest, and
//! normalizes whitespace. Rules live in one ordered table; a rule that is a
//! more specific form of a later one must stay ahead of it.
//!
//! Patterns are compiled once into a `OnceLock` and every call is a fresh
//! scan, so the resolver can be used from any number of threads.

use std::sync::OnceLock;

use bestiary_domain::AbilityKey;
use regex_lite::{Captures, Regex};

/// What a rule's tag means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// Attack-roll markers; their template is the attack label
    Attack,
    /// To-hit, hit/miss, damage, dice and DC markers
    Roll,
    /// Named references to rules content
    Reference,
    /// Reaction trigger/response and save outcome markers
    Reaction,
}

/// How a matched tag is rewritten.
#[derive(Clone, Copy)]
pub enum Rewrite {
    /// Replacement with `$n` capture expansion
    Template(&'static str),
    /// Replacement computed from the captures
    Computed(fn(&Captures<'_>) -> String),
}

pub struct TagRule {
    pub category: TagCategory,
    pub pattern: &'static str,
    pub rewrite: Rewrite,
}

const fn template(category: TagCategory, pattern: &'static str, text: &'static str) -> TagRule {
    TagRule {
        category,
        pattern,
        rewrite: Rewrite::Template(text),
    }
}

const fn computed(
    category: TagCategory,
    pattern: &'static str,
    rewrite: fn(&Captures<'_>) -> String,
) -> TagRule {
    TagRule {
        category,
        pattern,
        rewrite: Rewrite::Computed(rewrite),
    }
}

use TagCategory::{Attack, Reaction, Reference, Roll};

/// The tag grammar, in evaluation order.
pub const TAG_RULES: &[TagRule] = &[
    // {@atkr m,r} before {@atkr m} and {@atkr r}
    template(Attack, r"\{@atkr m,r\}", "Melee or Ranged Attack Roll:"),
    template(Attack, r"\{@atkr m\}", "Melee Attack Roll:"),
    template(Attack, r"\{@atkr r\}", "Ranged Attack Roll:"),
    template(Attack, r"\{@atk mw\}", "Melee Weapon Attack:"),
    template(Attack, r"\{@atk rw\}", "Ranged Weapon Attack:"),
    template(Attack, r"\{@atk ms\}", "Melee Spell Attack:"),
    template(Attack, r"\{@atk rs\}", "Ranged Spell Attack:"),
    // {@atkm ...} / {@atka ...} carry free arguments
    template(Attack, r"\{@atkm [^}]*\}", "Melee Attack Roll:"),
    template(Attack, r"\{@atka [^}]*\}", "Ranged Attack Roll:"),
    template(Attack, r"\{@atk mw,rw\}", "Melee or Ranged Weapon Attack:"),
    template(Attack, r"\{@atk ms,rs\}", "Melee or Ranged Spell Attack:"),
    // {@hit 5}, {@hit +5}, {@hit -1}
    computed(Roll, r"\{@hit ([-+]?\d+)\}", signed_bonus),
    template(Roll, r"\{@h\}", "Hit: "),
    template(Roll, r"\{@hom\}", "Hit or Miss: "),
    // {@damage 2d6 + 3}
    template(Roll, r"\{@damage ([^}]+)\}", "$1"),
    template(Roll, r"\{@dc (\d+)[^}]*\}", "DC $1"),
    // {@dice 1d20|display}
    template(Roll, r"\{@dice ([^|}]+)[^}]*\}", "$1"),
    // {@skill Perception} {@skillCheck perception 5} before either half
    template(
        Reference,
        r"\{@skill ([^|}]+)[^}]*\}\s*\{@skillCheck [^}]*?\s\+?(\d+)\}",
        "$1 +$2",
    ),
    // {@action Dash||Dashes}, {@creature goblin|MM|goblins}, {@status x||y}
    computed(
        Reference,
        r"\{@(?:hazard|action|condition|skill|creature|spell|item|sense|status) ([^}]+)\}",
        display_segment,
    ),
    template(Reference, r"\{@skillCheck ([^}]+)\}", "$1"),
    template(Reference, r"\{@filter ([^|}]+)[^}]*\}", "$1"),
    // {@adventure id|source|chapter|Display}: the last segment
    computed(Reference, r"\{@adventure ([^}]+)\}", last_segment),
    // {@variantrule Emanation [Area of Effect]|XPHB|emanation}
    computed(Reference, r"\{@variantrule ([^}]+)\}", variant_rule),
    // {@quickref Cover||3||half cover}: display is the fifth segment
    computed(Reference, r"\{@quickref ([^}]+)\}", quickref),
    template(Reaction, r"\{@actTrigger\}", "Trigger:"),
    // {@actResponse d}{@actSave dex} before the lone response and save rules
    computed(
        Reaction,
        r"\{@actResponse d\}\s*\{@actSave (\w+)\}",
        response_with_save,
    ),
    template(Reaction, r"\{@actResponse\}", "Response:"),
    computed(Reaction, r"\{@actResponse ([^}]+)\}", response),
    computed(Reaction, r"\{@actSave (\w+)\}", save_label),
    computed(Reaction, r"\{@actSaveFail (\d+)\}", numbered_failure),
    template(Reaction, r"\{@actSaveFail\}", "Failure:"),
    template(Reaction, r"\{@actSaveSuccess\}", "Success:"),
    template(Reaction, r"\{@actSaveSuccessOrFail\}", "Failure or Success:"),
];

fn signed_bonus(caps: &Captures<'_>) -> String {
    match caps[1].parse::<i32>() {
        Ok(value) => format!("{:+}", value),
        Err(_) => caps[1].to_string(),
    }
}

fn segments<'a>(caps: &'a Captures<'_>) -> Vec<&'a str> {
    caps.get(1)
        .map(|m| m.as_str().split('|').collect())
        .unwrap_or_default()
}

/// Third segment when given, otherwise the name.
fn display_segment(caps: &Captures<'_>) -> String {
    let parts = segments(caps);
    match parts.get(2) {
        Some(display) if !display.trim().is_empty() => display.trim().to_string(),
        _ => parts.first().map(|s| s.trim()).unwrap_or_default().to_string(),
    }
}

fn last_segment(caps: &Captures<'_>) -> String {
    segments(caps)
        .last()
        .map(|s| s.trim())
        .unwrap_or_default()
        .to_string()
}

fn variant_rule(caps: &Captures<'_>) -> String {
    let parts = segments(caps);
    if let Some(display) = parts.get(2).filter(|d| !d.trim().is_empty()) {
        return display.trim().to_string();
    }
    let name = parts.first().copied().unwrap_or_default();
    let name = match name.find('[') {
        Some(bracket) => &name[..bracket],
        None => name,
    };
    name.trim().to_string()
}

fn quickref(caps: &Captures<'_>) -> String {
    let parts = segments(caps);
    match parts.get(4) {
        Some(display) if !display.trim().is_empty() => display.trim().to_string(),
        _ => parts.first().map(|s| s.trim()).unwrap_or_default().to_string(),
    }
}

fn ability_label(code: &str) -> String {
    match AbilityKey::from_code(code) {
        Some(key) => key.saving_throw_label(),
        None => format!("{} Saving Throw", code),
    }
}

fn response_with_save(caps: &Captures<'_>) -> String {
    format!("Response—{}:", ability_label(&caps[1]))
}

fn response(caps: &Captures<'_>) -> String {
    match &caps[1] {
        "d" => "Response—Saving Throw:".to_string(),
        other => format!("Response—{}:", other),
    }
}

fn save_label(caps: &Captures<'_>) -> String {
    format!("{}:", ability_label(&caps[1]))
}

fn numbered_failure(caps: &Captures<'_>) -> String {
    let ordinal = match &caps[1] {
        "1" => "First",
        "2" => "Second",
        "3" => "Third",
        other => other,
    };
    format!("{} Failure:", ordinal)
}

struct CompiledRule {
    regex: Regex,
    rule: &'static TagRule,
}

static COMPILED_RULES: OnceLock<Vec<CompiledRule>> = OnceLock::new();
static RESIDUAL_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static SPACE_BEFORE_PUNCT_REGEX: OnceLock<Regex> = OnceLock::new();
static LEADING_COMMA_REGEX: OnceLock<Regex> = OnceLock::new();
static ESCAPED_QUOTE_REGEX: OnceLock<Regex> = OnceLock::new();
static RECHARGE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn compiled_rules() -> &'static [CompiledRule] {
    COMPILED_RULES.get_or_init(|| {
        TAG_RULES
            .iter()
            .map(|rule| CompiledRule {
                regex: Regex::new(rule.pattern).expect("TAG_RULES pattern is invalid"),
                rule,
            })
            .collect()
    })
}

/// Rewrite every recognized tag and normalize whitespace.
///
/// Unrecognized tags are deleted. Resolving already-resolved text returns
/// it unchanged.
pub fn resolve_text(text: &str) -> String {
    let mut result = text.to_string();

    for compiled in compiled_rules() {
        if !compiled.regex.is_match(&result) {
            continue;
        }
        result = match compiled.rule.rewrite {
            Rewrite::Template(replacement) => compiled
                .regex
                .replace_all(&result, replacement)
                .into_owned(),
            Rewrite::Computed(rewrite) => compiled
                .regex
                .replace_all(&result, |caps: &Captures<'_>| rewrite(caps))
                .into_owned(),
        };
    }

    let residual = RESIDUAL_TAG_REGEX.get_or_init(|| {
        Regex::new(r"\{@[^}]*\}").expect("RESIDUAL_TAG_REGEX pattern is invalid")
    });
    let result = residual.replace_all(&result, "");

    let whitespace = WHITESPACE_REGEX
        .get_or_init(|| Regex::new(r"\s+").expect("WHITESPACE_REGEX pattern is invalid"));
    let result = whitespace.replace_all(&result, " ");

    let before_punct = SPACE_BEFORE_PUNCT_REGEX.get_or_init(|| {
        Regex::new(r"\s+([.!?])").expect("SPACE_BEFORE_PUNCT_REGEX pattern is invalid")
    });
    let result = before_punct.replace_all(&result, "$1");

    let leading = LEADING_COMMA_REGEX
        .get_or_init(|| Regex::new(r"^[,\s]+").expect("LEADING_COMMA_REGEX pattern is invalid"));
    let result = leading.replace_all(&result, "");

    let quote = ESCAPED_QUOTE_REGEX
        .get_or_init(|| Regex::new(r#"\\+""#).expect("ESCAPED_QUOTE_REGEX pattern is invalid"));
    let result = quote.replace_all(&result, "\"");

    result.trim().to_string()
}

/// The first attack label whose marker appears in `text`, in table order.
///
/// Prose that already spells the label out ("Melee Weapon Attack: ...") is
/// classified by the label itself.
pub fn classify_attack(text: &str) -> Option<&'static str> {
    let attack_rules = || {
        compiled_rules()
            .iter()
            .filter(|compiled| compiled.rule.category == TagCategory::Attack)
            .filter_map(|compiled| match compiled.rule.rewrite {
                Rewrite::Template(label) => Some((&compiled.regex, label)),
                Rewrite::Computed(_) => None,
            })
    };

    attack_rules()
        .find(|(regex, _)| regex.is_match(text))
        .or_else(|| attack_rules().find(|(_, label)| text.contains(label)))
        .map(|(_, label)| label)
}

/// A feature name without its `{@recharge}` marker, resolved.
pub fn clean_name(name: &str) -> String {
    let recharge = RECHARGE_TAG_REGEX.get_or_init(|| {
        Regex::new(r"\s*\{@recharge[^}]*\}").expect("RECHARGE_TAG_REGEX pattern is invalid")
    });
    resolve_text(&recharge.replace_all(name, ""))
}
