//! Action-shape parsers: attacks, multiattack, special actions, bonus
//! actions, reactions, traits and legendary actions.

use std::sync::OnceLock;

use bestiary_domain::{
    AbilityKey, ActionBody, ActionComponents, ActionOption, ActionRecord, AttackComponents,
    AttackRange, AttackRecord, DamageInstance, DamageKind, FailureEffect, LegendaryAction,
    LegendaryActions, MultiAttack, RangeKind, ReactionDetails, Recharge, SaveFailures, Trait,
    UsageLimit,
};
use regex_lite::Regex;
use tracing::debug;

use super::damage::{extract_damage, extract_healing, find_dice};
use super::fivetools_types::{
    FiveToolsEntry, FiveToolsEntryBlock, FiveToolsEntryNode, FiveToolsMonster, Lenient,
};
use super::markup::{classify_attack, clean_name, resolve_text};

/// Which list a non-attack action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Special,
    Bonus,
    Reaction,
}

const DEFAULT_LEGENDARY_COUNT: u32 = 3;

static RECHARGE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static RECHARGE_BARE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static RECHARGE_RANGE_REGEX: OnceLock<Regex> = OnceLock::new();
static RECHARGE_SINGLE_REGEX: OnceLock<Regex> = OnceLock::new();
static USAGE_REGEX: OnceLock<Regex> = OnceLock::new();
static HIT_REGEX: OnceLock<Regex> = OnceLock::new();
static REACH_REGEX: OnceLock<Regex> = OnceLock::new();
static RANGE_REGEX: OnceLock<Regex> = OnceLock::new();
static DAMAGE_OPTIONS_REGEX: OnceLock<Regex> = OnceLock::new();
static SAVE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
static DC_REGEX: OnceLock<Regex> = OnceLock::new();
static AREA_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static AREA_TEXT_REGEX: OnceLock<Regex> = OnceLock::new();
static CONDITION_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static HAZARD_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static COMPOUND_RESPONSE_REGEX: OnceLock<Regex> = OnceLock::new();
static SAVE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static RESPONSE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static DC_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static FAILURE_DAMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
static COST_REGEX: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("action pattern is invalid"))
}

// === Name suffixes ===

/// Recharge from a feature name.
///
/// `{@recharge 5}` is 5–6, a bare `{@recharge}` is 6, "(Recharge 4–6)" is
/// taken as written and "(Recharge 6)" is that face only. Ranges outside a
/// d6 give no recharge.
pub fn parse_recharge(name: &str) -> Option<Recharge> {
    if let Some(caps) = regex(&RECHARGE_TAG_REGEX, r"\{@recharge (\d+)\}").captures(name) {
        return caps[1].parse().ok().and_then(|min| Recharge::from_min(min).ok());
    }
    if regex(&RECHARGE_BARE_TAG_REGEX, r"\{@recharge\}").is_match(name) {
        return Some(Recharge::default());
    }
    if let Some(caps) =
        regex(&RECHARGE_RANGE_REGEX, r"(?i)\(recharge (\d+)\s*[-–]\s*(\d+)\)").captures(name)
    {
        let min = caps[1].parse().ok()?;
        let max = caps[2].parse().ok()?;
        return Recharge::new(min, max).ok();
    }
    if let Some(caps) = regex(&RECHARGE_SINGLE_REGEX, r"(?i)\(recharge (\d+)\)").captures(name) {
        return caps[1].parse().ok().and_then(|face| Recharge::exactly(face).ok());
    }
    None
}

/// "(3/Day)" becomes `{count: 3, period: "day"}`.
pub fn parse_usage(name: &str) -> Option<UsageLimit> {
    // The period ends at the first `;` or `,` ("1/Day; Costs 2 Actions").
    let caps = regex(&USAGE_REGEX, r"\((\d+)/([^);,]+)").captures(name)?;
    Some(UsageLimit {
        count: caps[1].parse().ok()?,
        period: resolve_text(caps[2].trim()).to_lowercase(),
    })
}

// === Entries ===

/// Top-level prose entries joined with spaces, markup intact.
pub fn raw_prose(entries: &[FiveToolsEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| match entry {
            FiveToolsEntry::Prose(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display body: structured when any entry is a list, otherwise flat text.
pub fn parse_body(entries: &[FiveToolsEntry]) -> ActionBody {
    let has_list = entries
        .iter()
        .any(|entry| matches!(entry, FiveToolsEntry::Node(FiveToolsEntryNode::List { .. })));
    if !has_list {
        return ActionBody::text(render_entries(entries));
    }

    let description = resolve_text(&raw_prose(entries));
    let options = entries
        .iter()
        .filter_map(|entry| match entry {
            FiveToolsEntry::Node(FiveToolsEntryNode::List { items }) => Some(items),
            _ => None,
        })
        .flatten()
        .filter_map(parse_option)
        .collect();
    ActionBody::structured(description, options)
}

fn render_entries(entries: &[FiveToolsEntry]) -> String {
    let parts: Vec<String> = entries.iter().filter_map(render_entry).collect();
    resolve_text(&parts.join(" "))
}

pub(super) fn render_entry(entry: &FiveToolsEntry) -> Option<String> {
    match entry {
        FiveToolsEntry::Prose(text) => Some(text.clone()),
        FiveToolsEntry::Node(FiveToolsEntryNode::List { items }) => {
            Some(items.iter().filter_map(render_entry).collect::<Vec<_>>().join(" "))
        }
        FiveToolsEntry::Node(FiveToolsEntryNode::Item {
            name,
            entries,
            entry,
        }) => {
            let mut body: Vec<String> = entries.iter().filter_map(render_entry).collect();
            body.extend(entry.clone());
            Some(with_heading(name.as_deref(), &body.join(" ")))
        }
        FiveToolsEntry::Node(FiveToolsEntryNode::Entries { name, entries }) => {
            let body: Vec<String> = entries.iter().filter_map(render_entry).collect();
            Some(with_heading(name.as_deref(), &body.join(" ")))
        }
        FiveToolsEntry::Unknown(value) => {
            debug!(entry = %value, "Skipping entry of unknown shape");
            None
        }
    }
}

/// "Name. text", without doubling a trailing period.
fn with_heading(name: Option<&str>, body: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if name.ends_with('.') => format!("{} {}", name, body),
        Some(name) => format!("{}. {}", name, body),
        None => body.to_string(),
    }
}

fn parse_option(item: &FiveToolsEntry) -> Option<ActionOption> {
    let (name, raw) = match item {
        FiveToolsEntry::Prose(text) => (String::new(), text.clone()),
        FiveToolsEntry::Node(FiveToolsEntryNode::Item {
            name,
            entries,
            entry,
        }) => {
            let mut parts: Vec<String> = entries.iter().filter_map(render_entry).collect();
            parts.extend(entry.clone());
            let name = resolve_text(name.as_deref().unwrap_or_default());
            (name.trim_end_matches('.').to_string(), parts.join(" "))
        }
        FiveToolsEntry::Node(FiveToolsEntryNode::Entries { name, entries }) => {
            let parts: Vec<String> = entries.iter().filter_map(render_entry).collect();
            let name = resolve_text(name.as_deref().unwrap_or_default());
            (name.trim_end_matches('.').to_string(), parts.join(" "))
        }
        other => {
            debug!(item = ?other, "Skipping list item without an option shape");
            return None;
        }
    };

    let text = resolve_text(&raw);
    let (area_size, area_type) = parse_area(&raw, &text).unzip();
    let mut damage = extract_damage(&raw).instances;
    damage.extend(extract_healing(&raw));

    Some(ActionOption {
        name,
        save_ability: parse_save_ability(&text),
        save_dc: parse_dc(&text),
        area_type,
        area_size,
        damage,
        effects: tag_names(&HAZARD_TAG_REGEX, r"\{@hazard ([^|}]+)[^}]*\}", &raw, false),
        conditions: tag_names(&CONDITION_TAG_REGEX, r"\{@condition ([^|}]+)[^}]*\}", &raw, true),
        text,
    })
}

// === Shared component helpers ===

/// Save ability named in resolved text ("Dexterity Saving Throw").
fn parse_save_ability(text: &str) -> Option<AbilityKey> {
    let re = regex(
        &SAVE_NAME_REGEX,
        r"(?i)\b(strength|dexterity|constitution|intelligence|wisdom|charisma)\s+saving throw",
    );
    let name = re.captures(text)?.get(1)?.as_str().to_lowercase();
    AbilityKey::ALL
        .iter()
        .copied()
        .find(|key| key.full_name().to_lowercase() == name)
}

fn parse_dc(text: &str) -> Option<u32> {
    let caps = regex(&DC_REGEX, r"\bDC\s+(\d+)").captures(text)?;
    caps[1].parse().ok()
}

/// Area as ("20-foot", "emanation"), tagged shape first.
fn parse_area(raw: &str, resolved: &str) -> Option<(String, String)> {
    let tagged = regex(
        &AREA_TAG_REGEX,
        r"(\d+)-foot(?:-radius)?\s+\{@variantrule ([^|\[}]+)[^}]*\}",
    );
    if let Some(caps) = tagged.captures(raw) {
        return Some((
            format!("{}-foot", &caps[1]),
            caps[2].trim().to_lowercase(),
        ));
    }
    let untagged = regex(
        &AREA_TEXT_REGEX,
        r"(?i)(\d+)-foot(?:-radius)?\s+(cone|cube|cylinder|emanation|line|sphere|radius)",
    );
    let caps = untagged.captures(resolved)?;
    Some((format!("{}-foot", &caps[1]), caps[2].to_lowercase()))
}

/// Distinct names of one tag kind, in order of appearance.
fn tag_names(
    cell: &'static OnceLock<Regex>,
    pattern: &str,
    raw: &str,
    lowercase: bool,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in regex(cell, pattern).captures_iter(raw) {
        let name = caps[1].trim();
        let name = if lowercase {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// The text after `start` up to the first of `ends`, or the end.
fn slice_after<'a>(text: &'a str, start: &str, ends: &[&str]) -> Option<&'a str> {
    let begin = text.find(start)? + start.len();
    let rest = &text[begin..];
    let end = ends
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// The text after the first match of `re` up to the first of `ends`.
fn slice_after_match<'a>(text: &'a str, re: &Regex, ends: &[&str]) -> Option<&'a str> {
    let begin = re.find(text)?.end();
    let rest = &text[begin..];
    let end = ends
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// === Multiattack ===

pub fn is_multiattack(block: &FiveToolsEntryBlock) -> bool {
    block.name.to_lowercase().contains("multiattack")
}

/// Actions whose first paragraph makes an attack roll.
pub fn is_attack(block: &FiveToolsEntryBlock) -> bool {
    let first = block.first_prose();
    first.contains("{@atk") || first.contains("{@hit ")
}

/// The multiattack summary and the other actions it names.
pub fn parse_multiattack(actions: &[FiveToolsEntryBlock]) -> Option<MultiAttack> {
    let multi = actions.iter().find(|block| is_multiattack(block))?;
    let raw = raw_prose(&multi.entries);
    if raw.trim().is_empty() {
        return None;
    }
    let raw_lower = raw.to_lowercase();

    let attacks = actions
        .iter()
        .filter(|block| !is_multiattack(block))
        .map(|block| clean_name(&block.name).to_lowercase())
        .filter(|name| !name.is_empty() && raw_lower.contains(name.as_str()))
        .collect();

    Some(MultiAttack {
        text: resolve_text(&raw),
        attacks,
    })
}

// === Attacks ===

pub fn parse_attack(block: &FiveToolsEntryBlock) -> AttackRecord {
    let raw = raw_prose(&block.entries);
    let first = block.first_prose();
    let text = parse_body(&block.entries).display_text().to_string();

    let attack_modifier = regex(&HIT_REGEX, r"\{@hit ([-+]?\d+)\}")
        .captures(first)
        .and_then(|caps| caps[1].parse::<i32>().ok());
    let range = parse_range(&text);

    let extraction = extract_damage(&raw);
    let damage_kind = if extraction.is_conditional() {
        DamageKind::Conditional
    } else {
        DamageKind::Standard
    };

    let components = attack_components(
        first,
        &raw,
        &text,
        attack_modifier,
        range,
        &extraction.instances,
    );

    AttackRecord {
        name: clean_name(&block.name),
        attack_modifier,
        damage: extraction.instances,
        damage_kind,
        range,
        recharge: parse_recharge(&block.name),
        components,
        text,
        ongoing_effects: extraction.ongoing,
    }
}

/// Reach, range, or the hybrid "reach X ft. or range Y/Z ft.".
fn parse_range(text: &str) -> Option<AttackRange> {
    let reach = regex(&REACH_REGEX, r"(?i)\breach\s+(\d+)\s*ft")
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok());
    let range = regex(&RANGE_REGEX, r"(?i)\brange\s+(\d+)(?:/(\d+))?\s*ft")
        .captures(text)
        .and_then(|caps| {
            let normal = caps[1].parse::<u32>().ok()?;
            let long = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            Some((normal, long))
        });

    match (reach, range) {
        (Some(reach), Some((normal, long))) => {
            Some(AttackRange::ranged(normal, long).with_reach(reach))
        }
        (Some(reach), None) => Some(AttackRange::melee(reach)),
        (None, Some((normal, long))) => Some(AttackRange::ranged(normal, long)),
        (None, None) => None,
    }
}

fn range_display(range: &AttackRange) -> String {
    let distance = match range.long {
        Some(long) => format!("{}/{} ft", range.normal, long),
        None => format!("{} ft", range.normal),
    };
    match (range.kind, range.reach) {
        (RangeKind::Ranged, Some(reach)) => format!("reach {} ft. or range {}", reach, distance),
        _ => distance,
    }
}

fn attack_components(
    first: &str,
    raw: &str,
    text: &str,
    to_hit: Option<i32>,
    range: Option<AttackRange>,
    damage: &[DamageInstance],
) -> AttackComponents {
    let mut summaries = damage
        .iter()
        .filter(|instance| !instance.is_healing())
        .map(DamageInstance::summary);
    let primary = summaries.next();
    let additional_damage = summaries.collect();

    let damage_options = regex(
        &DAMAGE_OPTIONS_REGEX,
        r"(?i)damage of a type chosen[^:]*:\s*([^.]+)",
    )
    .captures(text)
    .map(|caps| caps[1].trim().to_string());

    let save_ability = parse_save_ability(text);
    let first_failure = slice_after(raw, "{@actSaveFail 1}", &["{@actSave"])
        .map(resolve_text)
        .and_then(non_empty);
    let second_failure = slice_after(raw, "{@actSaveFail 2}", &["{@actSave"])
        .map(resolve_text)
        .and_then(non_empty);
    let save_failures = if first_failure.is_some() || second_failure.is_some() {
        Some(SaveFailures {
            first: first_failure,
            second: second_failure,
        })
    } else {
        None
    };

    AttackComponents {
        attack_type: classify_attack(first).map(str::to_string),
        to_hit,
        range: range.as_ref().map(range_display),
        damage_average: primary.as_ref().map(|p| p.average),
        damage_formula: primary.as_ref().map(|p| p.formula.clone()),
        damage_type: primary.map(|p| p.damage_type),
        additional_damage,
        damage_options,
        save_ability,
        save_type: save_ability.map(|key| key.saving_throw_label()),
        save_dc: parse_dc(text),
        save_failures,
    }
}

// === Special, bonus and reaction actions ===

pub fn parse_action(block: &FiveToolsEntryBlock, kind: ActionKind) -> ActionRecord {
    let raw = raw_prose(&block.entries);
    let body = parse_body(&block.entries);

    let extraction = extract_damage(&raw);
    let mut damage = extraction.instances;
    damage.extend(extract_healing(&raw));

    let resolved = resolve_text(&raw);
    let save_ability = parse_save_ability(&resolved);
    let (area_size, area_type) = parse_area(&raw, &resolved).unzip();
    let reaction = match kind {
        ActionKind::Reaction => Some(parse_reaction(&raw)),
        ActionKind::Special | ActionKind::Bonus => None,
    };

    let components = ActionComponents {
        save_ability,
        save_type: save_ability.map(|key| key.saving_throw_label()),
        save_dc: parse_dc(&resolved),
        area_type,
        area_size,
        damage: damage
            .iter()
            .filter(|instance| !instance.is_healing())
            .map(DamageInstance::summary)
            .collect(),
        conditions: tag_names(&CONDITION_TAG_REGEX, r"\{@condition ([^|}]+)[^}]*\}", &raw, true),
        reaction,
    };

    ActionRecord {
        name: clean_name(&block.name),
        recharge: parse_recharge(&block.name),
        usage: parse_usage(&block.name),
        damage,
        components,
        body,
        ongoing_effects: extraction.ongoing,
        spellcasting: false,
    }
}

fn parse_reaction(raw: &str) -> ReactionDetails {
    let trigger = slice_after(raw, "{@actTrigger}", &["{@actResponse"])
        .map(resolve_text)
        .and_then(non_empty);

    let compound = regex(&COMPOUND_RESPONSE_REGEX, r"\{@actResponse d\}\s*\{@actSave (\w+)\}");
    let save = regex(&SAVE_TAG_REGEX, r"\{@actSave (\w+)\}");
    let response_type = compound
        .captures(raw)
        .or_else(|| save.captures(raw))
        .map(|caps| match AbilityKey::from_code(&caps[1]) {
            Some(key) => key.saving_throw_label(),
            None => caps[1].to_string(),
        })
        .or_else(|| {
            regex(&RESPONSE_TAG_REGEX, r"\{@actResponse ([^}]*)\}")
                .captures(raw)
                .map(|caps| caps[1].trim().to_string())
                .and_then(non_empty)
        });

    let dc_tag = regex(&DC_TAG_REGEX, r"\{@dc \d+[^}]*\}");
    let target = slice_after_match(raw, dc_tag, &["{@actSaveFail", "{@actSaveSuccess"])
        .map(|slice| {
            resolve_text(slice)
                .trim_start_matches([',', ' '])
                .trim_end_matches([',', '.'])
                .trim()
                .to_string()
        })
        .and_then(non_empty);

    let failure = raw
        .find("{@actSaveFail")
        .and_then(|start| raw[start..].find('}').map(|close| start + close + 1))
        .map(|begin| {
            let rest = &raw[begin..];
            let end = rest.find("{@actSaveSuccess").unwrap_or(rest.len());
            resolve_text(&rest[..end])
        })
        .and_then(non_empty)
        .map(|text| failure_effect(&text));

    ReactionDetails {
        trigger,
        response_type,
        target,
        failure,
    }
}

/// Damage when the failure text states some, otherwise the text.
fn failure_effect(text: &str) -> FailureEffect {
    let re = regex(
        &FAILURE_DAMAGE_REGEX,
        r"(\d+)\s*\(([^)]+)\)\s+([A-Za-z]+)\s+damage",
    );
    re.captures(text)
        .and_then(|caps| {
            let dice = find_dice(&caps[2])?;
            Some(FailureEffect::Damage(
                DamageInstance::new(dice, &caps[3]).summary(),
            ))
        })
        .unwrap_or_else(|| FailureEffect::Text(text.to_string()))
}

// === Traits and legendary actions ===

pub fn parse_trait(block: &FiveToolsEntryBlock) -> Trait {
    Trait {
        name: clean_name(&block.name),
        body: parse_body(&block.entries),
        spellcasting: false,
    }
}

pub fn parse_legendary(monster: &FiveToolsMonster) -> Option<LegendaryActions> {
    let blocks = monster.legendary.as_ref()?;
    let cost_regex = regex(&COST_REGEX, r"(?i)\(costs (\d+) actions?\)");

    let actions = blocks
        .iter()
        .map(|block| {
            let cost = cost_regex
                .captures(&block.name)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(1);
            LegendaryAction {
                name: clean_name(&block.name),
                cost,
                text: parse_body(&block.entries).display_text().to_string(),
                damage: extract_damage(&raw_prose(&block.entries)).instances,
            }
        })
        .collect();

    let header = monster
        .legendary_header
        .iter()
        .filter_map(render_entry)
        .map(|text| resolve_text(&text))
        .filter(|text| !text.is_empty())
        .collect();

    Some(LegendaryActions {
        count: monster
            .legendary_actions
            .as_ref()
            .and_then(Lenient::known)
            .copied()
            .unwrap_or(DEFAULT_LEGENDARY_COUNT),
        count_lair: monster
            .legendary_actions_lair
            .as_ref()
            .and_then(Lenient::known)
            .copied(),
        header,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: serde_json::Value) -> FiveToolsEntryBlock {
        serde_json::from_value(value).expect("entry block")
    }

    #[test]
    fn recharge_shapes() {
        assert_eq!(
            parse_recharge("Fire Breath {@recharge 5}"),
            Some(Recharge::from_min(5).expect("valid"))
        );
        assert_eq!(parse_recharge("Roar {@recharge}"), Some(Recharge::default()));
        assert_eq!(
            parse_recharge("Breath (Recharge 4–6)"),
            Some(Recharge::new(4, 6).expect("valid"))
        );
        assert_eq!(
            parse_recharge("Breath (Recharge 5-6)"),
            Some(Recharge::new(5, 6).expect("valid"))
        );
        assert_eq!(
            parse_recharge("Burst (Recharge 6)"),
            Some(Recharge::exactly(6).expect("valid"))
        );
        assert_eq!(parse_recharge("Breath (Recharge 6-4)"), None);
        assert_eq!(parse_recharge("Breath {@recharge 9}"), None);
        assert_eq!(parse_recharge("Bite"), None);
    }

    #[test]
    fn usage_from_name() {
        assert_eq!(
            parse_usage("Teleport (3/Day)"),
            Some(UsageLimit {
                count: 3,
                period: "day".to_string()
            })
        );
        assert_eq!(parse_usage("Bite"), None);
    }

    #[test]
    fn usage_period_stops_at_separator() {
        let expected = Some(UsageLimit {
            count: 1,
            period: "day".to_string(),
        });
        assert_eq!(parse_usage("Teleport (1/Day; Costs 2 Actions)"), expected);
        assert_eq!(parse_usage("Teleport (1/Day, Costs 2 Actions)"), expected);
    }

    #[test]
    fn attack_example() {
        let attack = parse_attack(&block(json!({
            "name": "Longsword",
            "entries": ["Melee Weapon Attack: {@hit +5}, reach 5 ft., one target. Hit: {@damage 1d8 +3} Slashing damage."]
        })));

        assert_eq!(
            attack.components.attack_type.as_deref(),
            Some("Melee Weapon Attack:")
        );
        assert_eq!(attack.attack_modifier, Some(5));
        assert_eq!(attack.range, Some(AttackRange::melee(5)));
        assert_eq!(attack.damage.len(), 1);
        assert_eq!(
            serde_json::to_value(&attack.damage[0]).expect("serialize"),
            json!({
                "dieCount": 1,
                "dieSize": 8,
                "modifier": 3,
                "type": "slashing",
                "average": 7,
                "formula": "1d8 + 3"
            })
        );
        assert_eq!(attack.damage_kind, DamageKind::Standard);
        assert_eq!(attack.components.range.as_deref(), Some("5 ft"));
        assert_eq!(attack.components.damage_average, Some(7));
    }

    #[test]
    fn hybrid_range_attack() {
        let attack = parse_attack(&block(json!({
            "name": "Spear",
            "entries": ["{@atk mw,rw} {@hit 4} to hit, reach 5 ft. or range 20/60 ft., one target. {@h}5 ({@damage 1d6 + 2}) piercing damage."]
        })));
        assert_eq!(
            attack.range,
            Some(AttackRange::ranged(20, Some(60)).with_reach(5))
        );
        assert_eq!(
            attack.components.range.as_deref(),
            Some("reach 5 ft. or range 20/60 ft")
        );
        assert_eq!(
            attack.components.attack_type.as_deref(),
            Some("Melee or Ranged Weapon Attack:")
        );
        assert_eq!(
            attack.text,
            "Melee or Ranged Weapon Attack: +4 to hit, reach 5 ft. or range 20/60 ft., one target. Hit: 5 (1d6 + 2) piercing damage."
        );
    }

    #[test]
    fn conditional_attack_is_flagged() {
        let attack = parse_attack(&block(json!({
            "name": "Claw",
            "entries": ["{@atk mw} {@hit 6} to hit, reach 5 ft. {@h}9 ({@damage 2d6 + 2}) slashing damage, or 12 ({@damage 3d6 + 2}) slashing damage if the target is {@condition prone}."]
        })));
        assert_eq!(attack.damage_kind, DamageKind::Conditional);
        assert_eq!(attack.damage.len(), 2);
    }

    #[test]
    fn multiattack_names_referenced_actions() {
        let actions = vec![
            block(json!({"name": "Multiattack", "entries": ["The dragon makes one {@action Bite} attack and two Claw attacks."]})),
            block(json!({"name": "Bite", "entries": ["{@atk mw} {@hit 7}"]})),
            block(json!({"name": "Claw", "entries": ["{@atk mw} {@hit 7}"]})),
            block(json!({"name": "Fire Breath {@recharge 5}", "entries": ["Exhales fire."]})),
        ];
        let multi = parse_multiattack(&actions).expect("multiattack");
        assert_eq!(multi.attacks, vec!["bite".to_string(), "claw".to_string()]);
        assert_eq!(
            multi.text,
            "The dragon makes one Bite attack and two Claw attacks."
        );
        assert!(!is_attack(&actions[0]));
        assert!(is_attack(&actions[1]));
    }

    #[test]
    fn special_action_with_save_and_area() {
        let action = parse_action(
            &block(json!({
                "name": "Cold Breath {@recharge 5}",
                "entries": ["{@actSave con} {@dc 15}, 30-foot {@variantrule Cone [Area of Effect]|XPHB|Cone}, each creature. {@actSaveFail} 36 ({@damage 8d8}) cold damage. {@actSaveSuccess} Half damage."]
            })),
            ActionKind::Special,
        );
        assert_eq!(action.name, "Cold Breath");
        assert_eq!(action.recharge, Some(Recharge::from_min(5).expect("valid")));
        assert_eq!(action.components.save_ability, Some(AbilityKey::Con));
        assert_eq!(
            action.components.save_type.as_deref(),
            Some("Constitution Saving Throw")
        );
        assert_eq!(action.components.save_dc, Some(15));
        assert_eq!(action.components.area_size.as_deref(), Some("30-foot"));
        assert_eq!(action.components.area_type.as_deref(), Some("cone"));
        assert_eq!(action.damage.len(), 1);
        assert_eq!(action.damage[0].formula(), "8d8");
        assert!(action.components.reaction.is_none());
        assert_eq!(
            action.body.display_text(),
            "Constitution Saving Throw: DC 15, 30-foot Cone, each creature. Failure: 36 (8d8) cold damage. Success: Half damage."
        );
    }

    #[test]
    fn action_damage_then_healing() {
        let action = parse_action(
            &block(json!({
                "name": "Life Drain (1/Day)",
                "entries": ["The target takes 10 ({@damage 3d6}) necrotic damage, and the vampire regains 10 ({@dice 3d6}) hit points."]
            })),
            ActionKind::Bonus,
        );
        assert_eq!(action.damage.len(), 2);
        assert_eq!(action.damage[0].damage_type(), "necrotic");
        assert!(action.damage[1].is_healing());
        assert_eq!(action.components.damage.len(), 1);
        assert_eq!(action.usage.map(|u| u.count), Some(1));
    }

    #[test]
    fn structured_options() {
        let action = parse_action(
            &block(json!({
                "name": "Breath Weapons {@recharge 5}",
                "entries": [
                    "The dragon uses one of the following breath weapons.",
                    {"type": "list", "items": [
                        {"type": "item", "name": "Fire Breath.", "entries": [
                            "{@actSave dex} {@dc 18}, 60-foot {@variantrule Cone [Area of Effect]|XPHB|Cone}. {@actSaveFail} 55 ({@damage 10d10}) fire damage."
                        ]},
                        {"type": "item", "name": "Sleep Breath.", "entries": [
                            "{@actSave con} {@dc 18}, 60-foot cone. {@actSaveFail} The target has the {@condition Unconscious|XPHB} condition."
                        ]}
                    ]}
                ]
            })),
            ActionKind::Special,
        );

        match &action.body {
            ActionBody::Structured {
                description,
                options,
                text,
            } => {
                assert_eq!(description, "The dragon uses one of the following breath weapons.");
                assert_eq!(text, description);
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].name, "Fire Breath");
                assert_eq!(options[0].save_ability, Some(AbilityKey::Dex));
                assert_eq!(options[0].save_dc, Some(18));
                assert_eq!(options[0].area_type.as_deref(), Some("cone"));
                assert_eq!(options[0].area_size.as_deref(), Some("60-foot"));
                assert_eq!(options[0].damage[0].formula(), "10d10");
                assert_eq!(options[1].conditions, vec!["unconscious".to_string()]);
                assert_eq!(options[1].area_type.as_deref(), Some("cone"));
            }
            other => panic!("expected structured body, got {:?}", other),
        }
    }

    #[test]
    fn flat_body_renders_items() {
        let body = parse_body(&[
            FiveToolsEntry::Prose("Intro.".to_string()),
            FiveToolsEntry::Node(FiveToolsEntryNode::Entries {
                name: Some("Aura".to_string()),
                entries: vec![FiveToolsEntry::Prose("Burns {@damage 1d6}.".to_string())],
            }),
            FiveToolsEntry::Unknown(json!({"type": "table"})),
        ]);
        assert_eq!(body, ActionBody::text("Intro. Aura. Burns 1d6."));
    }

    #[test]
    fn reaction_details() {
        let reaction = parse_action(
            &block(json!({
                "name": "Tail Swipe",
                "entries": ["{@actTrigger} A creature the dragon can see ends its turn within 10 feet. {@actResponse d}{@actSave dex} {@dc 16}, the triggering creature. {@actSaveFail} 11 ({@damage 2d6 + 4}) bludgeoning damage. {@actSaveSuccess} Half damage."]
            })),
            ActionKind::Reaction,
        );
        let details = reaction.components.reaction.expect("reaction details");
        assert_eq!(
            details.trigger.as_deref(),
            Some("A creature the dragon can see ends its turn within 10 feet.")
        );
        assert_eq!(
            details.response_type.as_deref(),
            Some("Dexterity Saving Throw")
        );
        assert_eq!(details.target.as_deref(), Some("the triggering creature"));
        match details.failure {
            Some(FailureEffect::Damage(summary)) => {
                assert_eq!(summary.average, 11);
                assert_eq!(summary.formula, "2d6 + 4");
                assert_eq!(summary.damage_type, "bludgeoning");
            }
            other => panic!("expected damage failure, got {:?}", other),
        }
        assert_eq!(reaction.components.save_dc, Some(16));
    }

    #[test]
    fn reaction_failure_as_text() {
        let reaction = parse_action(
            &block(json!({
                "name": "Repel",
                "entries": ["{@actTrigger} A creature hits the golem. {@actResponse d}{@actSave str} {@dc 14}, the attacker. {@actSaveFail} The attacker is pushed 10 feet."]
            })),
            ActionKind::Reaction,
        );
        let details = reaction.components.reaction.expect("reaction details");
        assert_eq!(
            details.failure,
            Some(FailureEffect::Text("The attacker is pushed 10 feet.".to_string()))
        );
    }

    #[test]
    fn legendary_costs_and_defaults() {
        let monster: FiveToolsMonster = serde_json::from_value(json!({
            "name": "Dragon",
            "legendaryHeader": ["The dragon can take 3 legendary actions."],
            "legendary": [
                {"name": "Detect", "entries": ["The dragon makes a check."]},
                {"name": "Wing Attack (Costs 2 Actions)", "entries": ["Each creature takes 13 ({@damage 2d6 + 6}) bludgeoning damage."]}
            ]
        }))
        .expect("monster");

        let legendary = parse_legendary(&monster).expect("legendary");
        assert_eq!(legendary.count, 3);
        assert_eq!(legendary.count_lair, None);
        assert_eq!(legendary.header, vec!["The dragon can take 3 legendary actions.".to_string()]);
        assert_eq!(legendary.actions[0].cost, 1);
        assert_eq!(legendary.actions[1].cost, 2);
        assert_eq!(legendary.actions[1].name, "Wing Attack (Costs 2 Actions)");
        assert_eq!(legendary.actions[1].damage[0].formula(), "2d6 + 6");
    }

    #[test]
    fn malformed_legendary_count_falls_back() {
        let monster: FiveToolsMonster = serde_json::from_value(json!({
            "name": "Lich",
            "legendaryActions": "three",
            "legendaryActionsLair": 4,
            "legendary": [{"name": "Cantrip", "entries": ["The lich casts a cantrip."]}]
        }))
        .expect("monster");

        let legendary = parse_legendary(&monster).expect("legendary");
        assert_eq!(legendary.count, 3);
        assert_eq!(legendary.count_lair, Some(4));
    }

    #[test]
    fn no_legendary_block() {
        let monster: FiveToolsMonster =
            serde_json::from_value(json!({"name": "Goblin"})).expect("monster");
        assert!(parse_legendary(&monster).is_none());
    }
}
