//! 5etools bestiary importer.
//!
//! Reads 5etools monster JSON and converts each record into a normalized
//! [`Creature`]. Reading is per-record: a record that does not deserialize
//! is reported on its own and never aborts the rest of the file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use bestiary_domain::{
    AbilityKey, AbilityScore, AbilityScores, Actions, AlternateSpeed, ArmorClass,
    ChallengeRating, Creature, DefenseEntry, Diagnostic, DisplaySlot, HitPoints, Initiative,
    LegendaryGroupRef, SenseValue, Senses, SourceRef, Speed, SpeedValue, SpellcastingBlock,
};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use super::actions::{
    is_attack, is_multiattack, parse_action, parse_attack, parse_legendary, parse_multiattack,
    parse_trait, ActionKind,
};
use super::fivetools_types::*;
use super::markup::resolve_text;
use super::spellcasting::{normalize_spellcasting, to_action_record, to_trait};

// Static regex patterns (compiled once)
static SENSE_RANGE_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();

const UNKNOWN_ITEM: &str = "Unknown Item";
const DEFAULT_ABILITY_SCORE: i32 = 10;

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Data file not found: {0}")]
    DataFileNotFound(PathBuf),
    #[error("Expected a monster array in {0}")]
    NotAnArray(PathBuf),
    #[error("Invalid record {index} ({}): {reason}", .name.as_deref().unwrap_or("unnamed"))]
    InvalidRecord {
        index: usize,
        name: Option<String>,
        reason: String,
    },
}

/// Importer for a 5etools bestiary file.
pub struct FiveToolsImporter {
    data_path: PathBuf,
}

impl FiveToolsImporter {
    /// Create an importer for one bestiary file, either a bare array of
    /// monsters or the `{"monster": [...]}` wrapper 5etools ships.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    /// Read every record, decoding each one independently.
    ///
    /// The outer error covers the file itself; inner errors are records that
    /// failed to deserialize.
    pub async fn import_monsters(
        &self,
    ) -> Result<Vec<Result<FiveToolsMonster, ImportError>>, ImportError> {
        if !self.data_path.exists() {
            return Err(ImportError::DataFileNotFound(self.data_path.clone()));
        }

        let content = fs::read_to_string(&self.data_path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let file: FiveToolsBestiaryFile = serde_json::from_value(value)
            .map_err(|_| ImportError::NotAnArray(self.data_path.clone()))?;

        Ok(file
            .into_records()
            .into_iter()
            .enumerate()
            .map(|(index, record)| decode_record(index, record))
            .collect())
    }
}

/// Deserialize one raw record, naming it in the error when possible.
pub fn decode_record(
    index: usize,
    record: serde_json::Value,
) -> Result<FiveToolsMonster, ImportError> {
    let name = record
        .get("name")
        .and_then(|name| name.as_str())
        .map(str::to_string);
    serde_json::from_value(record).map_err(|e| ImportError::InvalidRecord {
        index,
        name,
        reason: e.to_string(),
    })
}

/// Collects diagnostics while one record is mapped.
#[derive(Default)]
struct MappingContext {
    diagnostics: Vec<Diagnostic>,
}

impl MappingContext {
    fn report(&mut self, field: impl Into<String>, message: &str, raw: &serde_json::Value) {
        let field = field.into();
        warn!(field = %field, raw = %raw, "{}", message);
        self.diagnostics
            .push(Diagnostic::new(field, message, raw.to_string()));
    }

    /// The value when it has the expected shape; a bad value is reported
    /// and read as absent.
    fn known<'a, T>(&mut self, field: &str, value: &'a Option<Lenient<T>>) -> Option<&'a T> {
        match value.as_ref()? {
            Lenient::Known(value) => Some(value),
            Lenient::Unknown(other) => {
                self.report(field, "Unexpected value shape", other);
                None
            }
        }
    }

    fn flag(&mut self, field: &str, value: &Option<Lenient<bool>>) -> bool {
        self.known(field, value).copied().unwrap_or(false)
    }

    fn text(&mut self, field: &str, value: &Option<Lenient<String>>) -> Option<String> {
        self.known(field, value).cloned()
    }

    /// The string elements of a list, skipping (and reporting) the rest.
    fn texts<'a>(&mut self, field: &str, list: &'a FiveToolsTextList) -> Vec<&'a str> {
        let items = match self.known(field, list) {
            Some(items) => items,
            None => return Vec::new(),
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Lenient::Known(text) => Some(text.as_str()),
                Lenient::Unknown(other) => {
                    self.report(format!("{}[{}]", field, index), "Expected a string", other);
                    None
                }
            })
            .collect()
    }
}

/// Convert one raw monster into a normalized creature.
///
/// Pure: the same record and id always produce the same creature.
pub fn map_creature(raw: &FiveToolsMonster, id: Option<u64>) -> Creature {
    let mut ctx = MappingContext::default();

    let saves = ctx.known("save", &raw.save).cloned().unwrap_or_default();
    let abilities = map_abilities(raw, &saves, &mut ctx);
    let initiative = Initiative::from_dexterity_modifier(abilities.dexterity.modifier());
    let (challenge_rating, experience) = map_challenge(raw.cr.as_ref(), &mut ctx);
    let proficiency_bonus = challenge_rating.as_deref().and_then(|cr| {
        ChallengeRating::parse(cr)
            .map(|rating| rating.proficiency_bonus())
            .map_err(|e| debug!(cr, error = %e, "Challenge rating has no proficiency bonus"))
            .ok()
    });

    let spellcasting: Vec<SpellcastingBlock> = raw
        .spellcasting
        .iter()
        .enumerate()
        .map(|(index, block)| normalize_spellcasting(block, index, &mut ctx.diagnostics))
        .collect();
    let in_slot = |slot: DisplaySlot| {
        spellcasting
            .iter()
            .filter(move |block| block.display_as == slot)
    };

    let mut traits: Vec<_> = raw.traits.iter().map(parse_trait).collect();
    traits.extend(in_slot(DisplaySlot::Trait).map(to_trait));

    let mut special: Vec<_> = raw
        .action
        .iter()
        .filter(|block| !is_multiattack(block) && !is_attack(block))
        .map(|block| parse_action(block, ActionKind::Special))
        .collect();
    special.extend(in_slot(DisplaySlot::Action).map(to_action_record));

    let actions = Actions {
        multi_attack: parse_multiattack(&raw.action),
        attacks: raw
            .action
            .iter()
            .filter(|block| !is_multiattack(block) && is_attack(block))
            .map(parse_attack)
            .collect(),
        special,
    };

    let mut bonus_actions: Vec<_> = raw
        .bonus
        .iter()
        .map(|block| parse_action(block, ActionKind::Bonus))
        .collect();
    bonus_actions.extend(in_slot(DisplaySlot::Bonus).map(to_action_record));

    let mut reactions: Vec<_> = raw
        .reaction
        .iter()
        .map(|block| parse_action(block, ActionKind::Reaction))
        .collect();
    reactions.extend(in_slot(DisplaySlot::Reaction).map(to_action_record));

    let creature_type = map_type(raw.creature_type.as_ref(), &mut ctx);
    let alignment = map_alignment(raw, &mut ctx);
    let ac = map_armor_class(raw.ac.as_ref(), &mut ctx);
    let hp = map_hit_points(raw.hp.as_ref(), &mut ctx);
    let speed = map_speed(raw.speed.as_ref(), &mut ctx);
    let skills = ctx
        .known("skill", &raw.skill)
        .map(map_skills)
        .unwrap_or_default();
    let senses = map_senses(raw, &mut ctx);
    let legendary = parse_legendary(raw);
    // The legendary parser falls back on bad counts; only report them here.
    ctx.known("legendaryActions", &raw.legendary_actions);
    ctx.known("legendaryActionsLair", &raw.legendary_actions_lair);
    let vulnerabilities = map_defenses(&raw.vulnerable, "vulnerable", &mut ctx);
    let resistances = map_defenses(&raw.resist, "resist", &mut ctx);
    let immunities = map_defenses(&raw.immune, "immune", &mut ctx);
    let condition_immunities = map_defenses(&raw.condition_immune, "conditionImmune", &mut ctx);
    let gear = map_gear(&raw.gear, &mut ctx);
    let other_sources = map_other_sources(raw, &mut ctx);

    Creature {
        id,
        name: raw.name.clone(),
        alias: owned(ctx.texts("alias", &raw.alias)),
        is_named_creature: ctx.flag("isNamedCreature", &raw.is_named_creature),
        group: owned(ctx.texts("group", &raw.group)),
        size: raw.size.as_ref().and_then(|size| size.first().cloned()),
        creature_type,
        alignment,
        source: ctx.text("source", &raw.source).unwrap_or_default(),
        page: ctx.known("page", &raw.page).copied(),
        other_sources,
        srd52: FiveToolsFlag::is_set(&raw.srd52),
        basic_rules2024: FiveToolsFlag::is_set(&raw.basic_rules2024),
        dragon_age: ctx.text("dragonAge", &raw.dragon_age),
        sound_clip: ctx
            .known("soundClip", &raw.sound_clip)
            .and_then(|clip| clip.path.clone().or_else(|| clip.url.clone())),

        ac,
        hp,
        speed,
        challenge_rating,
        experience,
        proficiency_bonus,
        initiative,

        abilities,
        skills,
        senses,
        languages: ctx
            .texts("languages", &raw.languages)
            .into_iter()
            .map(resolve_text)
            .collect(),

        gear,
        attached_items: ctx
            .texts("attachedItems", &raw.attached_items)
            .into_iter()
            .map(clean_item)
            .collect(),

        vulnerabilities,
        resistances,
        immunities,
        condition_immunities,

        traits,
        actions,
        bonus_actions,
        reactions,
        legendary,
        spellcasting,

        environment: owned(ctx.texts("environment", &raw.environment)),
        treasure: owned(ctx.texts("treasure", &raw.treasure)),
        legendary_group: ctx
            .known("legendaryGroup", &raw.legendary_group)
            .map(|group| LegendaryGroupRef {
                name: group.name.clone(),
                source: group.source.clone(),
            }),
        token_url: ctx.text("tokenUrl", &raw.token_url),
        has_token: ctx.flag("hasToken", &raw.has_token),
        has_fluff: ctx.flag("hasFluff", &raw.has_fluff),
        has_fluff_images: ctx.flag("hasFluffImages", &raw.has_fluff_images),

        diagnostics: ctx.diagnostics,
    }
}

fn owned(texts: Vec<&str>) -> Vec<String> {
    texts.into_iter().map(str::to_string).collect()
}

fn map_other_sources(raw: &FiveToolsMonster, ctx: &mut MappingContext) -> Vec<SourceRef> {
    let sources = match ctx.known("otherSources", &raw.other_sources) {
        Some(sources) => sources,
        None => return Vec::new(),
    };
    sources
        .iter()
        .enumerate()
        .filter_map(|(index, other)| match other {
            Lenient::Known(other) => Some(SourceRef {
                source: other.source.clone(),
                page: ctx
                    .known(&format!("otherSources[{}].page", index), &other.page)
                    .copied(),
            }),
            Lenient::Unknown(value) => {
                ctx.report(format!("otherSources[{}]", index), "Unrecognized source shape", value);
                None
            }
        })
        .collect()
}

// === Abilities and challenge ===

fn map_abilities(
    raw: &FiveToolsMonster,
    saves: &BTreeMap<String, serde_json::Value>,
    ctx: &mut MappingContext,
) -> AbilityScores {
    AbilityScores::from_fn(|key| {
        let score = match key {
            AbilityKey::Str => &raw.strength,
            AbilityKey::Dex => &raw.dexterity,
            AbilityKey::Con => &raw.constitution,
            AbilityKey::Int => &raw.intelligence,
            AbilityKey::Wis => &raw.wisdom,
            AbilityKey::Cha => &raw.charisma,
        };
        let value = match score {
            Some(FiveToolsScore::Value(value)) => *value,
            Some(FiveToolsScore::Unknown(other)) => {
                ctx.report(key.code(), "Ability score is not a number", other);
                DEFAULT_ABILITY_SCORE
            }
            None => {
                ctx.report(key.code(), "Ability score is missing", &serde_json::Value::Null);
                DEFAULT_ABILITY_SCORE
            }
        };
        AbilityScore::new(value, save_bonus(saves.get(key.code())))
    })
}

/// "+5", "-1" or a bare number.
fn save_bonus(value: Option<&serde_json::Value>) -> Option<i32> {
    match value? {
        serde_json::Value::String(text) => text.trim().parse().ok(),
        serde_json::Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}

fn map_challenge(
    cr: Option<&FiveToolsChallenge>,
    ctx: &mut MappingContext,
) -> (Option<String>, Option<u32>) {
    match cr {
        None => (None, None),
        Some(FiveToolsChallenge::Text(text)) => (Some(text.clone()), None),
        Some(FiveToolsChallenge::Number(number)) => (Some(number.to_string()), None),
        Some(FiveToolsChallenge::Detailed { cr, xp, .. }) => (Some(cr.clone()), *xp),
        Some(FiveToolsChallenge::Unknown(other)) => {
            ctx.report("cr", "Unrecognized challenge rating shape", other);
            (None, None)
        }
    }
}

fn map_skills(skills: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    skills
        .iter()
        .filter_map(|(skill, bonus)| match bonus {
            serde_json::Value::String(text) => Some((skill.clone(), text.clone())),
            serde_json::Value::Number(number) => Some((skill.clone(), number.to_string())),
            other => {
                debug!(skill = %skill, value = %other, "Skipping non-scalar skill entry");
                None
            }
        })
        .collect()
}

// === Type and alignment ===

fn size_name(code: &str) -> &str {
    match code {
        "T" => "Tiny",
        "S" => "Small",
        "M" => "Medium",
        "L" => "Large",
        "H" => "Huge",
        "G" => "Gargantuan",
        other => other,
    }
}

fn map_type(
    creature_type: Option<&FiveToolsCreatureType>,
    ctx: &mut MappingContext,
) -> Option<String> {
    let detail = match creature_type? {
        FiveToolsCreatureType::Simple(name) => return Some(name.clone()),
        FiveToolsCreatureType::Detailed(detail) => detail,
        FiveToolsCreatureType::Unknown(other) => {
            ctx.report("type", "Unrecognized creature type shape", other);
            return None;
        }
    };

    let base = match &detail.base {
        FiveToolsTypeBase::Name(name) => name.clone(),
        FiveToolsTypeBase::Choose { choose } => choose.join(" or "),
    };
    let tags: Vec<String> = detail
        .tags
        .iter()
        .enumerate()
        .filter_map(|(index, tag)| match tag {
            FiveToolsTypeTag::Name(name) => Some(name.clone()),
            FiveToolsTypeTag::Prefixed {
                tag,
                prefix: Some(prefix),
            } => Some(format!("{} {}", prefix, tag)),
            FiveToolsTypeTag::Prefixed { tag, prefix: None } => Some(tag.clone()),
            FiveToolsTypeTag::Unknown(other) => {
                ctx.report(format!("type.tags[{}]", index), "Unrecognized type tag", other);
                None
            }
        })
        .collect();

    let qualifier = match (&detail.swarm_size, tags.is_empty()) {
        (Some(size), true) => Some(format!("swarm of {}", size_name(size))),
        (Some(size), false) => Some(format!("swarm of {}, {}", size_name(size), tags.join(", "))),
        (None, false) => Some(tags.join(", ")),
        (None, true) => None,
    };
    Some(match qualifier {
        Some(qualifier) => format!("{} ({})", base, qualifier),
        None => base,
    })
}

fn map_alignment(raw: &FiveToolsMonster, ctx: &mut MappingContext) -> Vec<String> {
    let parts: Vec<String> = raw
        .alignment
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            FiveToolsAlignment::Code(code) => Some(code.clone()),
            FiveToolsAlignment::Group { alignment, .. } => Some(alignment.join(" ")),
            FiveToolsAlignment::Special { special } => Some(special.clone()),
            FiveToolsAlignment::Unknown(other) => {
                ctx.report(
                    format!("alignment[{}]", index),
                    "Unrecognized alignment shape",
                    other,
                );
                None
            }
        })
        .collect();

    match ctx.text("alignmentPrefix", &raw.alignment_prefix) {
        Some(prefix) if !parts.is_empty() => vec![format!("{}{}", prefix, parts.join(" "))],
        _ => parts,
    }
}

// === Defenses ===

fn map_armor_class(
    ac: Option<&OneOrMany<FiveToolsArmorClass>>,
    ctx: &mut MappingContext,
) -> Option<ArmorClass> {
    match ac?.first()? {
        FiveToolsArmorClass::Flat(value) => Some(ArmorClass::Flat(*value)),
        FiveToolsArmorClass::Detailed {
            ac,
            from,
            condition,
        } => Some(ArmorClass::Detailed {
            value: *ac,
            sources: from.iter().map(|source| resolve_text(source)).collect(),
            special: condition.as_deref().map(resolve_text),
        }),
        FiveToolsArmorClass::Special { special } => Some(ArmorClass::Detailed {
            value: None,
            sources: Vec::new(),
            special: Some(resolve_text(special)),
        }),
        FiveToolsArmorClass::Unknown(other) => {
            ctx.report("ac", "Unrecognized armor class shape", other);
            None
        }
    }
}

fn map_hit_points(hp: Option<&FiveToolsHitPoints>, ctx: &mut MappingContext) -> Option<HitPoints> {
    match hp? {
        FiveToolsHitPoints::Flat(average) => Some(HitPoints {
            average: Some(*average),
            ..HitPoints::default()
        }),
        FiveToolsHitPoints::Detailed {
            average,
            formula,
            special,
        } => Some(HitPoints {
            average: *average,
            formula: formula.clone(),
            special: special.as_deref().map(resolve_text),
        }),
        FiveToolsHitPoints::Unknown(other) => {
            ctx.report("hp", "Unrecognized hit points shape", other);
            None
        }
    }
}

fn map_defenses(
    entries: &[FiveToolsDefense],
    field: &str,
    ctx: &mut MappingContext,
) -> Vec<DefenseEntry> {
    let mut mapped = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let entry_field = format!("{}[{}]", field, index);
        push_defense(entry, &entry_field, &mut mapped, ctx);
    }
    mapped
}

/// Groups with a note become one conditional entry; groups without one are
/// flattened into their member types.
fn push_defense(
    entry: &FiveToolsDefense,
    field: &str,
    mapped: &mut Vec<DefenseEntry>,
    ctx: &mut MappingContext,
) {
    match entry {
        FiveToolsDefense::Type(name) => mapped.push(DefenseEntry::Type(resolve_text(name))),
        FiveToolsDefense::Group(group) => {
            if let Some(special) = &group.special {
                mapped.push(DefenseEntry::Type(resolve_text(special)));
            }
            let Some(types) = &group.types else {
                return;
            };
            let note = [group.pre_note.as_deref(), group.note.as_deref()]
                .into_iter()
                .flatten()
                .map(resolve_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if note.is_empty() {
                for nested in types {
                    push_defense(nested, field, mapped, ctx);
                }
                return;
            }

            let mut nested = Vec::new();
            for member in types {
                push_defense(member, field, &mut nested, ctx);
            }
            let types = nested
                .into_iter()
                .flat_map(|member| match member {
                    DefenseEntry::Type(name) => vec![name],
                    DefenseEntry::Conditional { types, .. } => types,
                })
                .collect();
            mapped.push(DefenseEntry::Conditional {
                types,
                condition: note,
            });
        }
        FiveToolsDefense::Unknown(other) => {
            ctx.report(field, "Unrecognized defense shape", other);
        }
    }
}

// === Movement and senses ===

fn map_speed(speed: Option<&FiveToolsSpeed>, ctx: &mut MappingContext) -> Speed {
    let mut mapped = Speed::default();
    let Some(speed) = speed else {
        return mapped;
    };

    for (mode, value) in &speed.modes {
        match value {
            FiveToolsSpeedValue::Feet(feet) => {
                mapped.modes.insert(mode.clone(), SpeedValue::Feet(*feet));
            }
            FiveToolsSpeedValue::Flag(flag) => {
                mapped.modes.insert(mode.clone(), SpeedValue::Flag(*flag));
            }
            FiveToolsSpeedValue::Conditional { number, condition } => {
                mapped.modes.insert(mode.clone(), SpeedValue::Feet(*number));
                if let Some(condition) = condition {
                    mapped
                        .speed_conditions
                        .insert(mode.clone(), resolve_text(condition));
                }
            }
            FiveToolsSpeedValue::Unknown(other) => {
                ctx.report(format!("speed.{}", mode), "Unrecognized speed shape", other);
            }
        }
    }

    for (mode, alternates) in &speed.alternate {
        let mapped_alternates: Vec<AlternateSpeed> = alternates
            .iter()
            .filter_map(|value| match value {
                FiveToolsSpeedValue::Feet(number) => Some(AlternateSpeed {
                    number: *number,
                    condition: None,
                }),
                FiveToolsSpeedValue::Conditional { number, condition } => Some(AlternateSpeed {
                    number: *number,
                    condition: condition.as_deref().map(resolve_text),
                }),
                _ => None,
            })
            .collect();
        mapped.alternate.insert(mode.clone(), mapped_alternates);
    }

    mapped
}

/// "darkvision 60 ft." becomes `darkvision: 60`; a sense without a range
/// is recorded as present.
fn map_senses(raw: &FiveToolsMonster, ctx: &mut MappingContext) -> Senses {
    let range_regex = SENSE_RANGE_REGEX.get_or_init(|| {
        regex_lite::Regex::new(r"(\w+)\s+(\d+)\s*ft")
            .expect("SENSE_RANGE_REGEX pattern is invalid")
    });

    let mut senses = Senses::default();
    for sense in ctx.texts("senses", &raw.senses) {
        let text = resolve_text(sense);
        if let Some(caps) = range_regex.captures(&text) {
            if let Ok(feet) = caps[2].parse() {
                senses
                    .ranges
                    .insert(caps[1].to_lowercase(), SenseValue::Range(feet));
                continue;
            }
        }
        if let Some(word) = text.split_whitespace().next() {
            senses
                .ranges
                .insert(word.to_lowercase(), SenseValue::Present(true));
        }
    }

    senses.passive_perception = match &raw.passive {
        Some(FiveToolsPassive::Value(value)) => Some(*value),
        Some(FiveToolsPassive::Text(text)) => text.trim().parse().ok(),
        Some(FiveToolsPassive::Unknown(other)) => {
            ctx.report("passive", "Unrecognized passive perception shape", other);
            None
        }
        None => None,
    };
    senses
}

// === Equipment ===

/// "longsword|xphb" or "{@item longsword|xphb}" becomes "longsword".
fn clean_item(reference: &str) -> String {
    let name = if reference.contains("{@") {
        reference
    } else {
        reference.split('|').next().unwrap_or(reference)
    };
    resolve_text(name)
}

fn map_gear(gear: &[FiveToolsGearRef], ctx: &mut MappingContext) -> Vec<String> {
    gear.iter()
        .enumerate()
        .map(|(index, reference)| match reference {
            FiveToolsGearRef::Name(text)
            | FiveToolsGearRef::Named { name: text }
            | FiveToolsGearRef::Item { item: text, .. }
            | FiveToolsGearRef::Entry { entry: text } => clean_item(text),
            FiveToolsGearRef::Unknown(other) => {
                ctx.report(format!("gear[{}]", index), "Unrecognized gear reference shape", other);
                UNKNOWN_ITEM.to_string()
            }
        })
        .collect()
}
