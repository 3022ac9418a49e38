use bestiary_domain::{
    ArmorClass, Creature, DamageKind, DefenseEntry, EffectTrigger, SenseValue, SpeedValue,
};
use serde_json::json;

use super::fivetools::{map_creature, FiveToolsImporter, ImportError};
use super::fivetools_types::FiveToolsMonster;

fn monster(value: serde_json::Value) -> FiveToolsMonster {
    serde_json::from_value(value).expect("monster record")
}

fn goblin_boss() -> serde_json::Value {
    json!({
        "name": "Goblin Boss",
        "source": "XMM",
        "page": 144,
        "otherSources": [{"source": "MM", "page": 166}],
        "srd52": true,
        "size": ["S"],
        "type": {"type": "fey", "tags": ["goblinoid"]},
        "alignment": ["C", "N"],
        "ac": [{"ac": 17, "from": ["{@item chain shirt|xphb}", "{@item shield|xphb}"]}],
        "hp": {"average": 21, "formula": "6d6"},
        "speed": {"walk": 30, "climb": 30},
        "str": 10, "dex": 14, "con": 10, "int": 10, "wis": 8, "cha": 10,
        "save": {"dex": "+4"},
        "skill": {"stealth": "+6"},
        "senses": ["{@sense darkvision|XPHB} 60 ft."],
        "passive": 9,
        "languages": ["Common", "Goblin"],
        "cr": "1",
        "gear": ["chain shirt|xphb", "scimitar|xphb", {"item": "shield|xphb", "quantity": 1}],
        "resist": ["poison"],
        "trait": [
            {"name": "Nimble Escape", "entries": ["The goblin takes the {@action Disengage|XPHB} or {@action Hide|XPHB} action."]}
        ],
        "action": [
            {"name": "Multiattack", "entries": ["The goblin makes two {@action Scimitar} attacks."]},
            {"name": "Scimitar", "entries": ["Melee Weapon Attack: {@hit +5}, reach 5 ft., one target. Hit: {@damage 1d8 +3} Slashing damage."]}
        ],
        "reaction": [
            {"name": "Redirect Attack", "entries": ["{@actTrigger} A creature the goblin can see makes an attack roll against it. {@actResponse} The goblin chooses an ally within 5 feet of it to become the target instead."]}
        ],
        "environment": ["forest", "underdark"],
        "hasToken": true
    })
}

#[test]
fn full_record_maps_every_section() {
    let creature = map_creature(&monster(goblin_boss()), Some(7));

    assert_eq!(creature.id, Some(7));
    assert_eq!(creature.name, "Goblin Boss");
    assert_eq!(creature.size.as_deref(), Some("S"));
    assert_eq!(creature.creature_type.as_deref(), Some("fey (goblinoid)"));
    assert_eq!(creature.alignment, vec!["C", "N"]);
    assert_eq!(creature.other_sources.len(), 1);
    assert!(creature.srd52);
    assert!(!creature.basic_rules2024);
    assert_eq!(
        creature.ac,
        Some(ArmorClass::Detailed {
            value: Some(17),
            sources: vec!["chain shirt".to_string(), "shield".to_string()],
            special: None,
        })
    );
    assert_eq!(creature.hp.as_ref().and_then(|hp| hp.average), Some(21));
    assert_eq!(creature.speed.modes.get("climb"), Some(&SpeedValue::Feet(30)));

    assert_eq!(creature.challenge_rating.as_deref(), Some("1"));
    assert_eq!(creature.proficiency_bonus, Some(2));
    assert_eq!(creature.abilities.dexterity.modifier(), 2);
    assert_eq!(creature.initiative.total(), 12);
    assert_eq!(creature.abilities.dexterity.save(), 4);
    assert_eq!(creature.skills.get("stealth").map(String::as_str), Some("+6"));
    assert_eq!(
        creature.senses.ranges.get("darkvision"),
        Some(&SenseValue::Range(60))
    );
    assert_eq!(creature.senses.passive_perception, Some(9));
    assert_eq!(creature.gear, vec!["chain shirt", "scimitar", "shield"]);
    assert_eq!(creature.resistances, vec![DefenseEntry::Type("poison".to_string())]);

    assert_eq!(creature.traits.len(), 1);
    assert_eq!(
        creature.traits[0].body.display_text(),
        "The goblin takes the Disengage or Hide action."
    );
    let multi = creature.actions.multi_attack.as_ref().expect("multiattack");
    assert_eq!(multi.attacks, vec!["scimitar".to_string()]);
    assert_eq!(creature.actions.attacks.len(), 1);
    assert!(creature.actions.special.is_empty());
    assert_eq!(creature.reactions.len(), 1);
    assert!(creature.legendary.is_none());
    assert_eq!(creature.environment, vec!["forest", "underdark"]);
    assert!(creature.has_token);
    assert!(creature.diagnostics.is_empty());
}

#[test]
fn attack_record_from_markup() {
    let creature = map_creature(&monster(goblin_boss()), None);
    let attack = &creature.actions.attacks[0];

    assert_eq!(attack.name, "Scimitar");
    assert_eq!(
        attack.components.attack_type.as_deref(),
        Some("Melee Weapon Attack:")
    );
    assert_eq!(attack.attack_modifier, Some(5));
    let range = attack.range.expect("range");
    assert_eq!(range.normal, 5);
    assert_eq!(range.long, None);
    assert_eq!(attack.damage.len(), 1);
    assert_eq!(attack.damage[0].formula(), "1d8 + 3");
    assert_eq!(attack.damage[0].damage_type(), "slashing");
    assert_eq!(attack.damage[0].average(), 7);
    assert!(!attack.text.contains("{@"));
}

#[test]
fn conditional_damage_at_creature_level() {
    let creature = map_creature(
        &monster(json!({
            "name": "Wolf",
            "action": [{
                "name": "Bite",
                "entries": ["{@atk mw} {@hit 6} to hit, reach 5 ft. {@h}9 ({@damage 2d6 + 2}) slashing damage, or 12 ({@damage 3d6 + 2}) slashing damage if the target is {@condition prone}."]
            }]
        })),
        None,
    );
    let attack = &creature.actions.attacks[0];
    assert_eq!(attack.damage_kind, DamageKind::Conditional);
    assert_eq!(attack.damage.len(), 2);
    assert!(attack.damage.iter().all(|d| d.is_conditional()));
    assert_eq!(
        attack.damage[1].conditional().map(|c| c.condition.as_str()),
        Some("the target is prone")
    );
}

#[test]
fn ongoing_damage_stays_out_of_one_time_damage() {
    let creature = map_creature(
        &monster(json!({
            "name": "Fire Snake",
            "action": [{
                "name": "Bite",
                "entries": ["{@atk mw} {@hit 5} to hit, reach 5 ft., one target. {@h}5 ({@damage 1d6 + 2}) piercing damage, and it takes 7 ({@damage 2d6}) fire damage at the start of each of its turns."]
            }]
        })),
        None,
    );
    let attack = &creature.actions.attacks[0];
    assert_eq!(attack.damage.len(), 1);
    assert_eq!(attack.damage[0].damage_type(), "piercing");
    assert_eq!(attack.ongoing_effects.len(), 1);
    assert_eq!(attack.ongoing_effects[0].trigger, EffectTrigger::StartOfTurn);
    assert_eq!(attack.ongoing_effects[0].damage.damage_type(), "fire");
}

#[test]
fn spellcasting_lands_in_its_slot() {
    let creature = map_creature(
        &monster(json!({
            "name": "Dryad",
            "spellcasting": [
                {
                    "name": "Innate Spellcasting",
                    "headerEntries": ["The dryad's innate spellcasting ability is Charisma."],
                    "daily": {"3e": ["{@spell entangle}", "{@spell goodberry}"]},
                    "ability": "cha"
                },
                {
                    "name": "Spellcasting",
                    "displayAs": "action",
                    "spells": {"1": {"slots": 1, "spells": ["{@spell shield}"]}}
                }
            ]
        })),
        None,
    );

    assert_eq!(creature.spellcasting.len(), 2);
    assert_eq!(
        creature.spellcasting[0].summary,
        vec!["3/day each: entangle, goodberry".to_string()]
    );
    assert_eq!(
        creature.spellcasting[1].summary,
        vec!["1st level (1 slot): shield".to_string()]
    );
    assert_eq!(creature.traits.len(), 1);
    assert!(creature.traits[0].spellcasting);
    assert_eq!(creature.actions.special.len(), 1);
    assert!(creature.actions.special[0].spellcasting);
}

#[test]
fn proficiency_bonus_follows_challenge_rating() {
    let cases = [
        (json!("0"), Some(2)),
        (json!("1/4"), Some(2)),
        (json!("4"), Some(2)),
        (json!("5"), Some(3)),
        (json!({"cr": "20", "xp": 25000}), Some(7)),
        (json!("30"), Some(9)),
        (json!("Unknown"), None),
    ];
    for (cr, expected) in cases {
        let creature = map_creature(&monster(json!({"name": "Probe", "cr": cr})), None);
        assert_eq!(creature.proficiency_bonus, expected, "cr {:?}", creature.challenge_rating);
    }

    let creature = map_creature(&monster(json!({"name": "Probe"})), None);
    assert_eq!(creature.challenge_rating, None);
    assert_eq!(creature.proficiency_bonus, None);
}

#[test]
fn experience_comes_from_detailed_rating() {
    let creature = map_creature(
        &monster(json!({"name": "Lich", "cr": {"cr": "21", "lair": "22", "xp": 33000}})),
        None,
    );
    assert_eq!(creature.challenge_rating.as_deref(), Some("21"));
    assert_eq!(creature.experience, Some(33000));
}

#[test]
fn unknown_shapes_become_diagnostics() {
    let creature = map_creature(
        &monster(json!({
            "name": "Oddity",
            "str": "ten",
            "gear": [{"mystery": true}],
            "spellcasting": [{"name": "Spellcasting", "will": [12]}]
        })),
        None,
    );

    assert_eq!(creature.gear, vec!["Unknown Item"]);
    assert_eq!(creature.spellcasting[0].spells.will, vec!["Unknown Spell"]);
    assert_eq!(creature.abilities.strength.value(), 10);

    let fields: Vec<&str> = creature
        .diagnostics
        .iter()
        .map(|d| d.field.as_str())
        .collect();
    assert!(fields.contains(&"gear[0]"));
    assert!(fields.contains(&"spellcasting[0].will"));
    assert!(fields.contains(&"str"));
}

#[test]
fn malformed_optional_fields_keep_the_rest_of_the_record() {
    let mut record = goblin_boss();
    record["page"] = json!("12");
    record["senses"] = serde_json::Value::Null;
    record["languages"] = json!(["Common", {"special": "telepathy 60 ft."}]);

    let creature = map_creature(&monster(record), Some(2));

    assert_eq!(creature.name, "Goblin Boss");
    assert_eq!(creature.page, None);
    assert_eq!(creature.source, "XMM");
    assert!(creature.senses.ranges.is_empty());
    assert_eq!(creature.senses.passive_perception, Some(9));
    assert_eq!(creature.languages, vec!["Common"]);

    assert!(creature.actions.multi_attack.is_some());
    assert_eq!(creature.actions.attacks.len(), 1);
    assert_eq!(creature.actions.attacks[0].name, "Scimitar");
    assert_eq!(creature.actions.attacks[0].damage[0].formula(), "1d8 + 3");
    assert_eq!(creature.reactions.len(), 1);
    assert_eq!(creature.proficiency_bonus, Some(2));

    let fields: Vec<&str> = creature
        .diagnostics
        .iter()
        .map(|d| d.field.as_str())
        .collect();
    assert_eq!(fields, vec!["page", "languages[1]"]);
    assert_eq!(creature.diagnostics[1].raw, r#"{"special":"telepathy 60 ft."}"#);
}

#[test]
fn mapping_is_deterministic() {
    let raw = monster(goblin_boss());
    let first = serde_json::to_string(&map_creature(&raw, Some(1))).expect("serialize");
    let second = serde_json::to_string(&map_creature(&raw, Some(1))).expect("serialize");
    assert_eq!(first, second);

    let parsed: Creature = serde_json::from_str(&first).expect("deserialize");
    assert_eq!(parsed.name, "Goblin Boss");
}

#[test]
fn no_markup_survives_in_display_text() {
    let creature = map_creature(&monster(goblin_boss()), None);
    let serialized = serde_json::to_string(&creature).expect("serialize");
    assert!(!serialized.contains("{@"), "{}", serialized);
}

// === Importer ===

#[tokio::test]
async fn imports_wrapped_file() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("bestiary-xmm.json");
    let content = json!({"monster": [goblin_boss(), {"name": "Wolf", "source": "XMM"}]});
    std::fs::write(&path, content.to_string()).expect("write");

    let records = FiveToolsImporter::new(&path)
        .import_monsters()
        .await
        .expect("import");
    assert_eq!(records.len(), 2);
    let names: Vec<String> = records
        .into_iter()
        .map(|record| record.expect("valid record").name)
        .collect();
    assert_eq!(names, vec!["Goblin Boss", "Wolf"]);
}

#[tokio::test]
async fn imports_bare_array_with_invalid_record() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("monsters.json");
    let content = json!([
        {"name": "Wolf"},
        {"source": "MM"},
        {"name": "Bad", "action": "not a list"},
        {"name": "Scout", "page": "x"}
    ]);
    std::fs::write(&path, content.to_string()).expect("write");

    let records = FiveToolsImporter::new(&path)
        .import_monsters()
        .await
        .expect("import");
    assert_eq!(records.len(), 4);
    assert!(records[0].is_ok());
    assert!(matches!(
        &records[1],
        Err(ImportError::InvalidRecord { index: 1, name: None, .. })
    ));
    match &records[2] {
        Err(ImportError::InvalidRecord { index, name, .. }) => {
            assert_eq!(*index, 2);
            assert_eq!(name.as_deref(), Some("Bad"));
        }
        other => panic!("unexpected result {:?}", other.as_ref().map(|m| &m.name)),
    }
    assert!(records[3].is_ok());
}

#[tokio::test]
async fn missing_file_is_reported() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("absent.json");

    let result = FiveToolsImporter::new(&path).import_monsters().await;
    assert!(matches!(result, Err(ImportError::DataFileNotFound(p)) if p == path));
}

#[tokio::test]
async fn non_array_file_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("object.json");
    std::fs::write(&path, r#"{"spell": []}"#).expect("write");

    let result = FiveToolsImporter::new(&path).import_monsters().await;
    assert!(matches!(result, Err(ImportError::NotAnArray(_))));

    std::fs::write(&path, "not json").expect("write");
    let result = FiveToolsImporter::new(&path).import_monsters().await;
    assert!(matches!(result, Err(ImportError::Json(_))));
}
