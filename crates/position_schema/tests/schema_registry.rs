//! Integration tests for schema registration, template validation and
//! typed resolution.

use position_schema::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct DuelPositions {
    red: Position,
    blue: Position,
}

impl PositionData for DuelPositions {
    fn describe() -> SchemaDescription {
        SchemaDescription::new("duel")
            .exact("red", "spawn.red")
            .exact("blue", "spawn.blue")
    }

    fn from_positions(resolved: &ResolvedPositions) -> Result<Self, ConstructionError> {
        Ok(Self {
            red: resolved.single("red")?,
            blue: resolved.single("blue")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BasePositions {
    spawn: Position,
    flag: Position,
}

#[derive(Debug, Clone, PartialEq)]
struct CtfPositions {
    red: BasePositions,
    blue: BasePositions,
    powerups: Vec<Position>,
}

fn base_schema(team: &str) -> SchemaDescription {
    SchemaDescription::new(format!("base.{team}"))
        .exact("spawn", format!("{team}.spawn"))
        .exact("flag", format!("{team}.flag"))
}

fn base_from(resolved: &ResolvedPositions) -> Result<BasePositions, ConstructionError> {
    Ok(BasePositions {
        spawn: resolved.single("spawn")?,
        flag: resolved.single("flag")?,
    })
}

impl PositionData for CtfPositions {
    fn describe() -> SchemaDescription {
        SchemaDescription::new("ctf")
            .nested("red", base_schema("red"))
            .nested("blue", base_schema("blue"))
            .slot(SlotDescription::new("powerups").suffix(".powerup").plural())
    }

    fn from_positions(resolved: &ResolvedPositions) -> Result<Self, ConstructionError> {
        let powerups = resolved.many("powerups")?.to_vec();
        if powerups.len() < 2 {
            return Err(ConstructionError::Rejected(
                "ctf arenas need at least two powerups".to_string(),
            ));
        }
        Ok(Self {
            red: base_from(resolved.nested("red")?)?,
            blue: base_from(resolved.nested("blue")?)?,
            powerups,
        })
    }
}

const P1: Position = Position { x: 1.0, y: 64.0, z: 1.0 };
const P2: Position = Position { x: 2.0, y: 64.0, z: 2.0 };
const P3: Position = Position { x: 3.0, y: 64.0, z: 3.0 };

fn duel_markers() -> MarkerSet {
    [("spawn.red", P1), ("spawn.blue", P2), ("center", P3)]
        .into_iter()
        .collect()
}

fn ctf_markers() -> MarkerSet {
    [
        ("red.spawn", Position::new(-50.0, 64.0, 0.0)),
        ("red.flag", Position::new(-60.0, 64.0, 0.0)),
        ("mid.powerup", Position::new(0.0, 64.0, 0.0)),
        ("blue.spawn", Position::new(50.0, 64.0, 0.0)),
        ("blue.flag", Position::new(60.0, 64.0, 0.0)),
        ("north.powerup", Position::new(0.0, 64.0, 40.0)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_duel_scenario() {
    let registry = SchemaRegistry::new();
    registry.register_type::<DuelPositions>("duel").unwrap();

    let markers = duel_markers();
    assert!(registry.validate("duel", &markers).is_ok());
    assert_eq!(
        resolve_as::<DuelPositions>(&markers).unwrap(),
        DuelPositions { red: P1, blue: P2 }
    );

    let mut missing = markers.clone();
    missing.remove("spawn.blue");
    let err = registry.validate("duel", &missing).unwrap_err();
    let blue = registry.compiled("duel").unwrap().rule("blue").cloned().unwrap();
    assert_eq!(blue.rule, MatchRule::Exact("spawn.blue".to_string()));
    assert!(!blue.plural);
    assert_eq!(err, ValidationError::NoMatch(blue));
}

#[test]
fn test_removing_any_sole_match_fails_on_that_rule() {
    let registry = SchemaRegistry::new();
    let compiled = registry.register_type::<CtfPositions>("ctf").unwrap();
    let markers = ctf_markers();
    assert!(registry.validate("ctf", &markers).is_ok());

    for rule in compiled.rules.iter().filter(|rule| !rule.plural) {
        let mut reduced = markers.clone();
        let sole: Vec<String> = markers
            .names()
            .filter(|name| rule.matches(name))
            .map(str::to_string)
            .collect();
        assert_eq!(sole.len(), 1, "rule {rule} should have exactly one match");
        reduced.remove(&sole[0]);

        assert_eq!(
            registry.validate("ctf", &reduced),
            Err(ValidationError::NoMatch(rule.clone()))
        );
    }
}

#[test]
fn test_validate_all_reports_every_missing_rule() {
    let registry = SchemaRegistry::new();
    registry.register_type::<CtfPositions>("ctf").unwrap();

    let markers: MarkerSet = [("red.spawn", P1)].into_iter().collect();
    let failures = registry.validate_all("ctf", &markers).unwrap_err();
    let slots: Vec<String> = failures
        .iter()
        .map(|failure| match failure {
            ValidationError::NoMatch(rule) => rule.slot.clone(),
            other => panic!("unexpected failure {other}"),
        })
        .collect();

    assert_eq!(slots, vec!["red.flag", "blue.spawn", "blue.flag", "powerups"]);
}

#[test]
fn test_nested_schemas_registered_under_own_identity() {
    let registry = SchemaRegistry::new();
    registry.register_type::<CtfPositions>("ctf").unwrap();

    assert!(registry.is_registered("ctf"));
    assert!(registry.schema("ctf").is_some());
    assert_eq!(registry.schema("base.red").unwrap().rules.len(), 2);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_typed_nested_resolution() {
    let positions = resolve_as::<CtfPositions>(&ctf_markers()).unwrap();

    assert_eq!(positions.red.flag, Position::new(-60.0, 64.0, 0.0));
    assert_eq!(positions.blue.spawn, Position::new(50.0, 64.0, 0.0));
    assert_eq!(
        positions.powerups,
        vec![Position::new(0.0, 64.0, 0.0), Position::new(0.0, 64.0, 40.0)]
    );
}

#[test]
fn test_construction_rejection_is_reported() {
    let mut markers = ctf_markers();
    markers.remove("north.powerup");

    let err = resolve_as::<CtfPositions>(&markers).unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::ConstructionFailed { ref schema, source: ConstructionError::Rejected(_) }
            if schema == "ctf"
    ));
}

#[test]
fn test_resolution_is_deterministic() {
    let registry = SchemaRegistry::new();
    registry.register_type::<CtfPositions>("ctf").unwrap();
    let markers = ctf_markers();

    let first = registry.resolve("ctf", &markers).unwrap();
    let second = registry.resolve("ctf", &markers).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_annotation_rejected_at_registration() {
    let registry = SchemaRegistry::new();
    let description = SchemaDescription::new("broken")
        .exact("red", "spawn.red")
        .slot(SlotDescription::new("blue"));

    let err = registry.register("broken", &description).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingAnnotation {
            schema: "broken".to_string(),
            slot: "blue".to_string(),
        }
    );
    assert!(!registry.is_registered("broken"));
}

#[test]
fn test_multiple_annotations_rejected_at_registration() {
    let registry = SchemaRegistry::new();
    let description = SchemaDescription::new("broken")
        .slot(SlotDescription::new("spawn").prefix("spawn.").suffix(".spawn"));

    assert!(matches!(
        registry.register("broken", &description),
        Err(SchemaError::ConflictingAnnotations { .. })
    ));
}

#[test]
fn test_invalid_pattern_rejected_at_registration() {
    let registry = SchemaRegistry::new();
    let description = SchemaDescription::new("koth")
        .exact("hill", "hill")
        .slot(SlotDescription::new("spawns").prefix("spawn[").plural());

    let err = registry.register("koth", &description).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidConstructor { ref reason, .. } if reason.contains("spawns")
    ));
    assert!(!registry.is_registered("koth"));
    assert!(registry.schema("koth").is_none());
}

#[test]
fn test_validation_matches_regular_expressions() {
    let registry = SchemaRegistry::new();
    let description = SchemaDescription::new("koth")
        .slot(SlotDescription::new("hills").prefix(r"hill\d").plural())
        .exact("center", r"center|middle");
    registry.register("koth", &description).unwrap();

    let markers: MarkerSet = [("hill1", P1), ("middle", P2)].into_iter().collect();
    assert!(registry.validate("koth", &markers).is_ok());

    let lettered: MarkerSet = [("hillx", P1), ("center", P2)].into_iter().collect();
    let err = registry.validate("koth", &lettered).unwrap_err();
    assert!(matches!(err, ValidationError::NoMatch(ref rule) if rule.slot == "hills"));
}

#[test]
fn test_shared_nested_identity_keeps_latest_registration() {
    let registry = SchemaRegistry::new();
    let lobby = |marker: &str| {
        SchemaDescription::new("arena")
            .exact("center", "center")
            .nested("lobby", SchemaDescription::new("lobby").exact("spawn", marker))
    };
    registry.register("koth", &lobby("lobby.spawn")).unwrap();
    registry.register("tdm", &lobby("waiting.spawn")).unwrap();

    let shared = registry.schema("lobby").unwrap();
    assert_eq!(
        shared.rule("spawn").unwrap().rule,
        MatchRule::Exact("waiting.spawn".to_string())
    );
    assert_eq!(
        registry.compiled("koth").unwrap().rule("lobby.spawn").unwrap().rule,
        MatchRule::Exact("lobby.spawn".to_string())
    );
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_empty_description_rejected() {
    let registry = SchemaRegistry::new();
    assert!(matches!(
        registry.register("empty", &SchemaDescription::new("empty")),
        Err(SchemaError::InvalidConstructor { .. })
    ));
}

#[test]
fn test_unknown_game_type() {
    let registry = SchemaRegistry::new();
    assert_eq!(
        registry.validate("nope", &duel_markers()),
        Err(ValidationError::UnknownGameType("nope".to_string()))
    );
    assert_eq!(
        registry.resolve("nope", &duel_markers()),
        Err(ResolutionError::UnknownGameType("nope".to_string()))
    );
}

#[test]
fn test_description_from_toml() {
    let source = r#"
        name = "koth"

        [[slots]]
        name = "hill"
        exact = "hill"

        [[slots]]
        name = "spawns"
        prefix = "spawn."
        plural = true

        [[slots]]
        name = "lobby"
        [slots.nested]
        name = "lobby"
        [[slots.nested.slots]]
        name = "spawn"
        suffix = ".lobby"
    "#;

    let description: SchemaDescription = toml::from_str(source).unwrap();
    let registry = SchemaRegistry::new();
    let compiled = registry.register("koth", &description).unwrap();

    let slots: Vec<_> = compiled.rules.iter().map(|rule| rule.slot.as_str()).collect();
    assert_eq!(slots, vec!["hill", "spawns", "lobby.spawn"]);
    assert!(compiled.rule("spawns").unwrap().plural);
}

#[test]
fn test_concurrent_validation() {
    let registry = Arc::new(SchemaRegistry::new());
    registry.register_type::<DuelPositions>("duel").unwrap();

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let mut markers = duel_markers();
                if i % 2 == 0 {
                    markers.remove("spawn.red");
                }
                registry.validate("duel", &markers).is_ok()
            })
        })
        .collect();

    let results: Vec<bool> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|ok| **ok).count(), 4);
}
