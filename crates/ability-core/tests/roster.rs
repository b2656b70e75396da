#![cfg(feature = "serde")]

use ability_core::{
    AbilityBehavior, AbilityKind, AbilityStats, AbilitySystem, BehaviorLibrary, Roster,
    RosterError, TagRegistry, WorldMut, WorldView,
};

#[derive(Default)]
struct RosterWorld;

impl WorldView for RosterWorld {
    type Agent = u64;
}

impl WorldMut for RosterWorld {}

#[derive(Clone)]
struct Stub(&'static str);

impl AbilityBehavior<RosterWorld> for Stub {
    fn kind(&self) -> AbilityKind {
        AbilityKind(self.0)
    }
}

const ROSTER: &str = r#"
clone_abilities: true
acquired: [walk, jump, swim]
stats:
  energy: 40
abilities:
  - name: walk
    kind: move
    flags:
      need_fixed_update: true
  - name: jump
    kind: jump
    input_buffer: 0.2
    energy_cost: 10
    blocked_by: [dash]
    finish_on_start: [walk]
  - name: dash
    kind: jump
    tag: dodge
    cooldown: 1.5
    allowed_by: [walk, glide]
"#;

fn library() -> BehaviorLibrary<RosterWorld> {
    BehaviorLibrary::new()
        .with("move", || Stub("move"))
        .with("jump", || Stub("jump"))
}

#[test]
fn compiles_definitions_and_acquired_tags() {
    let roster = Roster::from_yaml_str(ROSTER).unwrap();
    assert!(roster.clone_abilities);
    assert_eq!(roster.stats, AbilityStats::new(40.0));

    let mut tags = TagRegistry::new();
    let catalog = roster.compile(&library(), &mut tags).unwrap();

    let walk = tags.get("walk").unwrap();
    let jump = tags.get("jump").unwrap();
    let dodge = tags.get("dodge").unwrap();
    // Undeclared names are still interned so they can be matched later.
    assert_ne!(tags.get("dash"), Some(dodge));
    let glide = tags.get("glide").unwrap();

    assert!(catalog.clone_abilities());
    assert_eq!(catalog.acquired_tags().collect::<Vec<_>>(), vec![walk, jump]);

    let jump_def = catalog.reference_by_tag(jump).unwrap().borrow().definition().clone();
    assert_eq!(jump_def.input_buffer_duration, 0.2);
    assert_eq!(jump_def.energy_cost, 10.0);
    assert_eq!(jump_def.finish_on_start, vec![walk]);
    assert!(jump_def.flags.need_update);
    assert!(jump_def.flags.initialize_after_acquire);

    let dodge_def = catalog.reference_by_tag(dodge).unwrap().borrow().definition().clone();
    assert_eq!(dodge_def.name, "dash");
    assert_eq!(dodge_def.base_cooldown, 1.5);
    assert_eq!(dodge_def.allowed_by, vec![walk, glide]);

    let walk_ref = catalog.reference_by_tag(walk).unwrap();
    assert!(walk_ref.borrow().definition().flags.need_fixed_update);
    assert_eq!(walk_ref.borrow().kind(), AbilityKind("move"));
}

#[test]
fn undeclared_blocker_never_matches() {
    let roster = Roster::from_yaml_str(ROSTER).unwrap();
    let mut tags = TagRegistry::new();
    let catalog = roster.compile(&library(), &mut tags).unwrap();
    let mut world = RosterWorld;
    let mut sys = AbilitySystem::new(1, roster.stats);

    let handles = catalog.possess_acquired(&mut sys, &mut world).unwrap();
    let jump = handles[1];
    let dodge = tags.get("dodge").unwrap();

    sys.add_running_tag(dodge);
    assert!(sys.can_use(jump, &world));
}

#[test]
fn unknown_kind_is_an_error() {
    let roster = Roster::from_yaml_str(
        r#"
abilities:
  - name: fly
    kind: wings
"#,
    )
    .unwrap();

    let err = roster.compile(&library(), &mut TagRegistry::new()).unwrap_err();
    assert!(matches!(err, RosterError::UnknownKind { ref kind, .. } if kind == "wings"));
}

#[test]
fn duplicate_tags_are_rejected() {
    let roster = Roster::from_yaml_str(
        r#"
abilities:
  - name: jump
    kind: jump
  - name: hop
    kind: jump
    tag: jump
"#,
    )
    .unwrap();

    let err = roster.compile(&library(), &mut TagRegistry::new()).unwrap_err();
    assert!(matches!(err, RosterError::DuplicateTag(ref tag) if tag == "jump"));
}

#[test]
fn missing_file_reports_io_error() {
    let err = Roster::load("definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, RosterError::Io(_)));
}

#[test]
fn malformed_yaml_reports_parse_error() {
    let err = Roster::from_yaml_str("abilities: {").unwrap_err();
    assert!(matches!(err, RosterError::Yaml(_)));
}
