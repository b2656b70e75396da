use std::rc::Rc;

use ability_core::{
    Ability, AbilityBehavior, AbilityDefinition, AbilityError, AbilityKind, AbilityStats,
    AbilitySystem, AbilityTag, TickContext, WorldMut, WorldView,
};

const JUMP: AbilityTag = AbilityTag(0);
const DASH: AbilityTag = AbilityTag(1);
const WALK: AbilityTag = AbilityTag(2);
const GHOST: AbilityTag = AbilityTag(99);

#[derive(Default)]
struct LogWorld {
    log: Vec<String>,
}

impl WorldView for LogWorld {
    type Agent = u64;
}

impl WorldMut for LogWorld {}

#[derive(Clone)]
struct Logged(&'static str);

impl AbilityBehavior<LogWorld> for Logged {
    fn kind(&self) -> AbilityKind {
        AbilityKind(self.0)
    }

    fn on_initialized(&mut self, _agent: u64, world: &mut LogWorld) {
        world.log.push(format!("init:{}", self.0));
    }

    fn on_started(&mut self, _agent: u64, world: &mut LogWorld) {
        world.log.push(format!("start:{}", self.0));
    }

    fn on_finished(&mut self, _agent: u64, world: &mut LogWorld) {
        world.log.push(format!("finish:{}", self.0));
    }
}

fn system() -> AbilitySystem<LogWorld> {
    AbilitySystem::new(7, AbilityStats::new(100.0))
}

fn ability(def: AbilityDefinition, name: &'static str) -> ability_core::AbilityRef<LogWorld> {
    Ability::shared(def, Logged(name))
}

#[test]
fn run_and_finish_keep_tags_in_lockstep() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let jump = sys.acquire(ability(AbilityDefinition::new("jump", JUMP), "jump"), &mut world).unwrap();

    sys.run(jump, &mut world).unwrap();
    assert!(sys.is_running(jump));
    assert!(sys.is_tag_running(JUMP));

    assert!(sys.finish(jump, &mut world));
    assert!(!sys.is_running(jump));
    assert!(!sys.is_tag_running(JUMP));

    assert!(!sys.finish(jump, &mut world));
    assert_eq!(world.log, vec!["init:jump", "start:jump", "finish:jump"]);
}

#[test]
fn finish_on_start_runs_before_start_hook() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let walk = sys.acquire(ability(AbilityDefinition::new("walk", WALK), "walk"), &mut world).unwrap();
    let dash = sys
        .acquire(
            ability(AbilityDefinition::new("dash", DASH).finish_on_start([WALK, GHOST]), "dash"),
            &mut world,
        )
        .unwrap();
    world.log.clear();

    sys.run(walk, &mut world).unwrap();
    sys.run(dash, &mut world).unwrap();

    assert!(!sys.is_running(walk));
    assert!(sys.is_running(dash));
    assert_eq!(world.log, vec!["start:walk", "finish:walk", "start:dash"]);
    assert_eq!(sys.running_tags().collect::<Vec<_>>(), vec![DASH]);
}

#[test]
fn finish_on_end_cascades_and_skips_unowned_tags() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let dash = sys
        .acquire(
            ability(AbilityDefinition::new("dash", DASH).finish_on_end([GHOST, WALK]), "dash"),
            &mut world,
        )
        .unwrap();
    let walk = sys.acquire(ability(AbilityDefinition::new("walk", WALK), "walk"), &mut world).unwrap();
    sys.run(dash, &mut world).unwrap();
    sys.run(walk, &mut world).unwrap();
    world.log.clear();

    assert!(sys.finish(dash, &mut world));

    assert!(!sys.is_running(walk));
    assert_eq!(world.log, vec!["finish:dash", "finish:walk"]);
    assert_eq!(sys.running_tags().count(), 0);
}

#[test]
fn mutually_finishing_abilities_terminate() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let jump = sys
        .acquire(ability(AbilityDefinition::new("jump", JUMP).finish_on_end([DASH]), "jump"), &mut world)
        .unwrap();
    let dash = sys
        .acquire(ability(AbilityDefinition::new("dash", DASH).finish_on_end([JUMP]), "dash"), &mut world)
        .unwrap();
    sys.run(jump, &mut world).unwrap();
    sys.run(dash, &mut world).unwrap();
    world.log.clear();

    sys.finish(jump, &mut world);

    assert!(!sys.is_running(jump));
    assert!(!sys.is_running(dash));
    assert_eq!(world.log, vec!["finish:jump", "finish:dash"]);
}

#[test]
fn reset_clears_cooldown_even_when_idle() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let dash = sys
        .acquire(ability(AbilityDefinition::new("dash", DASH).with_cooldown(2.0), "dash"), &mut world)
        .unwrap();

    sys.run(dash, &mut world).unwrap();
    assert!(sys.reset(dash, &mut world));
    assert_eq!(sys.cooldown_time_left(dash), 0.0);

    sys.run(dash, &mut world).unwrap();
    sys.finish(dash, &mut world);
    assert!(sys.cooldown_time_left(dash) > 0.0);
    assert!(!sys.reset(dash, &mut world));
    assert_eq!(sys.cooldown_time_left(dash), 0.0);
}

#[test]
fn teardown_resets_every_ability() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let jump = sys
        .acquire(ability(AbilityDefinition::new("jump", JUMP).with_cooldown(1.0), "jump"), &mut world)
        .unwrap();
    let walk = sys.acquire(ability(AbilityDefinition::new("walk", WALK), "walk"), &mut world).unwrap();
    sys.run(jump, &mut world).unwrap();
    sys.run(walk, &mut world).unwrap();

    sys.teardown(&mut world);

    assert!(!sys.is_running(jump));
    assert!(!sys.is_running(walk));
    assert_eq!(sys.cooldown_time_left(jump), 0.0);
    assert_eq!(sys.running_tags().count(), 0);
}

#[test]
fn duplicate_tag_is_rejected() {
    let mut world = LogWorld::default();
    let mut sys = system();
    sys.acquire(ability(AbilityDefinition::new("jump", JUMP), "jump"), &mut world).unwrap();

    let err = sys
        .acquire(ability(AbilityDefinition::new("hop", JUMP), "hop"), &mut world)
        .unwrap_err();

    assert_eq!(
        err,
        AbilityError::DuplicateTag {
            tag: JUMP,
            existing: "jump".to_string()
        }
    );
    assert_eq!(sys.len(), 1);
    assert!(!world.log.contains(&"init:hop".to_string()));
}

#[test]
fn acquiring_the_same_reference_twice_is_idempotent() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let jump = ability(AbilityDefinition::new("jump", JUMP), "jump");

    let first = sys.acquire(Rc::clone(&jump), &mut world).unwrap();
    let second = sys.acquire(Rc::clone(&jump), &mut world).unwrap();

    assert_eq!(first, second);
    assert_eq!(sys.len(), 1);
    assert!(sys.has_ability(&jump));
    assert_eq!(world.log, vec!["init:jump"]);
}

#[test]
fn lookup_by_kind_returns_first_registered() {
    let mut world = LogWorld::default();
    let mut sys = system();
    let first = sys.acquire(ability(AbilityDefinition::new("jump", JUMP), "hop"), &mut world).unwrap();
    let second = sys.acquire(ability(AbilityDefinition::new("dash", DASH), "hop"), &mut world).unwrap();

    assert_eq!(sys.by_kind(AbilityKind("hop")), Some(first));
    assert_eq!(sys.by_tag(DASH), Some(second));
    assert_eq!(sys.by_kind(AbilityKind("swim")), None);
}

#[test]
fn shared_reference_shares_state_between_agents() {
    let mut world = LogWorld::default();
    let jump = ability(AbilityDefinition::new("jump", JUMP).with_cooldown(1.0), "jump");
    let mut a = AbilitySystem::<LogWorld>::new(1, AbilityStats::default());
    let mut b = AbilitySystem::<LogWorld>::new(2, AbilityStats::default());
    let ha = a.acquire(Rc::clone(&jump), &mut world).unwrap();
    let hb = b.acquire(Rc::clone(&jump), &mut world).unwrap();

    a.run(ha, &mut world).unwrap();
    assert!(b.is_running(hb));
    assert!(!b.is_tag_running(JUMP));
    assert_eq!(b.run(hb, &mut world), Err(AbilityError::RunningElsewhere { tag: JUMP }));

    // Only the system that started the cooldown advances it.
    let ctx = TickContext::new(0, 0.25);
    b.tick(&ctx, &mut world);
    assert_eq!(b.cooldown_time_left(hb), 1.0);
    a.tick(&ctx, &mut world);
    assert!((a.cooldown_time_left(ha) - 0.75).abs() < 1e-4);
}

#[test]
fn private_copies_are_isolated() {
    let mut world = LogWorld::default();
    let jump = ability(AbilityDefinition::new("jump", JUMP).with_cooldown(1.0), "jump");
    let mut a = AbilitySystem::<LogWorld>::new(1, AbilityStats::default());
    let mut b = AbilitySystem::<LogWorld>::new(2, AbilityStats::default());
    let ha = a.acquire_copy(&jump, &mut world).unwrap();
    let hb = b.acquire_copy(&jump, &mut world).unwrap();

    a.run(ha, &mut world).unwrap();

    assert!(!b.is_running(hb));
    assert_eq!(b.cooldown_time_left(hb), 0.0);
    assert!(!jump.borrow().is_running());
    assert!(!a.has_ability(&jump));
    assert_eq!(a.acquire_copy(&jump, &mut world).unwrap(), ha);
}

#[test]
fn only_the_starting_system_finishes_a_shared_ability() {
    let mut world = LogWorld::default();
    let dash = ability(AbilityDefinition::new("dash", DASH).with_cooldown(1.0), "dash");
    let walk = ability(AbilityDefinition::new("walk", WALK).blocked_by([DASH]), "walk");
    let mut a = AbilitySystem::<LogWorld>::new(1, AbilityStats::default());
    let mut b = AbilitySystem::<LogWorld>::new(2, AbilityStats::default());
    let a_dash = a.acquire(Rc::clone(&dash), &mut world).unwrap();
    let a_walk = a.acquire(walk, &mut world).unwrap();
    let b_dash = b.acquire(Rc::clone(&dash), &mut world).unwrap();

    a.run(a_dash, &mut world).unwrap();
    assert!(!b.finish(b_dash, &mut world));
    assert!(!b.reset(b_dash, &mut world));
    b.teardown(&mut world);

    assert!(a.is_running(a_dash));
    assert!(a.is_tag_running(DASH));
    assert!(a.cooldown_time_left(a_dash) > 0.0);
    assert!(!a.can_use(a_walk, &world));

    assert!(a.finish(a_dash, &mut world));
    assert!(!a.is_tag_running(DASH));
    assert!(a.can_use(a_walk, &world));
    assert_eq!(
        world.log.iter().filter(|l| l.as_str() == "finish:dash").count(),
        1
    );

    // Once the run is over the other owner may start it.
    b.run(b_dash, &mut world).unwrap();
    assert!(b.is_tag_running(DASH));
    assert!(!a.is_tag_running(DASH));
}

#[test]
fn dropping_a_system_releases_its_shared_runs() {
    let mut world = LogWorld::default();
    let dash = ability(AbilityDefinition::new("dash", DASH).with_cooldown(1.0), "dash");
    let mut b = AbilitySystem::<LogWorld>::new(2, AbilityStats::default());
    let b_dash = b.acquire(Rc::clone(&dash), &mut world).unwrap();
    {
        let mut a = AbilitySystem::<LogWorld>::new(1, AbilityStats::default());
        let a_dash = a.acquire(Rc::clone(&dash), &mut world).unwrap();
        a.run(a_dash, &mut world).unwrap();
    }

    assert!(!b.is_running(b_dash));
    assert_eq!(b.cooldown_time_left(b_dash), 0.0);
    b.run(b_dash, &mut world).unwrap();
    assert!(b.is_tag_running(DASH));
}
