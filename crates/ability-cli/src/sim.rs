//! Headless driver: one agent in a [`KinematicWorld`], scripted input, fixed-step physics.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::str::FromStr;

use ability_core::{
    AbilitySystem, GameState, GameStateManager, InputAction, QuitRequested, Roster, Signal,
    TagRegistry, TickContext, TraceEvent, TraceLog, TraceSink,
};
use ability_kit::{behavior_library, KinematicWorld, MoveInput, Vec3, JUMP_INPUT};
use anyhow::{bail, Context, Result};
use serde::Serialize;

pub const AGENT: u64 = 1;

/// Inputs the reference abilities bind to.
const KNOWN_INPUTS: &[InputAction] = &[JUMP_INPUT];

/// `ACTION@TICK`, e.g. `jump@12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub action: InputAction,
    pub tick: u64,
}

impl FromStr for Press {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tick) = s
            .split_once('@')
            .ok_or_else(|| format!("expected ACTION@TICK, got `{s}`"))?;
        let action = KNOWN_INPUTS
            .iter()
            .copied()
            .find(|a| a.0 == name)
            .ok_or_else(|| format!("unknown input `{name}`"))?;
        let tick = tick.parse().map_err(|e| format!("bad tick `{tick}`: {e}"))?;
        Ok(Self { action, tick })
    }
}

/// `FROM..TO` tick window, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickWindow(pub Range<u64>);

impl FromStr for TickWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once("..")
            .ok_or_else(|| format!("expected FROM..TO, got `{s}`"))?;
        let from: u64 = from.parse().map_err(|e| format!("bad start `{from}`: {e}"))?;
        let to: u64 = to.parse().map_err(|e| format!("bad end `{to}`: {e}"))?;
        if to < from {
            return Err(format!("empty window `{s}`"));
        }
        Ok(Self(from..to))
    }
}

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub ticks: u64,
    pub dt: f32,
    pub fixed_steps: u32,
    pub presses: Vec<Press>,
    pub walk: Option<TickWindow>,
    pub pause: Option<TickWindow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub running: Vec<String>,
    pub position: [f32; 3],
    pub grounded: bool,
    pub energy: f32,
    pub paused: bool,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub frames: Vec<Frame>,
    pub trace: TraceLog,
}

#[derive(Clone, Default)]
struct SharedLog(Rc<RefCell<TraceLog>>);

impl TraceSink for SharedLog {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().emit(event);
    }
}

pub fn simulate(roster: &Roster, options: &SimOptions) -> Result<Report> {
    if options.fixed_steps == 0 {
        bail!("fixed steps must be at least 1");
    }

    let mut tags = TagRegistry::new();
    let catalog = roster
        .compile(&behavior_library::<KinematicWorld>(), &mut tags)
        .context("compiling roster")?;

    let mut world = KinematicWorld::default();
    world.spawn(AGENT, Vec3::ZERO);

    let log = SharedLog::default();
    let game_state = GameStateManager::default();
    let quit = Signal::<QuitRequested>::new();
    let mut system = AbilitySystem::new(AGENT, roster.stats)
        .with_state_manager(&game_state)
        .with_quit_signal(&quit)
        .with_trace_sink(Box::new(log.clone()));
    let handles = catalog.possess_acquired(&mut system, &mut world)?;
    tracing::info!(abilities = handles.len(), "agent ready");

    let fixed_dt = options.dt / options.fixed_steps as f32;
    let mut ctx = TickContext::new(0, options.dt);
    let mut fixed_ctx = TickContext::new(0, fixed_dt);
    let mut frames = Vec::with_capacity(options.ticks as usize);

    for tick in 0..options.ticks {
        let walking = options.walk.as_ref().is_some_and(|w| w.0.contains(&tick));
        world.set_input(
            AGENT,
            MoveInput {
                forward: if walking { 1.0 } else { 0.0 },
                ..MoveInput::default()
            },
        );
        let paused = options.pause.as_ref().is_some_and(|w| w.0.contains(&tick));
        game_state.set_state(if paused { GameState::Paused } else { GameState::Running });

        for press in options.presses.iter().filter(|p| p.tick == tick) {
            if system.on_input(press.action) == 0 {
                tracing::warn!(tick, input = press.action.0, "no ability bound to input");
            }
        }

        system.tick(&ctx, &mut world);
        for _ in 0..options.fixed_steps {
            system.fixed_tick(&fixed_ctx, &mut world);
            world.step(fixed_dt);
            fixed_ctx = fixed_ctx.next();
        }

        let body = world.body(AGENT).copied().unwrap_or_default();
        frames.push(Frame {
            tick,
            running: system
                .running_tags()
                .map(|tag| tags.name(tag).unwrap_or("?").to_string())
                .collect(),
            position: [body.position.x, body.position.y, body.position.z],
            grounded: body.grounded,
            energy: system.stats().energy,
            paused: system.is_paused(),
        });
        ctx = ctx.next();
    }

    quit.emit(QuitRequested);
    system.tick(&ctx, &mut world);
    tracing::debug!(running = system.running_tags().count(), "torn down");

    let trace = log.0.take();
    Ok(Report { frames, trace })
}
