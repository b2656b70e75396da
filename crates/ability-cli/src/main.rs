//! Ability roster tooling.
//!
//! - `abilities check --roster <file>` - validate a roster and list its abilities
//! - `abilities simulate --roster <file>` - run one agent headless and print what it did

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use ability_core::{Roster, TagRegistry};
use ability_kit::{behavior_library, KinematicWorld};

mod sim;

use sim::{Press, SimOptions, TickWindow};

#[derive(Parser)]
#[command(name = "abilities")]
#[command(about = "Ability roster checker and simulator", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and compile a roster
    Check {
        #[arg(long)]
        roster: PathBuf,
    },

    /// Drive one agent through a scripted run
    Simulate {
        #[arg(long)]
        roster: PathBuf,

        /// Frames to simulate
        #[arg(long, default_value_t = 120)]
        ticks: u64,

        /// Seconds per frame
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Fixed updates (and physics steps) per frame
        #[arg(long, default_value_t = 1)]
        fixed_steps: u32,

        /// Input press, e.g. `jump@10` (repeatable)
        #[arg(long = "press")]
        presses: Vec<Press>,

        /// Frames with forward input, e.g. `0..60`
        #[arg(long)]
        walk: Option<TickWindow>,

        /// Frames during which the game is paused
        #[arg(long)]
        pause: Option<TickWindow>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Check { roster } => check(&roster),
        Commands::Simulate {
            roster,
            ticks,
            dt,
            fixed_steps,
            presses,
            walk,
            pause,
            json,
        } => {
            let options = SimOptions {
                ticks,
                dt,
                fixed_steps,
                presses,
                walk,
                pause,
            };
            simulate(&roster, &options, json)
        }
    }
}

fn load(path: &Path) -> Result<Roster> {
    Roster::load(path).with_context(|| format!("loading roster {}", path.display()))
}

fn check(path: &Path) -> Result<()> {
    let roster = load(path)?;
    let mut tags = TagRegistry::new();
    let catalog = roster.compile(&behavior_library::<KinematicWorld>(), &mut tags)?;

    let names = |list: &[ability_core::AbilityTag]| {
        list.iter()
            .map(|tag| tags.name(*tag).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(",")
    };

    let mode = if catalog.clone_abilities() { "clone" } else { "shared" };
    println!("{} abilities ({mode} mode)", catalog.references().len());
    for reference in catalog.references() {
        let ability = reference.borrow();
        let def = ability.definition();
        println!(
            "  {:<12} kind={:<6} cooldown={:<5} cost={:<5} buffer={:<5} blocked_by=[{}] allowed_by=[{}]",
            def.name,
            ability.kind(),
            def.base_cooldown,
            def.energy_cost,
            def.input_buffer_duration,
            names(&def.blocked_by),
            names(&def.allowed_by),
        );
    }
    let acquired: Vec<_> = catalog.acquired_tags().collect();
    println!("acquired: [{}]", names(&acquired));
    Ok(())
}

fn simulate(path: &Path, options: &SimOptions, json: bool) -> Result<()> {
    let roster = load(path)?;
    let report = sim::simulate(&roster, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut last: Option<&Vec<String>> = None;
    for frame in &report.frames {
        if last == Some(&frame.running) {
            continue;
        }
        let [x, y, z] = frame.position;
        println!(
            "tick {:>4}  running=[{}]  pos=({x:.2}, {y:.2}, {z:.2})  energy={:.1}{}",
            frame.tick,
            frame.running.join(", "),
            frame.energy,
            if frame.paused { "  (paused)" } else { "" },
        );
        last = Some(&frame.running);
    }
    println!("{} trace events", report.trace.events.len());
    Ok(())
}
