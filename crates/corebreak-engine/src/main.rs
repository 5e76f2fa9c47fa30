//! # Corebreak Engine
//!
//! Headless host for the corebreak combat core.
//!
//! Builds a stage or the boss arena, feeds the simulation a scripted input
//! timeline at 60 Hz and prints every gameplay notification as a JSON line
//! on stdout. Logs go to stderr through `tracing`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod arena;
mod report;
mod script;
mod timing;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use corebreak_common::Millis;
use corebreak_gameplay::{CombatConfig, EventBus, Fanout, PresentationLog, ScoreBoard};
use tracing::{debug, info, trace};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::arena::Scenario;
use crate::report::{JsonLines, PresentationTally};
use crate::script::Script;
use crate::timing::FixedStep;

#[derive(Parser)]
#[command(author, version, about = "Headless corebreak combat runner", long_about = None)]
struct Cli {
    /// Tuning file (TOML). Missing or invalid files fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Level layout to run
    #[arg(long, value_enum, default_value_t = Scenario::Level)]
    scenario: Scenario,
    /// Simulated run length in seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,
    /// Seed for every random choice in the simulation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("corebreak=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("Corebreak {} starting", env!("CARGO_PKG_VERSION"));
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CombatConfig::load_from(path),
        None => {
            let mut config = CombatConfig::default();
            config.validate();
            config
        },
    };

    let mut fx = PresentationLog::new();
    let mut sim = arena::build(cli.scenario, config, cli.seed, &mut fx)?;
    let length: Millis = cli.seconds.saturating_mul(1000);
    let script = Script::for_scenario(cli.scenario, length);
    debug!(cues = script.len(), length_ms = length, "script loaded");

    let mut board = ScoreBoard::new();
    let mut bus = EventBus::default();
    let mut lines = JsonLines::new(io::stdout().lock());
    let mut tally = PresentationTally::default();
    let mut clock = FixedStep::default();

    while sim.now() < length && !sim.level().is_resolved() {
        let input = script.sample(sim.now(), clock.frame());
        let dt = clock.next_dt();
        {
            let mut sink = Fanout::new(&mut board, &mut bus);
            sim.tick(dt, &input, &mut sink, &mut fx);
        }
        for event in bus.drain() {
            lines.emit(sim.now(), &event)?;
        }
        let requests = fx.take();
        if !requests.is_empty() {
            trace!(now = sim.now(), count = requests.len(), "presentation requests");
        }
        tally.record(&requests);
    }

    debug!(lines = lines.written(), frames = clock.frame(), "output written");
    lines.finish()?;
    report::summarize(sim.now(), sim.level(), &board, tally);
    Ok(())
}
