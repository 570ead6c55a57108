#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Rampart session.

mod layout_transfer;
mod scenario;
mod summary;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{layout_transfer::TowerLayout, scenario::Scenario, summary::Summary};

/// Command-line arguments for the headless runner.
#[derive(Debug, Parser)]
#[command(name = "rampart", about = "Runs a scripted Rampart session headlessly")]
struct CliArgs {
    /// Scenario file to load; the built-in scenario is used when omitted.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Number of ticks to simulate, overriding the scenario.
    #[arg(long)]
    ticks: Option<u64>,
    /// Seconds per tick, overriding the scenario.
    #[arg(long)]
    dt: Option<f32>,
    /// Tower layout string replacing the scenario's towers.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,
    /// Prints the scenario's tower layout string and exits.
    #[arg(long)]
    export_layout: bool,
    /// Stops simulating once the session runs out of lives.
    #[arg(long)]
    stop_on_game_over: bool,
    /// Prints the summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::builtin()?,
    };
    if let Some(layout) = &args.layout {
        let layout = TowerLayout::decode(layout).context("failed to decode tower layout")?;
        scenario.apply_layout(layout)?;
    }
    if args.export_layout {
        let encoded = scenario
            .layout()
            .encode()
            .context("failed to encode tower layout")?;
        println!("{encoded}");
        return Ok(());
    }

    let ticks = args.ticks.unwrap_or(scenario.ticks);
    let dt = args.dt.unwrap_or(scenario.dt);
    ensure!(
        dt.is_finite() && dt > 0.0,
        "tick length must be a positive number of seconds"
    );

    let summary = run(&scenario, ticks, dt, args.stop_on_game_over)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialise summary")?;
        println!("{json}");
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

fn run(scenario: &Scenario, ticks: u64, dt: f32, stop_on_game_over: bool) -> Result<Summary> {
    let mut game = scenario.build()?;
    let input = scenario.input();
    let mut summary = Summary::default();

    info!(ticks, dt, "starting session");
    for tick in 0..ticks {
        let report = game.update(dt, &input.at(tick));
        summary.record(&report);
        if stop_on_game_over && report.counters.game_over {
            info!(tick = report.counters.tick, "session over");
            break;
        }
    }
    Ok(summary)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
