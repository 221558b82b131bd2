//! Application entry point for the growing-graph viewer.
//!
//! This binary parses the command line, loads configuration, and either
//! runs a fixed number of generations headless or hands a
//! [`Simulation`] to [`Viewer`] inside an eframe window.

mod viewer;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use grow_core::{
    config::{Dim, SimConfig},
    rule::Rule,
    simulation::Simulation,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Grow trivalent graphs with table-driven rewrite rules and watch them unfold.
#[derive(Parser, Debug)]
#[command(name = "grow-view")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file; the flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rewrite rule, decimal or 0x-prefixed hex
    #[arg(short, long)]
    rule: Option<Rule>,

    /// Per-node state mutation probability
    #[arg(long)]
    flip_prob: Option<f64>,

    /// Layout dimensionality (2 or 3)
    #[arg(long)]
    dim: Option<u8>,

    /// Seed for all randomness; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Layout sub-steps per frame
    #[arg(long)]
    tick_steps: Option<usize>,

    /// Stop growing once the graph has more nodes than this
    #[arg(long)]
    growth_limit: Option<usize>,

    /// Cycle through rules automatically
    #[arg(long)]
    autonomous: bool,

    /// Run this many generations without a window and print a summary
    #[arg(long, value_name = "GENERATIONS")]
    headless: Option<u32>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn build_config(cli: &Cli) -> anyhow::Result<SimConfig> {
    let mut cfg = load_config(cli.config.as_deref())?;

    if let Some(rule) = cli.rule {
        cfg.growth.rule = rule;
    }
    if let Some(p) = cli.flip_prob {
        cfg.growth.flip_prob = p;
    }
    if let Some(d) = cli.dim {
        cfg.layout.dim = Dim::try_from(d)?;
    }
    if let Some(n) = cli.tick_steps {
        cfg.driver.tick_steps = n;
    }
    if let Some(n) = cli.growth_limit {
        cfg.driver.growth_limit = n;
    }
    if cli.autonomous {
        cfg.driver.autonomous = true;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Grows for `generations` cycles (two frames each) and prints a JSON summary.
fn run_headless(cfg: SimConfig, seed: u64, generations: u32) -> anyhow::Result<()> {
    let mut sim = Simulation::new(cfg, seed)?;

    for _ in 0..generations.saturating_mul(2) {
        let report = sim.frame();
        if report.grow.is_none() && !cfg.driver.autonomous {
            info!("growth limit reached");
            break;
        }
    }

    let graph = sim.engine.graph();
    let center = sim.layout.center();
    let summary = serde_json::json!({
        "rule": sim.engine.rule().to_string(),
        "flip_prob": sim.engine.config().flip_prob,
        "generation": graph.generation(),
        "nodes": graph.len(),
        "links": graph.links().len(),
        "extent": sim.layout.extent(),
        "center": [center.x, center.y, center.z],
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(rule = %cfg.growth.rule, seed, "starting");

    if let Some(generations) = cli.headless {
        return run_headless(cfg, seed, generations);
    }

    let sim = Simulation::new(cfg, seed)?;
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Growing Graph",
        options,
        Box::new(|_cc| {
            // Hand the whole simulation to the viewer.
            Ok(Box::new(Viewer::new(sim)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
