//! Headless run: load a mod, paint a scene, tick, export a snapshot

use anyhow::{Context, Result};
use sandmod_core::simulation::Simulator;
use sandmod_core::world::{Grid, GridSnapshot, TickStats};
use sandmod_simulation::{Declarations, RuleSet, compile};
use std::path::Path;
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::scene::Scene;

/// Load mod declarations from a RON file
pub fn load_declarations(path: &Path) -> Result<Declarations> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mod file: {}", path.display()))?;
    Declarations::from_ron(&content)
        .with_context(|| format!("Failed to parse RON mod: {}", path.display()))
}

/// Compile the mod at `path`, or the built-in default mod
pub fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    let decls = match path {
        Some(path) => load_declarations(path)?,
        None => Declarations::default_mod(),
    };
    let rules = compile(&decls).context("Failed to compile mod")?;

    log::info!(
        "Loaded mod {:?}: {} elements, {} reactions, {} self transitions",
        rules.title().unwrap_or("(untitled)"),
        rules.elements().len(),
        rules.reaction_count(),
        rules.self_rule_count()
    );
    Ok(rules)
}

/// One line per element: name, display name, tags, properties, description
pub fn element_listing(rules: &RuleSet) -> Vec<String> {
    rules
        .elements()
        .iter()
        .map(|def| {
            let p = &def.properties;
            format!(
                "{:<10} {:<10} density={} gravity={} spread={} slide={} [{}] {}",
                def.name,
                def.label(),
                p.density,
                p.gravity,
                p.spread,
                p.slide,
                def.tags.join(", "),
                def.description.trim_end()
            )
        })
        .collect()
}

/// Result of a headless run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub totals: TickStats,
    pub snapshot: GridSnapshot,
}

/// Build the simulator described by `config`
pub fn build_simulator(config: &RunnerConfig) -> Result<Simulator> {
    let rules = Arc::new(load_rules(config.run.mod_path.as_deref())?);
    let mut sim_config = config.simulation;

    let scene = match &config.run.scene {
        Some(path) => Some(Scene::from_file(path)?),
        None => None,
    };
    if let Some((width, height)) = scene.as_ref().and_then(|s| s.size) {
        sim_config.width = width;
        sim_config.height = height;
    }

    let grid = Grid::with_edge_mode(sim_config.width, sim_config.height, sim_config.edge)
        .context("Failed to create grid")?;
    let mut sim = Simulator::with_grid(rules, grid, sim_config);

    if let Some(scene) = &scene {
        let rules = sim.rules().clone();
        scene.apply(sim.grid_mut(), rules.elements())?;
    }
    Ok(sim)
}

/// Run the configured number of ticks and write the snapshot if requested
pub fn run(config: &RunnerConfig) -> Result<RunSummary> {
    let mut sim = build_simulator(config)?;
    log::info!(
        "Running {} ticks on a {}x{} grid ({} band(s), seed {})",
        config.run.ticks,
        sim.config().width,
        sim.config().height,
        sim.band_count(),
        sim.config().seed
    );

    for tick in 1..=config.run.ticks {
        let stats = sim.tick();
        if stats.is_quiet() {
            log::trace!("tick {tick}: grid at rest");
        }
        if config.run.log_every > 0 && tick % config.run.log_every == 0 {
            log::info!(
                "tick {tick}: moved={} transitions={} reactions={}",
                stats.cells_moved,
                stats.self_transitions,
                stats.reactions
            );
        }
    }

    let snapshot = sim.snapshot();
    if let Some(path) = &config.output.path {
        snapshot.save(path, config.output.format)?;
    }

    Ok(RunSummary {
        ticks: config.run.ticks,
        totals: sim.totals(),
        snapshot,
    })
}
