//! sandmod - run a falling-sand mod headless

use clap::{Parser, ValueEnum};
use sandmod::config::RunnerConfig;
use sandmod::runner;
use sandmod_core::world::SnapshotFormat;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Ron,
    Bincode,
}

impl From<Format> for SnapshotFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ron => SnapshotFormat::Ron,
            Format::Bincode => SnapshotFormat::Bincode,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mod declarations in RON (default: built-in default mod)
    #[arg(long = "mod")]
    mod_path: Option<PathBuf>,

    /// Scene file with initial paint operations
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of parallel row bands (1 = sequential)
    #[arg(long)]
    bands: Option<usize>,

    /// Write the final snapshot here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Snapshot format
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Config file (default: sandmod.ron in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the compiled elements and exit
    #[arg(long)]
    list_elements: bool,
}

impl Args {
    /// Layer 4: command line flags win over every other source
    fn apply(self, config: &mut RunnerConfig) {
        if let Some(path) = self.mod_path {
            config.run.mod_path = Some(path);
        }
        if let Some(path) = self.scene {
            config.run.scene = Some(path);
        }
        if let Some(ticks) = self.ticks {
            config.run.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(bands) = self.bands {
            config.simulation.bands = bands;
        }
        if let Some(path) = self.output {
            config.output.path = Some(path);
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RunnerConfig::load_from(path)?,
        None => RunnerConfig::load()?,
    };

    if args.list_elements {
        let rules = runner::load_rules(args.mod_path.as_deref().or(config.run.mod_path.as_deref()))?;
        for line in runner::element_listing(&rules) {
            println!("{line}");
        }
        return Ok(());
    }

    args.apply(&mut config);
    let summary = runner::run(&config)?;

    log::info!(
        "Finished {} ticks: {} moves, {} self transitions, {} reactions",
        summary.ticks,
        summary.totals.cells_moved,
        summary.totals.self_transitions,
        summary.totals.reactions
    );
    if let Some(path) = &config.output.path {
        log::info!("Snapshot written to {}", path.display());
    }
    Ok(())
}
