//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `sandmod.ron` file (if exists)
//! 3. Environment variables prefixed with `SANDMOD_`
//! 4. Command line flags (applied by the binary)
//!
//! Example environment variable: `SANDMOD_SIMULATION__BANDS=4`

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use sandmod_core::simulation::SimConfig;
use sandmod_core::world::SnapshotFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory
pub const CONFIG_FILE: &str = "sandmod.ron";

/// Main runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    #[serde(default)]
    pub simulation: SimConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// What to run and for how long
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Mod declarations in RON (built-in default mod when unset)
    pub mod_path: Option<PathBuf>,
    /// Initial paint operations in RON
    pub scene: Option<PathBuf>,
    /// Number of ticks to simulate
    pub ticks: u64,
    /// Log a progress line every this many ticks (0 disables)
    pub log_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mod_path: None,
            scene: None,
            ticks: 100,
            log_every: 0,
        }
    }
}

/// Where the final snapshot goes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    pub format: SnapshotFormat,
}

impl RunnerConfig {
    /// Load configuration from `sandmod.ron` in the working directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. The RON file at `path` (if exists)
    /// 3. Environment variables prefixed with `SANDMOD_` (highest priority)
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = SimConfig::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("simulation.width", defaults.width as i64)?
            .set_default("simulation.height", defaults.height as i64)?
            .set_default("simulation.edge", "Wall")?
            .set_default("simulation.bands", defaults.bands as i64)?
            .set_default("simulation.seed", defaults.seed as i64)?
            .set_default("run.ticks", 100_i64)?
            .set_default("run.log_every", 0_i64)?
            .set_default("output.format", "ron")?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::from(path)
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (SANDMOD_SIMULATION__SEED, etc.)
            .add_source(
                Environment::with_prefix("SANDMOD")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
