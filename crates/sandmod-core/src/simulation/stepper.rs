//! Tick driver - sequential and banded parallel stepping
//!
//! Sequential stepping runs each phase over the whole grid with one
//! caller-supplied RNG. Banded stepping splits the rows into horizontal bands
//! of at least [`MIN_BAND_ROWS`] rows and runs every phase in two passes (even
//! bands, then odd bands). A band worker owns its rows and may write one guard
//! row above and below, so the windows of one pass never overlap.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use sandmod_simulation::{RuleSet, SimRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

use super::Phase;
use crate::world::{EdgeMode, Grid, GridError, GridSnapshot, TickStats, cell_flags};

/// Smallest band height that keeps the windows of one pass disjoint
pub const MIN_BAND_ROWS: usize = 3;

/// Advance the grid by one tick in place
pub fn step<R: SimRng + ?Sized>(grid: &mut Grid, rules: &RuleSet, rng: &mut R) -> TickStats {
    let mut stats = TickStats::default();
    let rows = 0..grid.height() as i32;

    for phase in Phase::ALL {
        clear_phase_flags(grid, phase);
        phase.run(&mut grid.view_mut(), rows.clone(), rules, &mut stats, rng);
    }

    grid.advance_tick();
    log::trace!("Tick {} done: {:?}", grid.tick(), stats);
    stats
}

fn clear_phase_flags(grid: &mut Grid, phase: Phase) {
    match phase {
        Phase::SelfTransition => {}
        Phase::Movement => grid.clear_flags(cell_flags::MOVED),
        Phase::Reaction => grid.clear_flags(cell_flags::REACTED),
    }
}

/// Split `height` rows into at most `bands` bands of at least
/// [`MIN_BAND_ROWS`] rows each
pub fn band_ranges(height: usize, bands: usize) -> Vec<Range<usize>> {
    let count = bands.min(height / MIN_BAND_ROWS).max(1);
    let base = height / count;
    let extra = height % count;

    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for band in 0..count {
        let len = base + usize::from(band < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Seed for one band worker, derived from (seed, tick, phase, band)
fn band_seed(seed: u64, tick: u64, phase: Phase, band: usize) -> u64 {
    let mut hash = seed ^ 0x9E37_79B9_7F4A_7C15;
    for value in [tick, phase as u64, band as u64] {
        hash = (hash ^ value).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        hash ^= hash >> 31;
    }
    hash
}

fn step_banded(grid: &mut Grid, rules: &RuleSet, bands: &[Range<usize>], seed: u64) -> TickStats {
    let tick = grid.tick();
    let height = grid.height();
    let mut stats = TickStats::default();

    for phase in Phase::ALL {
        clear_phase_flags(grid, phase);

        for parity in 0..2 {
            let active: Vec<(usize, Range<usize>)> = bands
                .iter()
                .cloned()
                .enumerate()
                .filter(|(band, _)| band % 2 == parity)
                .collect();
            let windows: Vec<Range<usize>> = active
                .iter()
                .map(|(_, rows)| rows.start.saturating_sub(1)..(rows.end + 1).min(height))
                .collect();

            let views = grid.windows_mut(&windows);
            let band_stats: Vec<TickStats> = views
                .into_par_iter()
                .zip(active.into_par_iter())
                .map(|(mut view, (band, rows))| {
                    let mut rng = Xoshiro256StarStar::seed_from_u64(band_seed(seed, tick, phase, band));
                    let mut stats = TickStats::default();
                    phase.run(
                        &mut view,
                        rows.start as i32..rows.end as i32,
                        rules,
                        &mut stats,
                        &mut rng,
                    );
                    stats
                })
                .collect();

            for band in &band_stats {
                stats.merge(band);
            }
        }
    }

    grid.advance_tick();
    log::trace!(
        "Tick {} done over {} bands: {:?}",
        grid.tick(),
        bands.len(),
        stats
    );
    stats
}

/// Simulator configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub edge: EdgeMode,
    /// Number of parallel bands (1 = sequential)
    pub bands: usize,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 96,
            edge: EdgeMode::Wall,
            bands: 1,
            seed: 0,
        }
    }
}

/// Owns a grid and a shared rule set and advances them tick by tick
pub struct Simulator {
    rules: Arc<RuleSet>,
    grid: Grid,
    config: SimConfig,
    rng: Xoshiro256StarStar,
    bands: Vec<Range<usize>>,
    totals: TickStats,
}

impl Simulator {
    /// Create a simulator over an empty grid
    pub fn new(rules: Arc<RuleSet>, config: SimConfig) -> Result<Self, GridError> {
        let grid = Grid::with_edge_mode(config.width, config.height, config.edge)?;
        Ok(Self::with_grid(rules, grid, config))
    }

    /// Create a simulator over an existing grid; its dimensions win over the config's
    pub fn with_grid(rules: Arc<RuleSet>, mut grid: Grid, mut config: SimConfig) -> Self {
        config.width = grid.width();
        config.height = grid.height();
        grid.set_edge_mode(config.edge);

        let bands = band_ranges(grid.height(), config.bands);
        log::debug!(
            "Simulator {}x{} with {} band(s), seed {}",
            config.width,
            config.height,
            bands.len(),
            config.seed
        );

        Self {
            rules,
            grid,
            rng: Xoshiro256StarStar::seed_from_u64(config.seed),
            config,
            bands,
            totals: TickStats::default(),
        }
    }

    /// Advance one tick
    pub fn tick(&mut self) -> TickStats {
        let stats = if self.bands.len() > 1 {
            step_banded(&mut self.grid, &self.rules, &self.bands, self.config.seed)
        } else {
            step(&mut self.grid, &self.rules, &mut self.rng)
        };
        self.totals.merge(&stats);
        stats
    }

    /// Advance `ticks` ticks, returning the summed counters
    pub fn run(&mut self, ticks: u64) -> TickStats {
        let mut stats = TickStats::default();
        for _ in 0..ticks {
            stats.merge(&self.tick());
        }
        stats
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Effective number of bands after applying the minimum band height
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Counters accumulated since construction
    pub fn totals(&self) -> TickStats {
        self.totals
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot(self.rules.elements())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_rules::{fire_rules, id, physics_rules};
    use glam::IVec2;

    #[test]
    fn test_band_ranges_respect_minimum() {
        assert_eq!(band_ranges(10, 1), vec![0..10]);
        assert_eq!(band_ranges(10, 3), vec![0..4, 4..7, 7..10]);
        // Only two bands of three rows fit in seven rows
        assert_eq!(band_ranges(7, 8), vec![0..4, 4..7]);
        assert_eq!(band_ranges(2, 4), vec![0..2]);
        assert!(band_ranges(100, 16).iter().all(|r| r.len() >= MIN_BAND_ROWS));
    }

    #[test]
    fn test_band_seed_varies() {
        let a = band_seed(1, 0, Phase::Movement, 0);
        assert_ne!(a, band_seed(1, 0, Phase::Movement, 1));
        assert_ne!(a, band_seed(1, 1, Phase::Movement, 0));
        assert_ne!(a, band_seed(1, 0, Phase::Reaction, 0));
        assert_eq!(a, band_seed(1, 0, Phase::Movement, 0));
    }

    #[test]
    fn test_step_advances_tick() {
        let rules = fire_rules();
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set(IVec2::new(0, 0), id(&rules, "Ember")).unwrap();

        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let stats = step(&mut grid, &rules, &mut rng);
        assert_eq!(grid.tick(), 1);
        assert_eq!(stats.self_transitions, 1);
    }

    #[test]
    fn test_banded_sand_crosses_band_boundaries() {
        let rules = Arc::new(physics_rules());
        let sand = id(&rules, "Sand");
        let config = SimConfig {
            width: 4,
            height: 12,
            bands: 4,
            seed: 9,
            ..Default::default()
        };
        let mut sim = Simulator::new(rules, config).unwrap();
        assert_eq!(sim.band_count(), 4);
        sim.grid_mut().fill_row(0, sand).unwrap();

        sim.run(30);
        assert_eq!(sim.grid().count(sand), 4);
        assert!(sim.grid().row(11).all(|e| e == sand));
        assert_eq!(sim.grid().tick(), 30);
    }
}
