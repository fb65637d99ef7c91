//! Grid simulation for sandmod
//!
//! Owns the cell grid and runs the per-tick phases against a compiled
//! [`RuleSet`](sandmod_simulation::RuleSet):
//! - Self transitions (single-cell rules)
//! - Movement (gravity, slide, spread, density displacement)
//! - Reactions (ordered neighbor pairs)
//!
//! Ticks run sequentially with one RNG, or in parallel over horizontal bands
//! with per-band RNGs (see [`Simulator`]).

pub mod simulation;
pub mod world;

pub use simulation::{Phase, SimConfig, Simulator, step};
pub use world::{Cell, EdgeMode, Grid, GridError, GridSnapshot, SnapshotFormat, TickStats};
