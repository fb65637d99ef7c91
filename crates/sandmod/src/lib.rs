//! # sandmod - headless runner
//!
//! Loads a mod (RON declarations or the built-in default mod), paints an
//! optional scene, advances the simulation and exports a grid snapshot.

pub mod config;
pub mod runner;
pub mod scene;

pub use config::RunnerConfig;
pub use runner::{RunSummary, run};
pub use scene::{PaintOp, Scene};
