//! Simulation systems - self transitions, movement, reactions and stepping

mod movement;
mod reactions;
mod stepper;
mod transitions;

pub use movement::MovementUpdater;
pub use reactions::ReactionSystem;
pub use stepper::{MIN_BAND_ROWS, SimConfig, Simulator, band_ranges, step};
pub use transitions::SelfTransitionSystem;

use glam::IVec2;
use sandmod_simulation::{RuleSet, SimRng};
use std::ops::Range;

use crate::world::{GridView, SimStats};

/// The three phases of a tick, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    SelfTransition,
    Movement,
    Reaction,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::SelfTransition, Phase::Movement, Phase::Reaction];

    /// Run this phase over the owned `rows` of a window
    pub fn run<R: SimRng + ?Sized>(
        self,
        view: &mut GridView<'_>,
        rows: Range<i32>,
        rules: &RuleSet,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) {
        match self {
            Phase::SelfTransition => SelfTransitionSystem::run(view, rows, rules, stats, rng),
            Phase::Movement => MovementUpdater::run(view, rows, rules, stats, rng),
            Phase::Reaction => ReactionSystem::run(view, rows, rules, stats, rng),
        }
    }
}

/// Every position of `rows`, row-major
pub(crate) fn band_positions(width: i32, rows: Range<i32>) -> Vec<IVec2> {
    rows.flat_map(|y| (0..width).map(move |x| IVec2::new(x, y)))
        .collect()
}
