//! Self-transition phase
//!
//! Every occupied cell gets one chance per tick to decay into another element
//! (`self 0.2 Fire1 => Fire2`), independent of its neighbors.

use glam::IVec2;
use sandmod_simulation::{RuleSet, SimRng, shuffle};
use std::ops::Range;

use super::band_positions;
use crate::world::{Cell, GridView, SimStats};

/// System for applying self transitions
pub struct SelfTransitionSystem;

impl SelfTransitionSystem {
    /// Visit every cell of `rows` once, in shuffled order
    pub fn run<R: SimRng + ?Sized>(
        view: &mut GridView<'_>,
        rows: Range<i32>,
        rules: &RuleSet,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) {
        let mut order = band_positions(view.width(), rows);
        shuffle(&mut order, rng);

        for pos in order {
            Self::check_transition(view, pos, rules, stats, rng);
        }
    }

    /// Returns true if the cell at `pos` was replaced
    pub fn check_transition<R: SimRng + ?Sized>(
        view: &mut GridView<'_>,
        pos: IVec2,
        rules: &RuleSet,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> bool {
        let cell = view.get(pos);
        if cell.is_empty() {
            return false;
        }

        match rules.try_self(cell.element, rng) {
            Some(target) => {
                view.set(pos, Cell::new(target));
                stats.record_self_transition();
                true
            }
            None => false,
        }
    }
}
