//! Simulation statistics collection

use serde::{Deserialize, Serialize};

/// Trait for collecting simulation statistics
///
/// The phases report through this trait so callers can plug in their own
/// counters without the grid knowing about them.
pub trait SimStats {
    /// Record that a particle moved during the movement phase
    fn record_cell_moved(&mut self);

    /// Record that a self transition fired
    fn record_self_transition(&mut self);

    /// Record that a reaction fired between two neighbors
    fn record_reaction(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl SimStats for NoopStats {
    fn record_cell_moved(&mut self) {}
    fn record_self_transition(&mut self) {}
    fn record_reaction(&mut self) {}
}

/// Counters for a single tick, returned by `step`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    pub cells_moved: u32,
    pub self_transitions: u32,
    pub reactions: u32,
}

impl TickStats {
    /// Fold the counters of another band or tick into this one
    pub fn merge(&mut self, other: &TickStats) {
        self.cells_moved += other.cells_moved;
        self.self_transitions += other.self_transitions;
        self.reactions += other.reactions;
    }

    /// True when nothing changed during the tick
    pub fn is_quiet(&self) -> bool {
        *self == TickStats::default()
    }
}

impl SimStats for TickStats {
    fn record_cell_moved(&mut self) {
        self.cells_moved += 1;
    }

    fn record_self_transition(&mut self) {
        self.self_transitions += 1;
    }

    fn record_reaction(&mut self) {
        self.reactions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_stats_all_methods() {
        let mut stats = NoopStats;
        for _ in 0..100 {
            stats.record_cell_moved();
            stats.record_self_transition();
            stats.record_reaction();
        }
    }

    #[test]
    fn test_tick_stats_counts() {
        let mut stats = TickStats::default();
        assert!(stats.is_quiet());

        stats.record_cell_moved();
        stats.record_cell_moved();
        stats.record_self_transition();
        stats.record_reaction();
        stats.record_reaction();
        stats.record_reaction();

        assert_eq!(stats.cells_moved, 2);
        assert_eq!(stats.self_transitions, 1);
        assert_eq!(stats.reactions, 3);
        assert!(!stats.is_quiet());
    }

    #[test]
    fn test_tick_stats_merge() {
        let mut total = TickStats {
            cells_moved: 1,
            self_transitions: 0,
            reactions: 2,
        };
        let band = TickStats {
            cells_moved: 3,
            self_transitions: 4,
            reactions: 0,
        };
        total.merge(&band);
        assert_eq!(
            total,
            TickStats {
                cells_moved: 4,
                self_transitions: 4,
                reactions: 2,
            }
        );
    }
}
