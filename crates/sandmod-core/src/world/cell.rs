//! Cell type and per-phase flags
//!
//! Foundational type for the grid simulation.

use sandmod_simulation::ElementId;
use serde::{Deserialize, Serialize};

/// A single grid cell
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Occupying element (`ElementId::EMPTY` when unoccupied)
    pub element: ElementId,
    /// Transient phase flags, see [`cell_flags`]
    pub flags: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        element: ElementId::EMPTY,
        flags: 0,
    };

    pub fn new(element: ElementId) -> Self {
        Self { element, flags: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.element.is_empty()
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Flag bits for cell state
pub mod cell_flags {
    pub const MOVED: u8 = 1 << 0; // Already moved this tick
    pub const REACTED: u8 = 1 << 1; // Already took part in a reaction this tick
}
