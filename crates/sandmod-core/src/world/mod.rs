//! World state - the cell grid, views over it and snapshots

mod cell;
mod grid;
mod neighbor_queries;
mod snapshot;
pub mod stats;
mod view;

pub use cell::{Cell, cell_flags};
pub use grid::{EdgeMode, Grid, GridError};
pub use neighbor_queries::NeighborQueries;
pub use snapshot::{GridSnapshot, SnapshotFormat};
pub use stats::{NoopStats, SimStats, TickStats};
pub use view::GridView;
