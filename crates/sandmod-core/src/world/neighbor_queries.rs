//! Neighbor offset utilities

use glam::IVec2;
use sandmod_simulation::{SimRng, shuffle};

use super::view::GridView;

/// Stateless helpers for the neighborhoods the phases look at
pub struct NeighborQueries;

impl NeighborQueries {
    /// Orthogonal neighbor offsets
    ///
    /// Order: S, E, N, W
    pub const ORTHOGONAL: [IVec2; 4] = [
        IVec2::new(0, 1),
        IVec2::new(1, 0),
        IVec2::new(0, -1),
        IVec2::new(-1, 0),
    ];

    /// Orthogonal offsets in a random order
    pub fn shuffled_orthogonal<R: SimRng + ?Sized>(rng: &mut R) -> [IVec2; 4] {
        let mut offsets = Self::ORTHOGONAL;
        shuffle(&mut offsets, rng);
        offsets
    }

    /// The two diagonal offsets one row along `direction`, `first_side` first
    pub fn diagonals(direction: i32, first_side: i32) -> [IVec2; 2] {
        [
            IVec2::new(first_side, direction),
            IVec2::new(-first_side, direction),
        ]
    }

    /// Distinct resolved orthogonal neighbors of `pos` within the view,
    /// skipping walls
    pub fn orthogonal_neighbors(view: &GridView<'_>, pos: IVec2) -> Vec<IVec2> {
        let mut neighbors = Vec::with_capacity(4);
        for offset in Self::ORTHOGONAL {
            if let Some(n) = view.resolve(pos + offset) {
                if n != pos && !neighbors.contains(&n) {
                    neighbors.push(n);
                }
            }
        }
        neighbors
    }
}
