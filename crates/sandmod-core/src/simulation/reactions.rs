//! Reaction phase - neighbor-pair rules between adjacent cells

use glam::IVec2;
use sandmod_simulation::{RuleSet, SimRng, shuffle};
use std::ops::Range;

use super::band_positions;
use crate::world::{Cell, GridView, NeighborQueries, SimStats, cell_flags};

/// Handles reactions between orthogonal neighbors
pub struct ReactionSystem;

impl ReactionSystem {
    /// Give every cell of `rows` one turn, in shuffled order
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
            Self::check_cell_reactions(view, pos, rules, stats, rng);
        }
    }

    /// Let the cell at `pos` act on its neighbors in random order
    ///
    /// The first reaction that fires rewrites both cells and ends the turn.
    /// Cells that already reacted this phase take no further part.
    pub fn check_cell_reactions<R: SimRng + ?Sized>(
        view: &mut GridView<'_>,
        pos: IVec2,
        rules: &RuleSet,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> bool {
        let cell = view.get(pos);
        if cell.is_empty()
            || cell.has_flag(cell_flags::REACTED)
            || !rules.has_reactions_from(cell.element)
        {
            return false;
        }

        // On narrow wrapped grids two offsets can land on the same cell
        let mut tried = [None; 4];
        for (slot, offset) in NeighborQueries::shuffled_orthogonal(rng).into_iter().enumerate() {
            let Some(neighbor) = view.resolve(pos + offset) else {
                continue;
            };
            if neighbor == pos || tried.contains(&Some(neighbor)) {
                continue;
            }
            tried[slot] = Some(neighbor);
            let other = view.get(neighbor);
            if other.has_flag(cell_flags::REACTED) {
                continue;
            }

            if let Some((new_left, new_right)) = rules.try_react(cell.element, other.element, rng) {
                view.set(pos, Self::reacted(new_left));
                view.set(neighbor, Self::reacted(new_right));
                stats.record_reaction();
                return true;
            }
        }
        false
    }

    fn reacted(element: sandmod_simulation::ElementId) -> Cell {
        Cell {
            element,
            flags: cell_flags::REACTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_rules::{fire_rules, id};
    use crate::world::{EdgeMode, Grid, TickStats};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use sandmod_simulation::{Declarations, ElementId, Statement, compile};

    fn react(grid: &mut Grid, rules: &RuleSet, seed: u64) -> TickStats {
        let mut stats = TickStats::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        grid.clear_flags(cell_flags::REACTED);
        let rows = 0..grid.height() as i32;
        ReactionSystem::run(&mut grid.view_mut(), rows, rules, &mut stats, &mut rng);
        stats
    }

    #[test]
    fn test_pair_reacts_and_both_cells_flagged() {
        let rules = fire_rules();
        let fire = id(&rules, "Fire");
        let wood = id(&rules, "Wood");
        let mut grid = Grid::new(2, 1).unwrap();
        grid.set(IVec2::new(0, 0), fire).unwrap();
        grid.set(IVec2::new(1, 0), wood).unwrap();

        let stats = react(&mut grid, &rules, 4);
        // `reaction 1.0 Fire Wood => Fire Fire`
        assert_eq!(grid.count(fire), 2);
        assert_eq!(stats.reactions, 1);
        assert!(grid.cells().iter().all(|c| c.has_flag(cell_flags::REACTED)));
    }

    #[test]
    fn test_one_reaction_per_cell_per_phase() {
        let rules = fire_rules();
        let fire = id(&rules, "Fire");
        let wood = id(&rules, "Wood");
        let mut grid = Grid::new(3, 1).unwrap();
        grid.set(IVec2::new(0, 0), wood).unwrap();
        grid.set(IVec2::new(1, 0), fire).unwrap();
        grid.set(IVec2::new(2, 0), wood).unwrap();

        let stats = react(&mut grid, &rules, 8);
        // The converted wood cell is flagged, so the fire only spreads once
        assert_eq!(stats.reactions, 1);
        assert_eq!(grid.count(fire), 2);
        assert_eq!(grid.count(wood), 1);

        react(&mut grid, &rules, 9);
        assert_eq!(grid.count(fire), 3);
    }

    #[test]
    fn test_direction_matters() {
        let rules = fire_rules();
        let wood = id(&rules, "Wood");
        let mut grid = Grid::new(2, 1).unwrap();
        grid.set(IVec2::new(0, 0), wood).unwrap();
        grid.set(IVec2::new(1, 0), wood).unwrap();

        let stats = react(&mut grid, &rules, 1);
        assert!(stats.is_quiet());
        assert_eq!(grid.count(wood), 2);
    }

    #[test]
    fn test_empty_outcome_clears_cell() {
        let rules = fire_rules();
        let water = id(&rules, "Water");
        let fire = id(&rules, "Fire");
        let mut grid = Grid::new(1, 2).unwrap();
        grid.set(IVec2::new(0, 0), water).unwrap();
        grid.set(IVec2::new(0, 1), fire).unwrap();

        // `reaction 1.0 Water Fire => Water Empty`
        react(&mut grid, &rules, 2);
        assert_eq!(grid.get(IVec2::new(0, 1)), Some(ElementId::EMPTY));
        assert_eq!(grid.get(IVec2::new(0, 0)), Some(water));
    }

    fn reaction_rate(edge: EdgeMode) -> f64 {
        let decls = Declarations::new()
            .with(Statement::element("A", "#FF0000"))
            .with(Statement::element("B", "#00FF00"))
            .with(Statement::element("C", "#0000FF"))
            .with(Statement::reaction(0.5, "A", "B", "C", "C"));
        let rules = compile(&decls).unwrap();
        let (a, b, c) = (id(&rules, "A"), id(&rules, "B"), id(&rules, "C"));

        let mut grid = Grid::with_edge_mode(2, 1, edge).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(77);
        let trials = 20_000;
        let mut fired = 0;
        for _ in 0..trials {
            grid.set(IVec2::new(0, 0), a).unwrap();
            grid.set(IVec2::new(1, 0), b).unwrap();
            let mut stats = TickStats::default();
            ReactionSystem::run(&mut grid.view_mut(), 0..1, &rules, &mut stats, &mut rng);
            if grid.get(IVec2::new(0, 0)) == Some(c) {
                fired += 1;
            }
        }
        fired as f64 / trials as f64
    }

    #[test]
    fn test_wrapped_neighbor_tried_once_per_turn() {
        // Width 2 with wrap: east and west are the same cell
        for edge in [EdgeMode::Wall, EdgeMode::Wrap] {
            let rate = reaction_rate(edge);
            assert!((rate - 0.5).abs() < 0.02, "{edge:?} rate was {rate}");
        }
    }
}
