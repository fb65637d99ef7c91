//! Movement phase - density-ordered settling under gravity
//!
//! Mobile particles (gravity != 0) step along their gravity direction,
//! deflect diagonally when blocked (slide) and jitter sideways (spread).
//! A mover may enter an Empty cell or swap with a mobile, not yet moved
//! neighbor that is lighter along its direction of travel. Inert elements
//! are never displaced.

use glam::IVec2;
use sandmod_simulation::{ElementProperties, Elements, RuleSet, SimRng, shuffle};
use std::ops::Range;

use super::band_positions;
use crate::world::{Cell, GridView, NeighborQueries, SimStats, cell_flags};

/// Movement updater - handles particle physics
pub struct MovementUpdater;

impl MovementUpdater {
    /// Move every mobile particle of `rows` at most once
    ///
    /// Heavier particles go first (lighter first for risers), then the ones
    /// nearest their destination; remaining ties keep a shuffled order.
    pub fn run<R: SimRng + ?Sized>(
        view: &mut GridView<'_>,
        rows: Range<i32>,
        rules: &RuleSet,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) {
        let elements = rules.elements();

        let mut movers: Vec<(IVec2, f32, i32)> = band_positions(view.width(), rows)
            .into_iter()
            .filter_map(|pos| {
                let props = elements.properties(view.get(pos).element);
                let direction = props.gravity_direction();
                (direction != 0).then(|| (pos, props.density * direction as f32, pos.y * direction))
            })
            .collect();
        shuffle(&mut movers, rng);
        movers.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.2.cmp(&a.2)));

        for (pos, _, _) in movers {
            Self::update_particle(view, pos, elements, stats, rng);
        }
    }

    /// Move the particle currently at `pos`
    ///
    /// Returns its final position if it moved.
    pub fn update_particle<R: SimRng + ?Sized>(
        view: &mut GridView<'_>,
        pos: IVec2,
        elements: &Elements,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Option<IVec2> {
        let cell = view.get(pos);
        if cell.is_empty() || cell.has_flag(cell_flags::MOVED) {
            return None;
        }
        let props = *elements.properties(cell.element);
        let direction = props.gravity_direction();
        if direction == 0 {
            return None;
        }

        let mut current = pos;
        for _ in 0..Self::vertical_steps(&props, view.rows().len(), rng) {
            // Try to move along gravity
            if let Some(next) =
                Self::try_move(view, current, IVec2::new(0, direction), &props, elements)
            {
                current = next;
                continue;
            }

            // Blocked: try to slide off diagonally (random side first)
            if props.slide > 0.0 && rng.check_probability(props.slide.min(1.0)) {
                let side = if rng.gen_bool() { -1 } else { 1 };
                let slid = NeighborQueries::diagonals(direction, side)
                    .into_iter()
                    .find_map(|offset| Self::try_move(view, current, offset, &props, elements));
                if let Some(next) = slid {
                    current = next;
                    continue;
                }
            }
            break;
        }

        // Lateral jitter, independent of the vertical outcome
        if props.spread > 0.0 && rng.check_probability(props.spread.min(1.0)) {
            let side = if rng.gen_bool() { -1 } else { 1 };
            if let Some(next) = Self::try_move(view, current, IVec2::new(side, 0), &props, elements) {
                current = next;
            }
        }

        if current == pos {
            return None;
        }
        view.set_flag(current, cell_flags::MOVED);
        stats.record_cell_moved();
        Some(current)
    }

    /// `floor(|g|)` guaranteed steps plus one with probability `frac(|g|)`
    fn vertical_steps<R: SimRng + ?Sized>(props: &ElementProperties, limit: usize, rng: &mut R) -> usize {
        let magnitude = props.gravity.abs();
        let fraction = magnitude.fract();
        let mut steps = magnitude.floor().min(limit as f32) as usize;
        if fraction > 0.0 && rng.check_probability(fraction) {
            steps += 1;
        }
        steps.min(limit)
    }

    /// Whether a particle with `mover` properties may swap into `target`
    pub fn can_displace(mover: &ElementProperties, target: Cell, elements: &Elements) -> bool {
        if target.is_empty() {
            return true;
        }
        if target.has_flag(cell_flags::MOVED) {
            return false;
        }

        let other = elements.properties(target.element);
        if !other.is_mobile() {
            return false;
        }
        match mover.gravity_direction() {
            1 => other.density < mover.density,
            -1 => other.density > mover.density,
            _ => false,
        }
    }

    /// Try to move a particle by `offset`
    /// Returns the new position if the move succeeded
    fn try_move(
        view: &mut GridView<'_>,
        from: IVec2,
        offset: IVec2,
        mover: &ElementProperties,
        elements: &Elements,
    ) -> Option<IVec2> {
        let to = view.resolve(from + offset)?;
        if to == from || !Self::can_displace(mover, view.get(to), elements) {
            return None;
        }
        view.swap(from, to);
        Some(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_rules::{id, physics_rules};
    use crate::world::{EdgeMode, Grid, TickStats};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use sandmod_simulation::{Declarations, ElementId, PropertyKey, Statement, compile};

    fn settle(grid: &mut Grid, rules: &RuleSet, ticks: usize, seed: u64) -> TickStats {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut total = TickStats::default();
        let rows = 0..grid.height() as i32;
        for _ in 0..ticks {
            grid.clear_flags(cell_flags::MOVED);
            MovementUpdater::run(&mut grid.view_mut(), rows.clone(), rules, &mut total, &mut rng);
        }
        total
    }

    #[test]
    fn test_sand_falls_one_cell_per_tick() {
        let rules = physics_rules();
        let sand = id(&rules, "Sand");
        let mut grid = Grid::new(1, 5).unwrap();
        grid.set(IVec2::new(0, 0), sand).unwrap();

        let stats = settle(&mut grid, &rules, 1, 0);
        assert_eq!(grid.get(IVec2::new(0, 1)), Some(sand));
        assert_eq!(stats.cells_moved, 1);

        settle(&mut grid, &rules, 10, 0);
        assert_eq!(grid.get(IVec2::new(0, 4)), Some(sand));
    }

    #[test]
    fn test_heavy_gravity_takes_two_steps() {
        let rules = physics_rules();
        let rock = id(&rules, "Rock");
        let mut grid = Grid::new(1, 6).unwrap();
        grid.set(IVec2::new(0, 0), rock).unwrap();

        settle(&mut grid, &rules, 1, 0);
        assert_eq!(grid.get(IVec2::new(0, 2)), Some(rock));
    }

    #[test]
    fn test_sand_sinks_through_water() {
        let rules = physics_rules();
        let sand = id(&rules, "Sand");
        let water = id(&rules, "Water");
        let mut grid = Grid::new(1, 2).unwrap();
        grid.set(IVec2::new(0, 0), sand).unwrap();
        grid.set(IVec2::new(0, 1), water).unwrap();

        settle(&mut grid, &rules, 1, 0);
        assert_eq!(grid.column(0).collect::<Vec<_>>(), vec![water, sand]);
    }

    #[test]
    fn test_water_rests_on_sand() {
        let rules = physics_rules();
        let sand = id(&rules, "Sand");
        let water = id(&rules, "Water");
        let mut grid = Grid::new(1, 2).unwrap();
        grid.set(IVec2::new(0, 0), water).unwrap();
        grid.set(IVec2::new(0, 1), sand).unwrap();

        let stats = settle(&mut grid, &rules, 20, 3);
        assert_eq!(grid.column(0).collect::<Vec<_>>(), vec![water, sand]);
        assert_eq!(stats.cells_moved, 0);
    }

    #[test]
    fn test_inert_elements_are_never_displaced() {
        let rules = physics_rules();
        let rock = id(&rules, "Rock");
        let wall = id(&rules, "Wall");
        let mut grid = Grid::new(1, 3).unwrap();
        grid.set(IVec2::new(0, 0), rock).unwrap();
        grid.set(IVec2::new(0, 1), wall).unwrap();

        settle(&mut grid, &rules, 5, 0);
        assert_eq!(grid.get(IVec2::new(0, 0)), Some(rock));
        assert_eq!(grid.get(IVec2::new(0, 1)), Some(wall));
    }

    #[test]
    fn test_steam_rises_through_water() {
        let rules = physics_rules();
        let steam = id(&rules, "Steam");
        let water = id(&rules, "Water");
        let mut grid = Grid::new(1, 3).unwrap();
        grid.set(IVec2::new(0, 1), water).unwrap();
        grid.set(IVec2::new(0, 2), steam).unwrap();

        settle(&mut grid, &rules, 3, 0);
        assert_eq!(grid.get(IVec2::new(0, 0)), Some(steam));
        assert_eq!(grid.get(IVec2::new(0, 2)), Some(water));
    }

    #[test]
    fn test_blocked_water_slides_diagonally() {
        let rules = physics_rules();
        let water = id(&rules, "Water");
        let wall = id(&rules, "Wall");
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set(IVec2::new(1, 0), water).unwrap();
        grid.set(IVec2::new(1, 1), wall).unwrap();

        settle(&mut grid, &rules, 1, 11);
        let bottom: Vec<ElementId> = grid.row(1).collect();
        assert!(bottom == vec![water, wall, ElementId::EMPTY] || bottom == vec![ElementId::EMPTY, wall, water]);
        assert_eq!(grid.get(IVec2::new(1, 0)), Some(ElementId::EMPTY));
    }

    #[test]
    fn test_wrap_lets_sliding_cross_the_edge() {
        let rules = physics_rules();
        let water = id(&rules, "Water");
        let wall = id(&rules, "Wall");
        let mut grid = Grid::with_edge_mode(2, 2, EdgeMode::Wrap).unwrap();
        grid.set(IVec2::new(0, 0), water).unwrap();
        grid.set(IVec2::new(0, 1), wall).unwrap();

        // Both diagonals of (0, 0) resolve to (1, 1) on a two-column cylinder
        settle(&mut grid, &rules, 1, 5);
        assert_eq!(grid.get(IVec2::new(1, 1)), Some(water));
    }

    #[test]
    fn test_moved_particles_are_not_displaced() {
        let rules = physics_rules();
        let water = id(&rules, "Water");
        let sand = id(&rules, "Sand");
        let mut grid = Grid::new(1, 2).unwrap();
        grid.set(IVec2::new(0, 1), water).unwrap();
        grid.view_mut().set_flag(IVec2::new(0, 1), cell_flags::MOVED);

        let sand_props = *rules.elements().properties(sand);
        let target = grid.cell(IVec2::new(0, 1)).unwrap();
        assert!(!MovementUpdater::can_displace(&sand_props, target, rules.elements()));
        assert!(MovementUpdater::can_displace(&sand_props, Cell::EMPTY, rules.elements()));
    }

    /// Floor-resting grains that differ only in spread
    fn spread_rules(spread: f32) -> RuleSet {
        let mut decls = Declarations::new();
        for (name, value) in [("Drift", spread), ("Grain", 0.0)] {
            decls.push(Statement::element(name, "#C0C0C0"));
            decls.push(Statement::property(PropertyKey::Gravity, name, 1.0));
            decls.push(Statement::property(PropertyKey::Density, name, 0.9));
            decls.push(Statement::property(PropertyKey::Spread, name, value));
        }
        compile(&decls).unwrap()
    }

    #[test]
    fn test_full_spread_steps_sideways_every_tick() {
        let rules = spread_rules(1.0);
        let drift = id(&rules, "Drift");

        for seed in 0..8 {
            let mut grid = Grid::new(5, 1).unwrap();
            grid.set(IVec2::new(2, 0), drift).unwrap();

            let stats = settle(&mut grid, &rules, 1, seed);
            assert_eq!(stats.cells_moved, 1);
            assert_ne!(grid.get(IVec2::new(2, 0)), Some(drift));
            assert_eq!(grid.count(drift), 1);
        }
    }

    #[test]
    fn test_spread_rate_matches_property() {
        let rules = spread_rules(0.3);
        let drift = id(&rules, "Drift");
        let mut grid = Grid::new(3, 1).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(31);

        let trials = 20_000;
        let mut moved = 0;
        for _ in 0..trials {
            grid.clear();
            grid.set(IVec2::new(1, 0), drift).unwrap();
            let mut stats = TickStats::default();
            MovementUpdater::run(&mut grid.view_mut(), 0..1, &rules, &mut stats, &mut rng);
            moved += stats.cells_moved;
        }

        let rate = moved as f64 / trials as f64;
        assert!((rate - 0.3).abs() < 0.02, "rate was {rate}");
    }

    #[test]
    fn test_zero_spread_never_moves_sideways() {
        let rules = spread_rules(1.0);
        let grain = id(&rules, "Grain");
        let mut grid = Grid::new(5, 1).unwrap();
        grid.set(IVec2::new(2, 0), grain).unwrap();

        let stats = settle(&mut grid, &rules, 50, 5);
        assert!(stats.is_quiet());
        assert_eq!(grid.get(IVec2::new(2, 0)), Some(grain));
    }
}
