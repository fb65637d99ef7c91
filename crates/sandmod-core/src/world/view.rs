//! Mutable window over a contiguous range of grid rows
//!
//! The sequential stepper works on a window covering the whole grid; the
//! parallel stepper hands every band worker a window made of its own rows plus
//! one guard row on each side. Positions are always absolute grid coordinates.

use glam::IVec2;
use sandmod_simulation::ElementId;
use std::ops::Range;

use super::cell::Cell;
use super::grid::EdgeMode;

pub struct GridView<'a> {
    cells: &'a mut [Cell],
    width: i32,
    height: i32,
    first_row: i32,
    rows: i32,
    edge: EdgeMode,
}

impl<'a> GridView<'a> {
    pub(crate) fn new(
        cells: &'a mut [Cell],
        width: usize,
        height: usize,
        first_row: usize,
        edge: EdgeMode,
    ) -> Self {
        let rows = (cells.len() / width.max(1)) as i32;
        Self {
            cells,
            width: width as i32,
            height: height as i32,
            first_row: first_row as i32,
            rows,
            edge,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Absolute rows covered by this window
    pub fn rows(&self) -> Range<i32> {
        self.first_row..self.first_row + self.rows
    }

    /// Apply the edge rules to `pos`
    ///
    /// Returns `None` for the walls above and below the grid, for the side
    /// walls in [`EdgeMode::Wall`], and for rows outside this window.
    pub fn resolve(&self, pos: IVec2) -> Option<IVec2> {
        if pos.y < 0 || pos.y >= self.height {
            return None;
        }
        let x = match self.edge {
            EdgeMode::Wall => {
                if pos.x < 0 || pos.x >= self.width {
                    return None;
                }
                pos.x
            }
            EdgeMode::Wrap => pos.x.rem_euclid(self.width),
        };
        if !self.rows().contains(&pos.y) {
            return None;
        }
        Some(IVec2::new(x, pos.y))
    }

    fn index(&self, pos: IVec2) -> usize {
        ((pos.y - self.first_row) * self.width + pos.x) as usize
    }

    /// Cell at a position previously returned by [`resolve`](Self::resolve)
    pub fn get(&self, pos: IVec2) -> Cell {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: IVec2, cell: Cell) {
        let index = self.index(pos);
        self.cells[index] = cell;
    }

    pub fn set_flag(&mut self, pos: IVec2, flag: u8) {
        let index = self.index(pos);
        self.cells[index].flags |= flag;
    }

    pub fn swap(&mut self, a: IVec2, b: IVec2) {
        let (a, b) = (self.index(a), self.index(b));
        self.cells.swap(a, b);
    }

    /// Element at an unresolved position, `None` outside the window
    pub fn element_at(&self, pos: IVec2) -> Option<ElementId> {
        self.resolve(pos).map(|p| self.get(p).element)
    }
}
