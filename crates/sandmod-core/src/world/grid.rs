//! The simulation grid
//!
//! Row-major storage, row 0 at the top. Positive gravity moves particles
//! toward larger row indices.

use glam::IVec2;
use sandmod_simulation::{ElementId, Elements};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

use super::cell::Cell;
use super::snapshot::GridSnapshot;
use super::view::GridView;

/// Behavior of the left and right grid edges (top and bottom are always walls)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMode {
    /// Edges are immovable walls
    #[default]
    Wall,
    /// Columns wrap around (cylinder)
    Wrap,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("failed to allocate {cells} cells")]
    Allocation { cells: usize },

    #[error("position ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("unknown element `{0}`")]
    UnknownElement(String),
}

/// Fixed-size 2D grid of cells
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    edge: EdgeMode,
    tick: u64,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid with wall edges
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::with_edge_mode(width, height, EdgeMode::Wall)
    }

    pub fn with_edge_mode(width: usize, height: usize, edge: EdgeMode) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions { width, height };
        // Cell indices are computed in i32 inside views
        let len = width
            .checked_mul(height)
            .filter(|&len| width > 0 && height > 0 && len <= i32::MAX as usize)
            .ok_or(invalid)?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| GridError::Allocation { cells: len })?;
        cells.resize(len, Cell::EMPTY);

        Ok(Self {
            width,
            height,
            edge,
            tick: 0,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn edge_mode(&self) -> EdgeMode {
        self.edge
    }

    pub fn set_edge_mode(&mut self, edge: EdgeMode) {
        self.edge = edge;
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: IVec2) -> Result<usize, GridError> {
        if !self.in_bounds(pos) {
            return Err(GridError::OutOfBounds { x: pos.x, y: pos.y });
        }
        Ok(pos.y as usize * self.width + pos.x as usize)
    }

    pub fn cell(&self, pos: IVec2) -> Option<Cell> {
        self.index(pos).ok().map(|i| self.cells[i])
    }

    /// Element at `pos`, `None` outside the grid
    pub fn get(&self, pos: IVec2) -> Option<ElementId> {
        self.cell(pos).map(|c| c.element)
    }

    pub fn set(&mut self, pos: IVec2, element: ElementId) -> Result<(), GridError> {
        let index = self.index(pos)?;
        self.cells[index] = Cell::new(element);
        Ok(())
    }

    /// Place an element by name
    pub fn paint(&mut self, pos: IVec2, name: &str, elements: &Elements) -> Result<(), GridError> {
        let element = elements
            .id_of(name)
            .ok_or_else(|| GridError::UnknownElement(name.to_string()))?;
        self.set(pos, element)
    }

    /// Fill the rectangle starting at `min` with the given size
    ///
    /// Fails without painting anything if the rectangle leaves the grid.
    pub fn fill_rect(&mut self, min: IVec2, size: IVec2, element: ElementId) -> Result<(), GridError> {
        if size.x <= 0 || size.y <= 0 {
            return Ok(());
        }
        let max = min + size - IVec2::ONE;
        for corner in [min, max] {
            self.index(corner)?;
        }
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let index = y as usize * self.width + x as usize;
                self.cells[index] = Cell::new(element);
            }
        }
        Ok(())
    }

    pub fn fill_row(&mut self, y: i32, element: ElementId) -> Result<(), GridError> {
        self.fill_rect(IVec2::new(0, y), IVec2::new(self.width as i32, 1), element)
    }

    /// Reset every cell to Empty
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    pub fn count(&self, element: ElementId) -> usize {
        self.cells.iter().filter(|c| c.element == element).count()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Elements of one row, left to right
    pub fn row(&self, y: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.cells[y * self.width..(y + 1) * self.width]
            .iter()
            .map(|c| c.element)
    }

    /// Elements of one column, top to bottom
    pub fn column(&self, x: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.cells
            .iter()
            .skip(x)
            .step_by(self.width)
            .map(|c| c.element)
    }

    pub(crate) fn clear_flags(&mut self, flag: u8) {
        for cell in &mut self.cells {
            cell.flags &= !flag;
        }
    }

    /// Window over the whole grid
    pub fn view_mut(&mut self) -> GridView<'_> {
        GridView::new(&mut self.cells, self.width, self.height, 0, self.edge)
    }

    /// Split the grid into disjoint windows, one per row range
    ///
    /// Ranges must be sorted, non-overlapping and inside the grid.
    pub(crate) fn windows_mut(&mut self, windows: &[Range<usize>]) -> Vec<GridView<'_>> {
        let (width, height, edge) = (self.width, self.height, self.edge);
        let mut rest: &mut [Cell] = &mut self.cells;
        let mut consumed = 0;
        let mut views = Vec::with_capacity(windows.len());

        for window in windows {
            debug_assert!(window.start >= consumed && window.end <= height);
            let (_, tail) = std::mem::take(&mut rest).split_at_mut((window.start - consumed) * width);
            let (head, tail) = tail.split_at_mut((window.end - window.start) * width);
            views.push(GridView::new(head, width, height, window.start, edge));
            rest = tail;
            consumed = window.end;
        }
        views
    }

    /// Copy the grid into a renderer-friendly snapshot
    pub fn snapshot(&self, elements: &Elements) -> GridSnapshot {
        GridSnapshot {
            width: self.width as u32,
            height: self.height as u32,
            tick: self.tick,
            palette: elements.names(),
            cells: self.cells.iter().map(|c| c.element.0).collect(),
        }
    }

    /// Rebuild a grid from a snapshot, mapping palette names onto `elements`
    pub fn from_snapshot(snapshot: &GridSnapshot, elements: &Elements) -> Result<Self, GridError> {
        let (width, height) = (snapshot.width as usize, snapshot.height as usize);
        let mut grid = Self::new(width, height)?;
        if snapshot.cells.len() != width * height {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let mapping = snapshot
            .palette
            .iter()
            .map(|name| {
                elements
                    .id_of(name)
                    .ok_or_else(|| GridError::UnknownElement(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (cell, raw) in grid.cells.iter_mut().zip(&snapshot.cells) {
            let element = mapping
                .get(*raw as usize)
                .copied()
                .ok_or_else(|| GridError::UnknownElement(format!("#{raw}")))?;
            *cell = Cell::new(element);
        }
        grid.tick = snapshot.tick;
        Ok(grid)
    }
}
