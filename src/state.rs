//! Cell state and the double-buffered grid that owns it.

use crate::grid::cell_index;
use anyhow::Result;
use propaganda_common::Side;

/// Threshold every cell starts with before seeding re-randomizes it.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// One grid position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub side: Side,
    /// Inactive cells never update and never influence anyone.
    pub active: bool,
    /// Per-cell susceptibility, fixed between reseeds.
    pub threshold: f64,
    /// Accumulated resistance to switching, `>= 0`.
    pub hysteresis: f64,
    /// Opaque tag supplied by the map collaborator.
    pub region: Option<u8>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            side: Side::Undecided,
            active: true,
            threshold: DEFAULT_THRESHOLD,
            hysteresis: 0.0,
            region: None,
        }
    }
}

/// Per-cell activity flags and region tags supplied by the map collaborator.
/// Both vectors use the grid's row-major indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    pub active: Vec<bool>,
    pub region_tags: Vec<Option<u8>>,
}

impl RegionMask {
    /// Builds a mask by evaluating `f(x, y) -> (active, tag)` for every cell.
    pub fn from_fn<F>(cols: u32, rows: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> (bool, Option<u8>),
    {
        let len = cols as usize * rows as usize;
        let mut active = Vec::with_capacity(len);
        let mut region_tags = Vec::with_capacity(len);
        for y in 0..rows {
            for x in 0..cols {
                let (on, tag) = f(x, y);
                active.push(on);
                region_tags.push(tag);
            }
        }
        RegionMask { active, region_tags }
    }
}

/// Read-only view of the authoritative buffer, handed to the per-cell pass.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    pub cells: &'a [Cell],
    pub cols: u32,
    pub rows: u32,
}

/// Holds the double-buffered cell grid.
#[derive(Debug)] // No Clone: the grid can be large
pub struct GridState {
    cols: u32,
    rows: u32,

    // --- Ping-Pong Buffers ---
    // Authoritative state between steps
    current: Vec<Cell>,
    // Scratch buffer written during a step
    next: Vec<Cell>,
}

impl GridState {
    /// Allocates both buffers with default (undecided, active) cells.
    pub fn new(cols: u32, rows: u32) -> Self {
        let len = cols as usize * rows as usize;
        GridState {
            cols,
            rows,
            current: vec![Cell::default(); len],
            next: vec![Cell::default(); len],
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Row-major index of `(x, y)`.
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid. Coordinates are never wrapped or clamped here.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.cols && y < self.rows,
            "cell ({}, {}) out of range for a {}x{} grid",
            x, y, self.cols, self.rows
        );
        cell_index(x, y, self.cols)
    }

    pub fn cell(&self, x: u32, y: u32) -> &Cell {
        &self.current[self.index(x, y)]
    }

    pub fn cell_mut(&mut self, x: u32, y: u32) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.current[idx]
    }

    /// Non-panicking lookup for hit-testing.
    pub fn try_cell(&self, x: u32, y: u32) -> Option<&Cell> {
        if x < self.cols && y < self.rows {
            self.current.get(cell_index(x, y, self.cols))
        } else {
            None
        }
    }

    /// The authoritative buffer.
    pub fn cells(&self) -> &[Cell] {
        &self.current
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.current
    }

    pub fn view(&self) -> GridView<'_> {
        GridView { cells: &self.current, cols: self.cols, rows: self.rows }
    }

    /// Splits the grid into the read-only current buffer and the writable next buffer.
    pub fn split_for_step(&mut self) -> (GridView<'_>, &mut [Cell]) {
        let view = GridView { cells: &self.current, cols: self.cols, rows: self.rows };
        (view, &mut self.next)
    }

    /// Exchanges the buffers: the freshly written next buffer becomes authoritative.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Indices of every active cell, in row-major order.
    pub fn active_indices(&self) -> Vec<usize> {
        self.current
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.current.iter().filter(|c| c.active).count()
    }

    /// Returns every cell to undecided with default threshold and no hysteresis.
    /// Activity flags and region tags are kept.
    pub fn clear_cells(&mut self) {
        for cell in self.current.iter_mut().chain(self.next.iter_mut()) {
            *cell = Cell { active: cell.active, region: cell.region, ..Cell::default() };
        }
    }

    /// Applies an activity mask and region tags. Cells that become inactive are
    /// reset to undecided with zero hysteresis.
    pub fn apply_mask(&mut self, mask: &RegionMask) -> Result<()> {
        let len = self.len();
        if mask.active.len() != len || mask.region_tags.len() != len {
            anyhow::bail!(
                "Region mask size mismatch: grid is {}x{} ({} cells) but mask has {} activity flags and {} region tags.",
                self.cols, self.rows, len, mask.active.len(), mask.region_tags.len()
            );
        }
        for ((cell, &active), &tag) in self.current.iter_mut().zip(&mask.active).zip(&mask.region_tags) {
            cell.active = active;
            cell.region = tag;
            if !active {
                cell.side = Side::Undecided;
                cell.hysteresis = 0.0;
            }
        }
        self.next.copy_from_slice(&self.current);
        Ok(())
    }

    /// Marks every cell active and drops region tags.
    pub fn clear_mask(&mut self) {
        for cell in self.current.iter_mut().chain(self.next.iter_mut()) {
            cell.active = true;
            cell.region = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_undecided_and_active() {
        let state = GridState::new(4, 3);
        assert_eq!(state.len(), 12);
        assert!(state.cells().iter().all(|c| *c == Cell::default()));
        assert_eq!(state.active_count(), 12);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_access_panics() {
        let state = GridState::new(4, 3);
        let _ = state.cell(4, 0);
    }

    #[test]
    fn try_cell_returns_none_outside() {
        let state = GridState::new(4, 3);
        assert!(state.try_cell(3, 2).is_some());
        assert!(state.try_cell(0, 3).is_none());
    }

    #[test]
    fn swap_exchanges_storage() {
        let mut state = GridState::new(2, 2);
        {
            let (_, next) = state.split_for_step();
            next[3].side = Side::B;
        }
        let next_ptr = state.next.as_ptr();
        state.swap_buffers();
        assert_eq!(state.cell(1, 1).side, Side::B);
        assert_eq!(state.cells().as_ptr(), next_ptr);
        assert_eq!(state.current.len(), state.next.len());
    }

    #[test]
    fn mask_deactivates_and_clears_cells() {
        let mut state = GridState::new(3, 1);
        state.cell_mut(0, 0).side = Side::A;
        state.cell_mut(0, 0).hysteresis = 1.0;
        let mask = RegionMask::from_fn(3, 1, |x, _| (x != 0, Some(x as u8)));
        state.apply_mask(&mask).unwrap();

        let first = state.cell(0, 0);
        assert!(!first.active);
        assert_eq!(first.side, Side::Undecided);
        assert_eq!(first.hysteresis, 0.0);
        assert_eq!(state.cell(2, 0).region, Some(2));
        assert_eq!(state.active_indices(), vec![1, 2]);

        state.clear_mask();
        assert_eq!(state.active_count(), 3);
        assert_eq!(state.cell(2, 0).region, None);
    }

    #[test]
    fn mask_with_wrong_size_is_rejected() {
        let mut state = GridState::new(3, 3);
        let mask = RegionMask { active: vec![true; 8], region_tags: vec![None; 9] };
        let err = state.apply_mask(&mask).unwrap_err();
        assert!(err.to_string().contains("size mismatch"));
    }

    #[test]
    fn clear_cells_keeps_mask() {
        let mut state = GridState::new(2, 1);
        let mask = RegionMask::from_fn(2, 1, |x, _| (x == 1, Some(7)));
        state.apply_mask(&mask).unwrap();
        state.cell_mut(1, 0).side = Side::B;
        state.cell_mut(1, 0).threshold = 0.9;
        state.clear_cells();
        let cell = state.cell(1, 0);
        assert_eq!(cell.side, Side::Undecided);
        assert_eq!(cell.threshold, DEFAULT_THRESHOLD);
        assert_eq!(cell.region, Some(7));
        assert!(!state.cell(0, 0).active);
    }
}
