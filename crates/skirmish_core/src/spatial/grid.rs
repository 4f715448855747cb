//! # Spatial Grid
//!
//! Uniform grid over the field. Each cell holds the slots whose position
//! falls inside it. The grid is cleared and refilled every tick and never
//! updated incrementally.

use crate::ecs::{Slot, UnitStore};

/// Dense bucket grid for neighbour queries.
///
/// Cell coordinates are clamped into the grid on both insert and query.
/// Clamping is monotone and never widens a gap, so a query still reaches
/// every unit within `radius` even for positions outside the field.
///
/// # Performance
///
/// - **Insert:** O(1) amortized
/// - **Query:** O(k) where k = slots in the covered cells
/// - **Clear:** O(cells), bucket allocations are kept
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    /// Creates a grid covering `width x height` with square cells.
    #[must_use]
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    /// Cell edge length.
    #[inline]
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total slot entries across all cells.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Number of cells holding at least one slot.
    #[must_use]
    pub fn non_empty_cells(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    #[inline]
    fn axis_cell(&self, value: f32, cells: usize) -> usize {
        let raw = (value / self.cell_size).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(cells - 1)
        }
    }

    /// Cell `(col, row)` containing `(x, y)`, clamped into the grid.
    #[inline]
    #[must_use]
    pub fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        (self.axis_cell(x, self.cols), self.axis_cell(y, self.rows))
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Adds `slot` to the cell containing `(x, y)`.
    pub fn insert(&mut self, slot: Slot, x: f32, y: f32) {
        let (col, row) = self.cell_of(x, y);
        self.cells[row * self.cols + col].push(slot.raw());
    }

    /// Writes every slot in the cells that could lie within `radius` of
    /// `(x, y)` into `out` (cleared first).
    ///
    /// The result is a superset: callers re-check the exact distance.
    /// Order follows cells, not slot index.
    pub fn query_into(&self, x: f32, y: f32, radius: f32, out: &mut Vec<u32>) {
        out.clear();
        let reach = (radius / self.cell_size).ceil().max(0.0) as usize;
        let (col, row) = self.cell_of(x, y);
        let col_range = col.saturating_sub(reach)..=(col + reach).min(self.cols - 1);
        for r in row.saturating_sub(reach)..=(row + reach).min(self.rows - 1) {
            let base = r * self.cols;
            for c in col_range.clone() {
                out.extend_from_slice(&self.cells[base + c]);
            }
        }
    }

    /// Clears the grid and inserts every live (active, non-dead) unit.
    pub fn rebuild(&mut self, store: &UnitStore) {
        self.clear();
        let positions = store.positions();
        for slot in store.iter_live() {
            let p = positions[slot.index()];
            self.insert(slot, p.x, p.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Team, UnitSpawn};

    #[test]
    fn test_dimensions() {
        let grid = SpatialGrid::new(64.0, 30.0, 5.0);
        assert_eq!(grid.cols(), 13);
        assert_eq!(grid.rows(), 6);
        assert_eq!(grid.cell_of(63.9, 29.9), (12, 5));
        assert_eq!(grid.cell_of(-4.0, 100.0), (0, 5));
    }

    #[test]
    fn test_query_finds_neighbours_across_cells() {
        let mut grid = SpatialGrid::new(20.0, 20.0, 5.0);
        grid.insert(Slot::new(0), 4.9, 4.9);
        grid.insert(Slot::new(1), 5.1, 5.1);
        grid.insert(Slot::new(2), 19.0, 19.0);

        let mut out = Vec::new();
        grid.query_into(4.9, 4.9, 1.5, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_query_never_misses_outside_field() {
        let mut grid = SpatialGrid::new(10.0, 10.0, 2.0);
        grid.insert(Slot::new(7), -1.0, 0.0);
        let mut out = Vec::new();
        grid.query_into(0.4, 0.0, 1.5, &mut out);
        assert!(out.contains(&7));
    }

    #[test]
    fn test_rebuild_skips_dead_and_clears_stale() {
        let mut store = UnitStore::new(4);
        let a = store.allocate("a", UnitSpawn::new(1.0, 1.0, Team::Friendly));
        let b = store.allocate("b", UnitSpawn::new(2.0, 1.0, Team::Hostile));
        let mut grid = SpatialGrid::new(10.0, 10.0, 5.0);
        grid.rebuild(&store);
        assert_eq!(grid.total_entries(), 2);

        store.mark_dead(b);
        grid.rebuild(&store);
        let mut out = Vec::new();
        grid.query_into(1.0, 1.0, 5.0, &mut out);
        assert_eq!(out, vec![a.raw()]);
        assert_eq!(grid.non_empty_cells(), 1);
    }
}
