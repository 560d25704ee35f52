// Row-major indexing and toroidal neighbour iteration over a cols x rows grid.

/// Row-major index of `(x, y)`. Callers are responsible for bounds.
#[inline(always)]
pub fn cell_index(x: u32, y: u32, cols: u32) -> usize {
    y as usize * cols as usize + x as usize
}

/// Inverse of [`cell_index`].
#[inline(always)]
pub fn cell_coords(idx: usize, cols: u32) -> (u32, u32) {
    let cols = cols as usize;
    ((idx % cols) as u32, (idx / cols) as u32)
}

/// Index of `(x + dx, y + dy)` with toroidal wraparound. Edges are never rejected.
#[inline(always)]
pub fn wrapped_index(x: u32, y: u32, dx: i32, dy: i32, cols: u32, rows: u32) -> usize {
    let nx = (x as i64 + dx as i64).rem_euclid(cols as i64) as u32;
    let ny = (y as i64 + dy as i64).rem_euclid(rows as i64) as u32;
    cell_index(nx, ny, cols)
}

/// Calls `f` with the wrapped index of every neighbour of `idx` implied by `offsets`.
/// A wrapped offset landing back on `idx` itself (1-wide or 1-tall grids) is skipped.
/// `f` returns `false` to stop early.
#[inline(always)]
pub fn for_each_neighbor<F>(idx: usize, cols: u32, rows: u32, offsets: &[(i32, i32)], mut f: F)
where
    F: FnMut(usize) -> bool,
{
    if cols == 0 || rows == 0 { return; } // Degenerate grid, nothing to visit

    let (x, y) = cell_coords(idx, cols);
    for &(dx, dy) in offsets {
        let neighbor_idx = wrapped_index(x, y, dx, dy, cols, rows);
        if neighbor_idx == idx { continue; }
        if !f(neighbor_idx) { return; } // Stop if closure returns false
    }
}
