use crate::grid::for_each_neighbor;
use crate::state::GridView;
use rand::Rng;

/// Undirected small-world graph over the grid's cells.
///
/// One adjacency list per cell index; inactive cells keep an empty list.
/// No self edges, no duplicate edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialGraph {
    adjacency: Vec<Vec<u32>>,
}

impl SocialGraph {
    /// A graph with `len` isolated nodes.
    pub fn empty(len: usize) -> Self {
        SocialGraph { adjacency: vec![Vec::new(); len] }
    }

    /// Builds the graph Watts–Strogatz style.
    ///
    /// Every active cell `i` links to each topology neighbour `j` (toroidal wrap). With
    /// probability `rewiring_probability` the target is replaced by a uniformly random
    /// active cell other than `i`. Inactive targets are dropped.
    pub fn build<R: Rng + ?Sized>(
        grid: GridView<'_>,
        offsets: &[(i32, i32)],
        rewiring_probability: f64,
        rng: &mut R,
    ) -> Self {
        let mut graph = SocialGraph::empty(grid.cells.len());
        let p = rewiring_probability.clamp(0.0, 1.0);

        let active: Vec<u32> = grid
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active)
            .map(|(i, _)| i as u32)
            .collect();
        // Rewiring needs at least one other active cell to land on.
        let can_rewire = active.len() >= 2;

        let mut targets = Vec::with_capacity(offsets.len());
        for &i in &active {
            let i = i as usize;
            targets.clear();
            for_each_neighbor(i, grid.cols, grid.rows, offsets, |j| {
                targets.push(j);
                true
            });

            for &j in &targets {
                let target = if can_rewire && p > 0.0 && rng.random_bool(p) {
                    random_other(&active, i, rng)
                } else if grid.cells[j].active {
                    j
                } else {
                    continue;
                };
                graph.insert_edge(i, target);
            }
        }
        graph
    }

    fn insert_edge(&mut self, a: usize, b: usize) {
        if a == b || self.adjacency[a].contains(&(b as u32)) {
            return;
        }
        self.adjacency[a].push(b as u32);
        self.adjacency[b].push(a as u32);
    }

    /// Social neighbours of cell `idx`.
    pub fn neighbours(&self, idx: usize) -> &[u32] {
        &self.adjacency[idx]
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(a).is_some_and(|list| list.contains(&(b as u32)))
    }

    /// Number of nodes (equals the grid's cell count).
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}

// Draws until it hits an active cell other than `exclude`; `active` holds at least two cells.
fn random_other<R: Rng + ?Sized>(active: &[u32], exclude: usize, rng: &mut R) -> usize {
    loop {
        let candidate = active[rng.random_range(0..active.len())] as usize;
        if candidate != exclude {
            return candidate;
        }
    }
}
