//! Per-cell field computation from the local, social and broadcast channels.

use crate::grid::for_each_neighbor;
use crate::social_graph::SocialGraph;
use crate::state::GridView;
use propaganda_common::{BaseParameters, GlobalSignals, Side};

/// Steepness of the `tanh` shaping applied to the normalised broadcast bias.
pub const K_ALPHA: f64 = 3.0;

/// The field split by channel. `total()` is the scalar compared against thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldComponents {
    /// `w_local * local average + dm_pressure`.
    pub dm: f64,
    /// `w_social * social average + social_pressure`.
    pub social: f64,
    /// Broadcast persuasion; non-zero for undecided cells only.
    pub broadcast: f64,
}

impl FieldComponents {
    #[inline]
    pub fn total(&self) -> f64 {
        self.dm + self.social + self.broadcast
    }
}

/// Average of +1/-1/0 over the active topology neighbours of `idx` (0 if there are none).
pub fn local_influence(grid: GridView<'_>, offsets: &[(i32, i32)], idx: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for_each_neighbor(idx, grid.cols, grid.rows, offsets, |j| {
        let neighbor = &grid.cells[j];
        if neighbor.active {
            sum += neighbor.side.value();
            count += 1;
        }
        true
    });
    if count > 0 { sum / count as f64 } else { 0.0 }
}

/// Average of +1/-1/0 over the active social-graph neighbours of `idx` (0 if there are none).
pub fn social_influence(grid: GridView<'_>, graph: &SocialGraph, idx: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for &j in graph.neighbours(idx) {
        let neighbor = &grid.cells[j as usize];
        if neighbor.active {
            sum += neighbor.side.value();
            count += 1;
        }
    }
    if count > 0 { sum / count as f64 } else { 0.0 }
}

/// Persuasion an undecided cell receives from the broadcast imbalance.
pub fn broadcast_persuasion(signals: &GlobalSignals, params: &BaseParameters) -> f64 {
    if !(params.broadcast_stock_max > 0.0) {
        return 0.0;
    }
    let bias_norm = (signals.broadcast_bias() / params.broadcast_stock_max).clamp(-1.0, 1.0);
    params.broadcast_neutral_weight * (K_ALPHA * bias_norm).tanh()
}

/// Reads only the pre-step grid, so it can be shared across a parallel pass.
#[derive(Debug, Clone, Copy)]
pub struct InfluenceAggregator<'a> {
    grid: GridView<'a>,
    offsets: &'a [(i32, i32)],
    graph: &'a SocialGraph,
    signals: &'a GlobalSignals,
    params: &'a BaseParameters,
    // Identical for every undecided cell this step
    undecided_broadcast: f64,
}

impl<'a> InfluenceAggregator<'a> {
    pub fn new(
        grid: GridView<'a>,
        offsets: &'a [(i32, i32)],
        graph: &'a SocialGraph,
        signals: &'a GlobalSignals,
        params: &'a BaseParameters,
    ) -> Self {
        InfluenceAggregator {
            grid,
            offsets,
            graph,
            signals,
            params,
            undecided_broadcast: broadcast_persuasion(signals, params),
        }
    }

    /// Field value `h` of cell `idx`.
    pub fn field_at(&self, idx: usize) -> f64 {
        self.components_at(idx).total()
    }

    /// Field of cell `idx`, split by channel.
    ///
    /// For aligned cells, DM and social contributions that oppose the cell's side are
    /// scaled by `open_mind_dm` / `open_mind_social`.
    pub fn components_at(&self, idx: usize) -> FieldComponents {
        let params = self.params;
        let side = self.grid.cells[idx].side;

        let mut dm = params.w_local * local_influence(self.grid, self.offsets, idx)
            + self.signals.dm_pressure;
        let mut social = params.w_social * social_influence(self.grid, self.graph, idx)
            + self.signals.social_pressure;

        let broadcast = match side {
            Side::Undecided => self.undecided_broadcast,
            aligned => {
                let s = aligned.value();
                if s * dm < 0.0 {
                    dm *= params.open_mind_dm;
                }
                if s * social < 0.0 {
                    social *= params.open_mind_social;
                }
                0.0
            }
        };

        FieldComponents { dm, social, broadcast }
    }
}
