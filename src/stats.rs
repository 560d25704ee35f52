use crate::state::Cell;
use propaganda_common::{Side, StepStats, StepTransitions};

/// Counts, shares and per-side mean hysteresis over the active cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Census {
    pub active: u32,
    pub count_a: u32,
    pub count_b: u32,
    pub count_undecided: u32,
    pub sum_hys_a: f64,
    pub sum_hys_b: f64,
}

impl Census {
    pub fn of(cells: &[Cell]) -> Self {
        let mut census = Census::default();
        for cell in cells.iter().filter(|c| c.active) {
            census.active += 1;
            match cell.side {
                Side::A => {
                    census.count_a += 1;
                    census.sum_hys_a += cell.hysteresis;
                }
                Side::B => {
                    census.count_b += 1;
                    census.sum_hys_b += cell.hysteresis;
                }
                Side::Undecided => census.count_undecided += 1,
            }
        }
        census
    }

    /// Writes counts, shares and averages into `stats`.
    pub fn fill(&self, stats: &mut StepStats) {
        stats.active = self.active;
        stats.count_a = self.count_a;
        stats.count_b = self.count_b;
        stats.count_undecided = self.count_undecided;

        let share = |count: u32| if self.active > 0 { count as f64 / self.active as f64 } else { 0.0 };
        stats.share_a = share(self.count_a);
        stats.share_b = share(self.count_b);
        stats.share_undecided = share(self.count_undecided);

        stats.avg_hys_a = if self.count_a > 0 { self.sum_hys_a / self.count_a as f64 } else { 0.0 };
        stats.avg_hys_b = if self.count_b > 0 { self.sum_hys_b / self.count_b as f64 } else { 0.0 };
    }
}

/// Side changes between two equally sized buffers, active cells only.
pub fn count_transitions(before: &[Cell], after: &[Cell]) -> StepTransitions {
    debug_assert_eq!(before.len(), after.len());
    let mut transitions = StepTransitions::default();
    for (old, new) in before.iter().zip(after).filter(|(old, _)| old.active) {
        transitions.record(old.side, new.side);
    }
    transitions
}
