use serde::{Deserialize, Serialize};

use crate::params::BaseParameters;
use crate::side::Side;

/// Global campaign signals produced once per step and read by every cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSignals {
    /// `w_broadcast * stock_a`.
    pub broadcast_a: f64,
    /// `w_broadcast * stock_b`.
    pub broadcast_b: f64,
    /// Signed social pressure, positive favours A.
    pub social_pressure: f64,
    /// Signed direct-message pressure, positive favours A.
    pub dm_pressure: f64,
}

impl GlobalSignals {
    pub fn broadcast_bias(&self) -> f64 {
        self.broadcast_a - self.broadcast_b
    }

    /// Broadcast signal of the given side (zero for undecided).
    pub fn broadcast_for(&self, side: Side) -> f64 {
        match side {
            Side::A => self.broadcast_a,
            Side::B => self.broadcast_b,
            Side::Undecided => 0.0,
        }
    }
}

/// Campaign bookkeeping of one actor for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorCampaign {
    pub planned_cost: f64,
    /// Fraction of the plan the budget could pay for, in [0, 1].
    pub scale: f64,
    pub spent: f64,
    // Raw control sums per channel (before scaling)
    pub ctrl_broadcast: f64,
    pub ctrl_social: f64,
    pub ctrl_dm: f64,
    // Effective channel strengths (scaled, effectiveness-weighted)
    pub eff_broadcast: f64,
    pub eff_social: f64,
    pub eff_dm: f64,
    /// Broadcast stock after this step's decay and top-up.
    pub stock: f64,
}

/// Campaign diagnostics for both actors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignDiag {
    pub a: ActorCampaign,
    pub b: ActorCampaign,
}

/// Side changes observed during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTransitions {
    pub undecided_to_a: u32,
    pub undecided_to_b: u32,
    pub a_to_b: u32,
    pub b_to_a: u32,
    pub a_to_undecided: u32,
    pub b_to_undecided: u32,
}

impl StepTransitions {
    pub fn record(&mut self, from: Side, to: Side) {
        match (from, to) {
            (Side::Undecided, Side::A) => self.undecided_to_a += 1,
            (Side::Undecided, Side::B) => self.undecided_to_b += 1,
            (Side::A, Side::B) => self.a_to_b += 1,
            (Side::B, Side::A) => self.b_to_a += 1,
            (Side::A, Side::Undecided) => self.a_to_undecided += 1,
            (Side::B, Side::Undecided) => self.b_to_undecided += 1,
            _ => {} // No change
        }
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &StepTransitions) {
        self.undecided_to_a += other.undecided_to_a;
        self.undecided_to_b += other.undecided_to_b;
        self.a_to_b += other.a_to_b;
        self.b_to_a += other.b_to_a;
        self.a_to_undecided += other.a_to_undecided;
        self.b_to_undecided += other.b_to_undecided;
    }

    pub fn total(&self) -> u32 {
        self.undecided_to_a
            + self.undecided_to_b
            + self.a_to_b
            + self.b_to_a
            + self.a_to_undecided
            + self.b_to_undecided
    }
}

/// Aggregate state of the simulation after one step. This is what the stats/export
/// collaborators consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub iteration: u64,
    pub active: u32,
    pub count_a: u32,
    pub count_b: u32,
    pub count_undecided: u32,
    pub share_a: f64,
    pub share_b: f64,
    pub share_undecided: f64,
    pub avg_hys_a: f64,
    pub avg_hys_b: f64,
    pub transitions: StepTransitions,
    pub campaign: CampaignDiag,
    pub signals: GlobalSignals,
    /// Budgets after this step's spend.
    pub budget_a: f64,
    pub budget_b: f64,
    /// Parameter values used for this step.
    pub params: BaseParameters,
}

/// Column names matching [`StepStats::csv_record`].
pub const STEP_STATS_CSV_HEADER: &[&str] = &[
    "iter", "active", "countA", "countB", "countN", "shareA", "shareB", "shareN",
    "avgHysA", "avgHysB",
    "N_to_A", "N_to_B", "A_to_B", "B_to_A",
    "budgetA", "budgetB", "plannedCostA", "plannedCostB", "scaleA", "scaleB", "spentA", "spentB",
    "ctrlA_broadcast", "ctrlB_broadcast", "ctrlA_dm", "ctrlB_dm", "ctrlA_social", "ctrlB_social",
    "effA_broadcast", "effB_broadcast", "effA_dm", "effB_dm", "effA_social", "effB_social",
    "stockA", "stockB", "broadcastA", "broadcastB", "broadcastBias", "dmPressure", "socialPressure",
    "wLocal", "thetaScale", "margin", "wDM", "wBroadcast", "wSocial", "switchKappa", "hysDecay",
    "hysMaxTotal", "broadcastDecay", "broadcastStockMax", "broadcastHysGain", "broadcastNeutralWeight",
];

impl StepStats {
    /// Flat row for CSV export, in [`STEP_STATS_CSV_HEADER`] order.
    pub fn csv_record(&self) -> Vec<String> {
        let (a, b) = (&self.campaign.a, &self.campaign.b);
        let p = &self.params;
        let mut row = vec![
            self.iteration.to_string(),
            self.active.to_string(),
            self.count_a.to_string(),
            self.count_b.to_string(),
            self.count_undecided.to_string(),
        ];
        row.extend(
            [
                self.share_a, self.share_b, self.share_undecided, self.avg_hys_a, self.avg_hys_b,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        row.extend(
            [
                self.transitions.undecided_to_a,
                self.transitions.undecided_to_b,
                self.transitions.a_to_b,
                self.transitions.b_to_a,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        row.extend(
            [
                self.budget_a, self.budget_b,
                a.planned_cost, b.planned_cost, a.scale, b.scale, a.spent, b.spent,
                a.ctrl_broadcast, b.ctrl_broadcast, a.ctrl_dm, b.ctrl_dm, a.ctrl_social, b.ctrl_social,
                a.eff_broadcast, b.eff_broadcast, a.eff_dm, b.eff_dm, a.eff_social, b.eff_social,
                a.stock, b.stock,
                self.signals.broadcast_a, self.signals.broadcast_b, self.signals.broadcast_bias(),
                self.signals.dm_pressure, self.signals.social_pressure,
                p.w_local, p.theta_scale, p.margin, p.w_dm, p.w_broadcast, p.w_social,
                p.switch_kappa, p.hys_decay, p.hys_max_total,
                p.broadcast_decay, p.broadcast_stock_max, p.broadcast_hys_gain,
                p.broadcast_neutral_weight,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        row
    }
}
