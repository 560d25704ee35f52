use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Process-wide tunables shared by every stage of a step.
/// Hot-swappable: replacing them never invalidates the grid or the social graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseParameters {
    // --- Channel trust weights ---
    /// Weight of the local (neighbourhood) average.
    pub w_local: f64,
    /// Weight applied to each actor's broadcast stock.
    pub w_broadcast: f64,
    /// Weight of the social-graph average and of the social campaign pressure.
    pub w_social: f64,
    /// Weight of the direct-message campaign pressure.
    pub w_dm: f64,

    // --- Decision shape ---
    /// Multiplier on every cell's own threshold.
    pub theta_scale: f64,
    /// Dead zone added to the threshold so exact ties never flip a cell.
    pub margin: f64,

    // --- Hysteresis dynamics ---
    /// How strongly accumulated hysteresis inflates the switching threshold.
    pub switch_kappa: f64,
    /// Growth per step while an aligned cell's field favours its side.
    pub hys_grow: f64,
    /// Decay per step while a cell is undecided.
    pub hys_decay: f64,
    /// Global upper bound on hysteresis.
    pub hys_max_total: f64,

    // --- Broadcast stock dynamics ---
    /// Fraction of each broadcast stock lost per step.
    pub broadcast_decay: f64,
    pub broadcast_stock_max: f64,
    /// Hysteresis gained per unit of own-side broadcast signal.
    pub broadcast_hys_gain: f64,
    /// Broadcast reinforcement never lifts hysteresis past this value.
    pub broadcast_hys_max: f64,
    /// How strongly the broadcast bias persuades undecided cells.
    pub broadcast_neutral_weight: f64,

    // --- Open-mindedness (1.0 = opposing views pass unfiltered) ---
    pub open_mind_dm: f64,
    pub open_mind_social: f64,

    // --- Per-channel hysteresis gain/erode, scaled by |channel contribution| ---
    pub dm_hys_gain: f64,
    pub dm_hys_erode: f64,
    pub social_hys_gain: f64,
    pub social_hys_erode: f64,
}

impl Default for BaseParameters {
    fn default() -> Self {
        BaseParameters {
            w_local: 0.0,
            w_broadcast: 0.0,
            w_social: 0.0,
            w_dm: 0.0,
            theta_scale: 0.2,
            margin: 0.0,
            switch_kappa: 0.5,
            hys_grow: 0.02,
            hys_decay: 0.01,
            hys_max_total: 2.0,
            broadcast_decay: 0.02,
            broadcast_stock_max: 1.0,
            broadcast_hys_gain: 0.02,
            broadcast_hys_max: 2.0,
            broadcast_neutral_weight: 0.2,
            open_mind_dm: 1.0,
            open_mind_social: 1.0,
            dm_hys_gain: 0.0,
            dm_hys_erode: 0.0,
            social_hys_gain: 0.0,
            social_hys_erode: 0.0,
        }
    }
}

impl BaseParameters {
    /// "Scenario 1": a balanced preset where every channel matters and cells are
    /// moderately open-minded.
    pub fn scenario_one() -> Self {
        BaseParameters {
            w_local: 0.55,
            w_broadcast: 0.35,
            w_social: 0.12,
            w_dm: 0.30,
            theta_scale: 1.30,
            margin: 0.06,
            switch_kappa: 0.25,
            hys_grow: 0.02,
            hys_decay: 0.020,
            hys_max_total: 1.40,
            broadcast_decay: 0.015,
            broadcast_stock_max: 1.60,
            broadcast_hys_gain: 0.010,
            broadcast_hys_max: 1.40,
            broadcast_neutral_weight: 0.30,
            open_mind_dm: 0.55,
            open_mind_social: 0.60,
            dm_hys_gain: 0.030,
            dm_hys_erode: 0.020,
            social_hys_gain: 0.020,
            social_hys_erode: 0.015,
        }
    }

    /// Rejects values the engine cannot interpret (negative rates, NaN, empty stock range, ...).
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("w_local", self.w_local),
            ("w_broadcast", self.w_broadcast),
            ("w_social", self.w_social),
            ("w_dm", self.w_dm),
            ("theta_scale", self.theta_scale),
            ("margin", self.margin),
            ("switch_kappa", self.switch_kappa),
            ("hys_grow", self.hys_grow),
            ("hys_decay", self.hys_decay),
            ("hys_max_total", self.hys_max_total),
            ("broadcast_hys_gain", self.broadcast_hys_gain),
            ("broadcast_hys_max", self.broadcast_hys_max),
            ("broadcast_neutral_weight", self.broadcast_neutral_weight),
            ("dm_hys_gain", self.dm_hys_gain),
            ("dm_hys_erode", self.dm_hys_erode),
            ("social_hys_gain", self.social_hys_gain),
            ("social_hys_erode", self.social_hys_erode),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Parameter {} must be a finite non-negative number (got {}).", name, value);
            }
        }

        let unit_interval = [
            ("broadcast_decay", self.broadcast_decay),
            ("open_mind_dm", self.open_mind_dm),
            ("open_mind_social", self.open_mind_social),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("Parameter {} must lie in [0, 1] (got {}).", name, value);
            }
        }

        if !(self.broadcast_stock_max.is_finite() && self.broadcast_stock_max > 0.0) {
            anyhow::bail!(
                "broadcast_stock_max must be positive (got {}).",
                self.broadcast_stock_max
            );
        }
        Ok(())
    }
}
