//! Campaign/budget engine: turns each actor's control intensities into spend and
//! per-channel signals, and keeps the decaying broadcast stocks.

use log::{debug, warn};
use propaganda_common::{
    ActorCampaign, BaseParameters, CampaignDiag, Channel, GlobalSignals, Player, Tier,
};

/// Effectiveness per unit of intensity. Black propaganda hits hardest (and costs most).
pub const EFF_WHITE: f64 = 1.0;
pub const EFF_GREY: f64 = 1.2;
pub const EFF_BLACK: f64 = 1.5;

#[inline]
pub fn tier_effectiveness(tier: Tier) -> f64 {
    match tier {
        Tier::White => EFF_WHITE,
        Tier::Grey => EFF_GREY,
        Tier::Black => EFF_BLACK,
    }
}

/// Fraction of `planned_cost` the budget can pay for, in [0, 1].
pub fn spend_scale(budget: f64, planned_cost: f64) -> f64 {
    if !(planned_cost > 0.0) || !(budget > 0.0) {
        0.0
    } else if budget >= planned_cost {
        1.0
    } else {
        (budget / planned_cost).clamp(0.0, 1.0)
    }
}

/// Per-actor decaying media exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BroadcastStock {
    pub a: f64,
    pub b: f64,
}

/// What one `apply` produced: the signals every cell reads plus diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CampaignOutcome {
    pub signals: GlobalSignals,
    pub diag: CampaignDiag,
}

/// Owns the broadcast stocks across steps.
#[derive(Debug, Clone, Default)]
pub struct CampaignEngine {
    stock: BroadcastStock,
    // Whether each actor was already short of budget last step (for one-shot warnings)
    short_a: bool,
    short_b: bool,
}

impl CampaignEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self) -> BroadcastStock {
        self.stock
    }

    /// Zeroes both stocks.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Settles both actors' spend for this step, debits their budgets and updates the
    /// broadcast stocks.
    pub fn apply(
        &mut self,
        player_a: &mut Player,
        player_b: &mut Player,
        params: &BaseParameters,
    ) -> CampaignOutcome {
        let mut a = settle(player_a);
        let mut b = settle(player_b);

        warn_if_short("A", &a, &mut self.short_a);
        warn_if_short("B", &b, &mut self.short_b);

        // Stock fades every step, spending or not.
        let retain = 1.0 - params.broadcast_decay.clamp(0.0, 1.0);
        let stock_max = params.broadcast_stock_max.max(0.0);
        self.stock.a = (self.stock.a * retain + a.eff_broadcast).clamp(0.0, stock_max);
        self.stock.b = (self.stock.b * retain + b.eff_broadcast).clamp(0.0, stock_max);
        a.stock = self.stock.a;
        b.stock = self.stock.b;

        let signals = GlobalSignals {
            broadcast_a: params.w_broadcast * self.stock.a,
            broadcast_b: params.w_broadcast * self.stock.b,
            social_pressure: params.w_social * (a.eff_social - b.eff_social),
            dm_pressure: params.w_dm * (a.eff_dm - b.eff_dm),
        };

        debug!(
            "Campaign: A spent {:.3} (scale {:.3}, stock {:.3}) | B spent {:.3} (scale {:.3}, stock {:.3}) | social {:+.4} dm {:+.4}",
            a.spent, a.scale, a.stock, b.spent, b.scale, b.stock,
            signals.social_pressure, signals.dm_pressure
        );

        CampaignOutcome { signals, diag: CampaignDiag { a, b } }
    }
}

// Computes planned cost, scale and channel strengths for one actor and debits its budget.
fn settle(player: &mut Player) -> ActorCampaign {
    let planned_cost = player.planned_cost();
    let scale = spend_scale(player.budget, planned_cost);
    let spent = planned_cost * scale;
    player.budget = (player.budget - spent).max(0.0);

    let controls = &player.controls;
    let strength = |channel: Channel| -> f64 {
        Tier::ALL
            .iter()
            .map(|&tier| controls.get(tier, channel) * scale * tier_effectiveness(tier))
            .sum()
    };

    ActorCampaign {
        planned_cost,
        scale,
        spent,
        ctrl_broadcast: controls.channel_sum(Channel::Broadcast),
        ctrl_social: controls.channel_sum(Channel::Social),
        ctrl_dm: controls.channel_sum(Channel::DirectMessage),
        eff_broadcast: strength(Channel::Broadcast),
        eff_social: strength(Channel::Social),
        eff_dm: strength(Channel::DirectMessage),
        stock: 0.0, // Filled in once stocks are updated
    }
}

fn warn_if_short(label: &str, campaign: &ActorCampaign, was_short: &mut bool) {
    let short = campaign.planned_cost > 0.0 && campaign.scale < 1.0;
    if short && !*was_short {
        warn!(
            "Player {} cannot cover planned cost {:.3}; spending scaled to {:.3}.",
            label, campaign.planned_cost, campaign.scale
        );
    }
    *was_short = short;
}

#[cfg(test)]
mod tests {
    use super::*;
    use propaganda_common::Controls;

    fn player(budget: f64, controls: Controls) -> Player {
        Player { budget, controls, ..Player::default() }
    }

    #[test]
    fn insufficient_budget_scales_down_and_empties() {
        let controls = Controls { white_broadcast: 5.0, white_social: 5.0, white_dm: 5.0, ..Controls::default() };
        let mut a = Player { cost_white: 1.0, ..player(10.0, controls) };
        let mut b = player(0.0, Controls::default());
        let mut engine = CampaignEngine::new();
        let outcome = engine.apply(&mut a, &mut b, &BaseParameters::default());

        assert!((outcome.diag.a.planned_cost - 15.0).abs() < 1e-12);
        assert!((outcome.diag.a.scale - 2.0 / 3.0).abs() < 1e-9);
        assert!(a.budget.abs() < 1e-9);
        assert!(a.budget >= 0.0);
        assert!((outcome.diag.a.spent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn budget_debit_matches_plan_times_scale() {
        let controls = Controls { grey_dm: 2.0, black_social: 1.0, ..Controls::default() };
        let mut a = player(100.0, controls);
        let mut b = player(100.0, controls);
        let before = a.budget;
        let outcome = CampaignEngine::new().apply(&mut a, &mut b, &BaseParameters::default());
        let diag = outcome.diag.a;
        assert_eq!(diag.scale, 1.0);
        assert!((before - a.budget - diag.planned_cost * diag.scale).abs() < 1e-12);
    }

    #[test]
    fn zero_plan_or_empty_budget_spends_nothing() {
        assert_eq!(spend_scale(100.0, 0.0), 0.0);
        assert_eq!(spend_scale(0.0, 5.0), 0.0);
        assert_eq!(spend_scale(-1.0, 5.0), 0.0);
        assert_eq!(spend_scale(5.0, 5.0), 1.0);
        assert!((spend_scale(1.0, 4.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn channel_strength_weights_tiers_by_effectiveness() {
        let controls = Controls { white_social: 1.0, grey_social: 1.0, black_social: 1.0, ..Controls::default() };
        let mut a = player(1000.0, controls);
        let mut b = player(1000.0, Controls::default());
        let params = BaseParameters { w_social: 0.5, ..BaseParameters::default() };
        let outcome = CampaignEngine::new().apply(&mut a, &mut b, &params);
        assert!((outcome.diag.a.eff_social - 3.7).abs() < 1e-12);
        assert!((outcome.signals.social_pressure - 0.5 * 3.7).abs() < 1e-12);
        assert_eq!(outcome.signals.dm_pressure, 0.0);
    }

    #[test]
    fn pressure_is_signed_towards_a() {
        let mut a = player(1000.0, Controls { white_dm: 1.0, ..Controls::default() });
        let mut b = player(1000.0, Controls { black_dm: 1.0, ..Controls::default() });
        let params = BaseParameters { w_dm: 1.0, ..BaseParameters::default() };
        let outcome = CampaignEngine::new().apply(&mut a, &mut b, &params);
        assert!((outcome.signals.dm_pressure - (EFF_WHITE - EFF_BLACK)).abs() < 1e-12);
    }

    #[test]
    fn stock_accumulates_clamps_and_fades() {
        let params = BaseParameters {
            w_broadcast: 2.0,
            broadcast_decay: 0.5,
            broadcast_stock_max: 1.0,
            ..BaseParameters::default()
        };
        let mut engine = CampaignEngine::new();
        let mut a = player(1000.0, Controls { white_broadcast: 0.4, ..Controls::default() });
        let mut b = player(1000.0, Controls::default());

        engine.apply(&mut a, &mut b, &params);
        assert!((engine.stock().a - 0.4).abs() < 1e-12);
        engine.apply(&mut a, &mut b, &params);
        assert!((engine.stock().a - 0.6).abs() < 1e-12);

        // Overspend saturates at the cap
        a.controls.black_broadcast = 10.0;
        let outcome = engine.apply(&mut a, &mut b, &params);
        assert_eq!(engine.stock().a, 1.0);
        assert_eq!(outcome.signals.broadcast_a, 2.0);

        // Going quiet fades gradually rather than vanishing
        a.controls = Controls::default();
        engine.apply(&mut a, &mut b, &params);
        assert!((engine.stock().a - 0.5).abs() < 1e-12);
        assert_eq!(engine.stock().b, 0.0);

        engine.reset();
        assert_eq!(engine.stock(), BroadcastStock::default());
    }
}
