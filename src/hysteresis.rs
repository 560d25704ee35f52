//! Per-cell decision: moves a cell between undecided / A / B and evolves its hysteresis.

use crate::influence::FieldComponents;
use crate::state::Cell;
use propaganda_common::{BaseParameters, GlobalSignals, Side};

/// Returns the cell's state after one step.
///
/// Undecided cells convert once the field reaches `theta + margin` in either direction,
/// otherwise their hysteresis decays. Aligned cells flip only when the field opposes them
/// by more than `theta * (1 + switch_kappa * hysteresis) + margin`; a flip resets
/// hysteresis to zero. A zero field never moves a cell.
pub fn next_state(
    cell: &Cell,
    field: &FieldComponents,
    signals: &GlobalSignals,
    params: &BaseParameters,
) -> Cell {
    let mut next = *cell;
    if !cell.active {
        return next;
    }

    let h = field.total();
    let theta = cell.threshold * params.theta_scale;

    match cell.side {
        Side::Undecided => {
            let bound = theta + params.margin;
            if h > 0.0 && h >= bound {
                next.side = Side::A;
                next.hysteresis = 0.0;
            } else if h < 0.0 && h <= -bound {
                next.side = Side::B;
                next.hysteresis = 0.0;
            } else {
                next.hysteresis = cell.hysteresis - params.hys_decay;
            }
        }
        side => {
            let s = side.value();
            let effective_theta = theta * (1.0 + params.switch_kappa * cell.hysteresis);
            let bound = effective_theta + params.margin;
            // Positive when the field supports the current side
            let support = s * h;

            if support < 0.0 && support <= -bound {
                next.side = side.opposite();
                next.hysteresis = 0.0;
            } else {
                let mut hys = cell.hysteresis;
                if support > 0.0 {
                    hys += params.hys_grow;
                }
                hys += channel_adjustment(s * field.dm, params.dm_hys_gain, params.dm_hys_erode);
                hys += channel_adjustment(
                    s * field.social,
                    params.social_hys_gain,
                    params.social_hys_erode,
                );
                hys = hys.clamp(0.0, hys_cap(params));
                next.hysteresis = reinforce(hys, signals.broadcast_for(side), params);
            }
        }
    }

    next.hysteresis = bounded(next.hysteresis, params);
    next
}

/// Gain for a supportive channel contribution, erosion for an opposing one.
#[inline]
fn channel_adjustment(signed_contribution: f64, gain: f64, erode: f64) -> f64 {
    if signed_contribution > 0.0 {
        gain * signed_contribution
    } else if signed_contribution < 0.0 {
        erode * signed_contribution // already negative
    } else {
        0.0
    }
}

/// Broadcast entrenchment for a cell that kept its side: `broadcast_hys_gain * own signal`,
/// never lifting hysteresis past `broadcast_hys_max`.
#[inline]
pub fn reinforce(hysteresis: f64, own_broadcast: f64, params: &BaseParameters) -> f64 {
    let gain = params.broadcast_hys_gain * own_broadcast;
    let cap = params.broadcast_hys_max.min(hys_cap(params));
    if gain > 0.0 && hysteresis < cap {
        (hysteresis + gain).min(cap)
    } else {
        hysteresis
    }
}

// Upper bound for hysteresis; a negative or NaN cap collapses to 0.
#[inline]
fn hys_cap(params: &BaseParameters) -> f64 {
    params.hys_max_total.max(0.0)
}

// Keeps hysteresis finite and inside [0, hys_max_total].
#[inline]
fn bounded(hysteresis: f64, params: &BaseParameters) -> f64 {
    if hysteresis.is_finite() {
        hysteresis.clamp(0.0, hys_cap(params))
    } else {
        0.0
    }
}
