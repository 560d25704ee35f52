use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Aggressiveness level of a propaganda spend. Higher tiers cost more and hit harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    White,
    Grey,
    Black,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::White, Tier::Grey, Tier::Black];
}

/// Influence pathway a control intensity is spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Broadcast,
    Social,
    DirectMessage,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Broadcast, Channel::Social, Channel::DirectMessage];
}

/// Per-step intensities, one per (tier, channel) pair. Set by the caller before each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub white_broadcast: f64,
    pub white_social: f64,
    pub white_dm: f64,
    pub grey_broadcast: f64,
    pub grey_social: f64,
    pub grey_dm: f64,
    pub black_broadcast: f64,
    pub black_social: f64,
    pub black_dm: f64,
}

impl Controls {
    /// Intensity for one pair. Negative values read as zero.
    pub fn get(&self, tier: Tier, channel: Channel) -> f64 {
        let raw = match (tier, channel) {
            (Tier::White, Channel::Broadcast) => self.white_broadcast,
            (Tier::White, Channel::Social) => self.white_social,
            (Tier::White, Channel::DirectMessage) => self.white_dm,
            (Tier::Grey, Channel::Broadcast) => self.grey_broadcast,
            (Tier::Grey, Channel::Social) => self.grey_social,
            (Tier::Grey, Channel::DirectMessage) => self.grey_dm,
            (Tier::Black, Channel::Broadcast) => self.black_broadcast,
            (Tier::Black, Channel::Social) => self.black_social,
            (Tier::Black, Channel::DirectMessage) => self.black_dm,
        };
        raw.max(0.0)
    }

    pub fn set(&mut self, tier: Tier, channel: Channel, value: f64) {
        let slot = match (tier, channel) {
            (Tier::White, Channel::Broadcast) => &mut self.white_broadcast,
            (Tier::White, Channel::Social) => &mut self.white_social,
            (Tier::White, Channel::DirectMessage) => &mut self.white_dm,
            (Tier::Grey, Channel::Broadcast) => &mut self.grey_broadcast,
            (Tier::Grey, Channel::Social) => &mut self.grey_social,
            (Tier::Grey, Channel::DirectMessage) => &mut self.grey_dm,
            (Tier::Black, Channel::Broadcast) => &mut self.black_broadcast,
            (Tier::Black, Channel::Social) => &mut self.black_social,
            (Tier::Black, Channel::DirectMessage) => &mut self.black_dm,
        };
        *slot = value;
    }

    /// Sum of the three channel intensities of one tier.
    pub fn tier_sum(&self, tier: Tier) -> f64 {
        Channel::ALL.iter().map(|&c| self.get(tier, c)).sum()
    }

    /// Sum of the three tier intensities on one channel.
    pub fn channel_sum(&self, channel: Channel) -> f64 {
        Tier::ALL.iter().map(|&t| self.get(t, channel)).sum()
    }

    pub fn is_idle(&self) -> bool {
        Tier::ALL.iter().all(|&t| self.tier_sum(t) == 0.0)
    }
}

/// One of the two competing actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub controls: Controls,
    pub budget: f64,
    pub cost_white: f64,
    pub cost_grey: f64,
    pub cost_black: f64,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            controls: Controls::default(),
            budget: 1000.0,
            cost_white: 1.0,
            cost_grey: 1.2,
            cost_black: 1.5,
        }
    }
}

impl Player {
    /// Unit cost of one intensity point in the given tier.
    pub fn cost(&self, tier: Tier) -> f64 {
        match tier {
            Tier::White => self.cost_white,
            Tier::Grey => self.cost_grey,
            Tier::Black => self.cost_black,
        }
    }

    /// What this step's controls would cost with an unlimited budget.
    pub fn planned_cost(&self) -> f64 {
        Tier::ALL
            .iter()
            .map(|&tier| self.cost(tier) * self.controls.tier_sum(tier))
            .sum()
    }

    pub fn validate(&self, label: &str) -> Result<()> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            anyhow::bail!("Player {} budget must be non-negative (got {}).", label, self.budget);
        }
        for tier in Tier::ALL {
            let cost = self.cost(tier);
            if !cost.is_finite() || cost < 0.0 {
                anyhow::bail!("Player {} cost for {:?} must be non-negative (got {}).", label, tier, cost);
            }
        }
        Ok(())
    }
}
