use serde::{Deserialize, Serialize};

/// Allegiance of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Not (yet) convinced by either actor.
    #[default]
    Undecided,
    A,
    B,
}

impl Side {
    /// Signed contribution of this side to an influence average: `+1` for A, `-1` for B, `0` otherwise.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Side::A => 1.0,
            Side::B => -1.0,
            Side::Undecided => 0.0,
        }
    }

    /// The competing side. Undecided has no opponent.
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
            Side::Undecided => Side::Undecided,
        }
    }

    pub fn is_aligned(self) -> bool {
        self != Side::Undecided
    }

    /// Short label used in CSV exports.
    pub fn label(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
            Side::Undecided => "N",
        }
    }
}
