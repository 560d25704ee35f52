//! Fixed neighbourhood offsets shared by local influence and the social-graph builder.

pub use propaganda_common::NeighbourhoodType;

/// 4-connected: east, west, south, north.
pub const VON_NEUMANN: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 8-connected: every queen move.
pub const MOORE: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Offsets of the given topology. The returned slice is static and read-only.
#[inline]
pub fn offsets(kind: NeighbourhoodType) -> &'static [(i32, i32)] {
    match kind {
        NeighbourhoodType::VonNeumann => &VON_NEUMANN,
        NeighbourhoodType::Moore => &MOORE,
    }
}
