// engine/src/engine/srs.rs
#![forbid(unsafe_code)]

use crate::engine::board::Board;
use crate::engine::piece::Piece;
use crate::engine::pieces::Kind;

/// Super Rotation System wall kicks.
///
/// Tables are keyed by (kind class, from -> to) and list up to five (dx, dy)
/// offsets, always starting with (0, 0). The first offset whose resulting
/// position does not collide wins; if none fit, the rotation fails and the
/// piece is unchanged.
///
/// Offsets are stated in this engine's y-down convention: the canonical SRS
/// reference table is written y-up, so its y components are negated here.
/// A positive dy moves the piece toward the floor.

type KickRow = [(i32, i32); 5];

// J, L, S, T, Z share one table.
const KICKS_JLSTZ: [KickRow; 8] = [
    // 0->1
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // 1->0
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    // 1->2
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    // 2->1
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // 2->3
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    // 3->2
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    // 3->0
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    // 0->3
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
];

// The I piece kicks differently.
const KICKS_I: [KickRow; 8] = [
    // 0->1
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    // 1->0
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    // 1->2
    [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
    // 2->1
    [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
    // 2->3
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    // 3->2
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    // 3->0
    [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
    // 0->3
    [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
];

// O rotates in place.
const KICKS_O: [(i32, i32); 1] = [(0, 0)];

fn transition_index(from: usize, to: usize) -> usize {
    match (from, to) {
        (0, 1) => 0,
        (1, 0) => 1,
        (1, 2) => 2,
        (2, 1) => 3,
        (2, 3) => 4,
        (3, 2) => 5,
        (3, 0) => 6,
        (0, 3) => 7,
        // Rotation steps are always +-1 mod 4, so no other pair occurs.
        _ => 0,
    }
}

/// Ordered kick offsets for a (kind, from -> to) rotation.
pub fn kicks(kind: Kind, from: usize, to: usize) -> &'static [(i32, i32)] {
    match kind {
        Kind::O => &KICKS_O,
        Kind::I => &KICKS_I[transition_index(from, to)],
        _ => &KICKS_JLSTZ[transition_index(from, to)],
    }
}

/// Attempt an SRS rotation. Returns the kicked piece on success, None when
/// every kick collides (caller treats that as a no-op).
pub fn try_rotate(board: &Board, piece: &Piece, clockwise: bool) -> Option<Piece> {
    let rotated = piece.rotated(clockwise);
    for &(dx, dy) in kicks(piece.kind, piece.rot, rotated.rot) {
        let candidate = rotated.translated(dx, dy);
        if !board.collides(&candidate) {
            return Some(candidate);
        }
    }
    None
}
