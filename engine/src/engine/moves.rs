// engine/src/engine/moves.rs
#![forbid(unsafe_code)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::board::Board;
use crate::engine::constants::{MAX_ROTS, W};
use crate::engine::piece::Piece;
use crate::engine::pieces::Kind;

/// A collision-free hard-drop placement for the active (or held) piece.
/// `x` and `harddrop_y` are anchor coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegalMove {
    pub x: i32,
    pub rot: usize,
    pub use_hold: bool,
    pub harddrop_y: i32,
}

/// Enumerate every reachable hard-drop placement.
///
/// Candidates start at anchor (x, 0) with the chosen rotation and descend
/// until the next step collides; candidates that collide at entry are
/// unreachable and skipped. Positions only reachable via tucks or spins are
/// intentionally absent. When the hold swap is still available, the held
/// kind (or the upcoming bag piece while the slot is empty) is enumerated as
/// `use_hold` placements.
///
/// Symmetric rotations (O, I 0/2 and 1/3) produce duplicate cell sets;
/// those are deduplicated on (use_hold, occupied cells), keeping the
/// lowest-rotation entry.
pub fn enumerate_moves(
    board: &Board,
    active: Kind,
    hold: Option<Kind>,
    hold_used: bool,
    upcoming: Kind,
) -> Vec<LegalMove> {
    let mut candidates: Vec<(Kind, bool)> = vec![(active, false)];
    if !hold_used {
        candidates.push((hold.unwrap_or(upcoming), true));
    }

    let mut moves = Vec::new();
    let mut seen: HashSet<(bool, [(i32, i32); 4])> = HashSet::new();

    for (kind, use_hold) in candidates {
        for rot in 0..MAX_ROTS {
            for x in 0..W as i32 {
                let start = Piece::new(kind, x, 0, rot);
                if board.collides(&start) {
                    continue;
                }

                let mut landed = start;
                while !board.collides(&landed.translated(0, 1)) {
                    landed = landed.translated(0, 1);
                }

                let mut cells = landed.cells();
                cells.sort_unstable();
                if seen.insert((use_hold, cells)) {
                    moves.push(LegalMove {
                        x,
                        rot,
                        use_hold,
                        harddrop_y: landed.y,
                    });
                }
            }
        }
    }

    moves
}
