// engine/src/engine/piece.rs
#![forbid(unsafe_code)]

use crate::engine::constants::MAX_ROTS;
use crate::engine::pieces::{offsets, spawn_anchor, Kind};

/// An active tetromino at a board position.
///
/// Plain value type: motion and rotation return new instances, they never
/// mutate in place. The environment replaces its current piece wholesale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Piece {
    pub kind: Kind,
    pub x: i32,
    pub y: i32,
    pub rot: usize,
}

impl Piece {
    pub fn new(kind: Kind, x: i32, y: i32, rot: usize) -> Self {
        Self {
            kind,
            x,
            y,
            rot: rot % MAX_ROTS,
        }
    }

    /// The piece as it materializes at the top of the board (rotation 0).
    pub fn spawn(kind: Kind) -> Self {
        let (x, y) = spawn_anchor(kind);
        Self::new(kind, x, y, 0)
    }

    /// Absolute board coordinates of all four cells.
    pub fn cells(&self) -> [(i32, i32); 4] {
        let offs = offsets(self.kind, self.rot);
        let mut out = [(0, 0); 4];
        for (i, &(dx, dy)) in offs.iter().enumerate() {
            out[i] = (self.x + dx, self.y + dy);
        }
        out
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn rotated(&self, clockwise: bool) -> Self {
        let step = if clockwise { 1 } else { MAX_ROTS - 1 };
        Self {
            rot: (self.rot + step) % MAX_ROTS,
            ..*self
        }
    }
}
