// engine/src/engine/pieces.rs
#![forbid(unsafe_code)]

use crate::engine::constants::MAX_ROTS;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Kind {
    pub fn all() -> &'static [Kind; 7] {
        use Kind::*;
        &[I, O, T, S, Z, J, L]
    }

    /// Strict 1..=7 id used for cell encoding (0 = empty).
    pub fn idx(self) -> u8 {
        use Kind::*;
        match self {
            I => 1,
            O => 2,
            T => 3,
            S => 4,
            Z => 5,
            J => 6,
            L => 7,
        }
    }

    /// Inverse of `idx()` (1..=7). Returns None for invalid ids.
    pub fn from_idx(idx: u8) -> Option<Self> {
        use Kind::*;
        match idx {
            1 => Some(I),
            2 => Some(O),
            3 => Some(T),
            4 => Some(S),
            5 => Some(Z),
            6 => Some(J),
            7 => Some(L),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        use Kind::*;
        match self {
            I => 'I',
            O => 'O',
            T => 'T',
            S => 'S',
            Z => 'Z',
            J => 'J',
            L => 'L',
        }
    }

    /// Parse the single-letter wire name ("I".."L").
    pub fn from_name(name: &str) -> Option<Self> {
        use Kind::*;
        match name {
            "I" => Some(I),
            "O" => Some(O),
            "T" => Some(T),
            "S" => Some(S),
            "Z" => Some(Z),
            "J" => Some(J),
            "L" => Some(L),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        use Kind::*;
        match self {
            I => "I",
            O => "O",
            T => "T",
            S => "S",
            Z => "Z",
            J => "J",
            L => "L",
        }
    }
}

/// Per-(kind, rotation) cell offsets within the 4x4 local frame.
///
/// Rotation states follow the SRS shape table: 0 = spawn, 1 = clockwise,
/// 2 = 180, 3 = counter-clockwise. O's four states are identical. All four
/// states are present for every kind; redundant states (O, I 0/2 and 1/3
/// shifted variants) are distinct entries, matching the rotation index the
/// kick tables are keyed by.
pub fn offsets(kind: Kind, rot: usize) -> &'static [(i32, i32); 4] {
    use Kind::*;
    const I_ROTS: [[(i32, i32); 4]; 4] = [
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ];
    const O_ROTS: [[(i32, i32); 4]; 4] = [
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
    ];
    const T_ROTS: [[(i32, i32); 4]; 4] = [
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (1, 2)],
        [(1, 0), (0, 1), (1, 1), (1, 2)],
    ];
    const S_ROTS: [[(i32, i32); 4]; 4] = [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(1, 1), (2, 1), (0, 2), (1, 2)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ];
    const Z_ROTS: [[(i32, i32); 4]; 4] = [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(2, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ];
    const J_ROTS: [[(i32, i32); 4]; 4] = [
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ];
    const L_ROTS: [[(i32, i32); 4]; 4] = [
        [(2, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
    ];

    let table = match kind {
        I => &I_ROTS,
        O => &O_ROTS,
        T => &T_ROTS,
        S => &S_ROTS,
        Z => &Z_ROTS,
        J => &J_ROTS,
        L => &L_ROTS,
    };
    &table[rot % MAX_ROTS]
}

/// Spawn anchor for each kind: horizontally centered, near the top of the
/// board. These positions are shared with the renderer; the engine and any
/// client must agree on them exactly.
pub fn spawn_anchor(kind: Kind) -> (i32, i32) {
    match kind {
        Kind::I => (3, 1),
        Kind::O => (4, 1),
        _ => (3, 1),
    }
}
