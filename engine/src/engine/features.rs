// engine/src/engine/features.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::engine::board::Board;
use crate::engine::constants::{H, W};

/// Engineered board metrics, computed from the locked board only (the active
/// piece is ignored). Pure functions of `board.cells`; recomputed on demand.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridFeatures {
    pub agg_height: u32,
    pub bumpiness: u32,
    pub holes: u32,
    pub well_max: u32,
    pub row_trans: u32,
    pub col_trans: u32,
}

/// Per-feature change relative to a previous snapshot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeatureDelta {
    pub agg_height: i32,
    pub bumpiness: i32,
    pub holes: i32,
    pub well_max: i32,
    pub row_trans: i32,
    pub col_trans: i32,
}

pub fn compute_features(board: &Board) -> GridFeatures {
    let heights = board.column_heights();

    GridFeatures {
        agg_height: heights.iter().map(|&h| h as u32).sum(),
        bumpiness: bumpiness(&heights),
        holes: board
            .holes_per_column()
            .iter()
            .map(|&h| h as u32)
            .sum(),
        well_max: well_max(&heights),
        row_trans: row_transitions(board),
        col_trans: column_transitions(board),
    }
}

pub fn feature_delta(prev: &GridFeatures, cur: &GridFeatures) -> FeatureDelta {
    FeatureDelta {
        agg_height: cur.agg_height as i32 - prev.agg_height as i32,
        bumpiness: cur.bumpiness as i32 - prev.bumpiness as i32,
        holes: cur.holes as i32 - prev.holes as i32,
        well_max: cur.well_max as i32 - prev.well_max as i32,
        row_trans: cur.row_trans as i32 - prev.row_trans as i32,
        col_trans: cur.col_trans as i32 - prev.col_trans as i32,
    }
}

fn bumpiness(heights: &[u8; W]) -> u32 {
    let mut b = 0u32;
    for i in 0..(W - 1) {
        b += (heights[i] as i32 - heights[i + 1] as i32).unsigned_abs();
    }
    b
}

/// Maximum well depth. A well is a column strictly lower than both neighbors;
/// the board walls count as higher than any column.
fn well_max(heights: &[u8; W]) -> u32 {
    let mut max_depth = 0i32;

    if heights[0] < heights[1] {
        max_depth = max_depth.max(heights[1] as i32 - heights[0] as i32);
    }
    for i in 1..(W - 1) {
        let left = heights[i - 1] as i32;
        let mid = heights[i] as i32;
        let right = heights[i + 1] as i32;
        if mid < left && mid < right {
            max_depth = max_depth.max(left.min(right) - mid);
        }
    }
    if heights[W - 1] < heights[W - 2] {
        max_depth = max_depth.max(heights[W - 2] as i32 - heights[W - 1] as i32);
    }

    max_depth as u32
}

/// Horizontally adjacent filled/empty pairs, counting out-of-board as filled
/// on both side walls.
pub fn row_transitions(board: &Board) -> u32 {
    let mut transitions = 0u32;
    for y in 0..H as i32 {
        for x in -1..W as i32 {
            if board.filled(x, y) != board.filled(x + 1, y) {
                transitions += 1;
            }
        }
    }
    transitions
}

/// Vertically adjacent filled/empty pairs, counting out-of-board as filled
/// above the top row and below the floor.
pub fn column_transitions(board: &Board) -> u32 {
    let mut transitions = 0u32;
    for x in 0..W as i32 {
        for y in -1..H as i32 {
            if board.filled(x, y) != board.filled(x, y + 1) {
                transitions += 1;
            }
        }
    }
    transitions
}
