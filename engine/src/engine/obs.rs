// engine/src/engine/obs.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::engine::features::GridFeatures;
use crate::engine::moves::LegalMove;

/// Immutable snapshot of the full game state, built once per step, emitted,
/// and discarded. Field layout matches the wire schema verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub schema_version: String,
    pub tick: u64,
    pub board: BoardView,
    pub current: PieceView,
    pub next_queue: Vec<String>,
    pub hold: HoldView,
    pub features: GridFeatures,
    pub episode: EpisodeView,
    pub legal_moves: Vec<LegalMove>,
}

/// Cell encoding: 0 = empty, 1..=7 = I, O, T, S, Z, J, L. `cells[y*10 + x]`.
/// `row_heights` is the wire name for per-column heights.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub w: usize,
    pub h: usize,
    pub cells: Vec<u8>,
    pub row_heights: Vec<u8>,
    pub holes_per_col: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PieceView {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub rot: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HoldView {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub used: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EpisodeView {
    pub score: u64,
    pub lines_total: u64,
    pub top_out: bool,
    pub seed: u64,
}
