// engine/src/engine/mod.rs
#![forbid(unsafe_code)]

mod bag;
mod board;
mod constants;
mod env;
mod features;
mod moves;
mod obs;
mod piece;
mod pieces;
mod srs;

/**
 * Curated engine public API.
 *
 * Internal implementation modules remain private; only stable items are re-exported here.
 */
pub use bag::SevenBag;
pub use board::Board;
pub use constants::{
    score_for_lines, GRAVITY_TICKS, H, LOCK_DELAY_TICKS, MAX_ROTS, NEXT_QUEUE_LEN, SCHEMA_VERSION,
    SCORE_TABLE, TICKS_PER_SECOND, W,
};
pub use env::{Environment, FrameAction, GameEvent, StepInfo, StepResult};
pub use features::{
    column_transitions, compute_features, feature_delta, row_transitions, FeatureDelta,
    GridFeatures,
};
pub use moves::{enumerate_moves, LegalMove};
pub use obs::{BoardView, EpisodeView, HoldView, Observation, PieceView};
pub use piece::Piece;
pub use pieces::{offsets, spawn_anchor, Kind};
pub use srs::{kicks, try_rotate};
