// engine/src/policy/base.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::engine::Observation;

/// A target placement decision: final anchor column, rotation, and whether to
/// swap with the hold slot first. The session translates this into a frame
/// action sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i32,
    pub rot: usize,
    pub use_hold: bool,
}

/// A policy maps an observation to a placement decision.
///
/// Returns `None` when no legal move exists. Policies receive observations by
/// value reference and must not retain them; the only state a policy may keep
/// is its own (e.g. a seeded RNG).
///
/// Object-safe so it can be used as `Box<dyn Policy>`.
pub trait Policy {
    fn select(&mut self, obs: &Observation) -> Option<Placement>;
}
