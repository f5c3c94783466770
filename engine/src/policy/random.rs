// engine/src/policy/random.rs
#![forbid(unsafe_code)]

use rand::prelude::*;

use crate::engine::Observation;

use super::base::{Placement, Policy};

/// Uniform choice among the observation's legal moves. Baseline and sanity
/// check; any serious policy should beat it.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select(&mut self, obs: &Observation) -> Option<Placement> {
        let m = obs.legal_moves.choose(&mut self.rng)?;
        Some(Placement {
            x: m.x,
            rot: m.rot,
            use_hold: m.use_hold,
        })
    }
}
