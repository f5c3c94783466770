// engine/src/policy/mod.rs
#![forbid(unsafe_code)]

mod base;
mod dellacherie;
mod random;

/**
 * Curated policy public API.
 *
 * Internal implementation modules remain private; only stable policy entrypoints are re-exported.
 */
pub use base::{Placement, Policy};
pub use dellacherie::{DellacheriePolicy, DellacherieWeights};
pub use random::RandomPolicy;

/// Closed registry of built-in agents, keyed by their protocol names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AgentKind {
    Random,
    Dellacherie,
}

impl AgentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Some(Self::Random),
            "dellacherie" => Some(Self::Dellacherie),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Dellacherie => "dellacherie",
        }
    }

    /// Instantiate the policy. `seed` only matters for stochastic agents.
    pub fn build(self, seed: u64) -> Box<dyn Policy + Send> {
        match self {
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Dellacherie => Box::new(DellacheriePolicy::default()),
        }
    }
}
