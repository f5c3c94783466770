// engine/src/lib.rs
#![forbid(unsafe_code)]

pub mod engine;
pub mod policy;

// Re-export the bits the server and downstream tooling need:
pub use engine::{
    Board, Environment, FrameAction, GameEvent, GridFeatures, Kind, LegalMove, Observation, Piece,
    StepInfo, StepResult, GRAVITY_TICKS, H, LOCK_DELAY_TICKS, SCHEMA_VERSION, TICKS_PER_SECOND, W,
};

// Re-export reference policy types:
pub use policy::{AgentKind, DellacheriePolicy, DellacherieWeights, Placement, Policy, RandomPolicy};
