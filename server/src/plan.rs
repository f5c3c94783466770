// server/src/plan.rs
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use tetricore::engine::spawn_anchor;
use tetricore::{FrameAction, Kind, Observation, Placement};

/// Translate a placement decision into the frame actions that realize it:
/// optional HOLD, rotations to the target state, horizontal shifts to the
/// target anchor column, then HARD.
///
/// The plan is open-loop: it is computed once from the observation and the
/// actions are then fed to the engine as a best-effort stream. Rotation uses
/// the shortest direction (CCW for state 3).
pub fn plan_actions(obs: &Observation, placement: &Placement) -> VecDeque<FrameAction> {
    let mut actions = VecDeque::new();

    let kind = if placement.use_hold {
        actions.push_back(FrameAction::Hold);
        match &obs.hold.kind {
            Some(name) => Kind::from_name(name),
            None => obs.next_queue.first().and_then(|n| Kind::from_name(n)),
        }
    } else {
        Kind::from_name(&obs.current.kind)
    };
    let Some(kind) = kind else {
        // Malformed observation; fall back to dropping in place.
        actions.push_back(FrameAction::Hard);
        return actions;
    };

    match placement.rot % 4 {
        1 => actions.push_back(FrameAction::Cw),
        2 => {
            actions.push_back(FrameAction::Cw);
            actions.push_back(FrameAction::Cw);
        }
        3 => actions.push_back(FrameAction::Ccw),
        _ => {}
    }

    let (spawn_x, _) = spawn_anchor(kind);
    let dx = placement.x - spawn_x;
    let shift = if dx < 0 {
        FrameAction::Left
    } else {
        FrameAction::Right
    };
    for _ in 0..dx.unsigned_abs() {
        actions.push_back(shift);
    }

    actions.push_back(FrameAction::Hard);
    actions
}
