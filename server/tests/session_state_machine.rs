// server/tests/session_state_machine.rs
#![forbid(unsafe_code)]

/**
 * Session dispatch tests, driven synchronously through the outbound channel.
 *
 * Covered:
 * - Handshake and version mismatch.
 * - step-before-reset, unknown actions, stepping a finished episode.
 * - Manual play round trip and determinism across sessions.
 * - State-machine rejections during AI play.
 * - AI cadence ticks emit observations and stop at the piece budget.
 */
use serde_json::Value;
use tokio::sync::mpsc;

use tetricore_server::session::Session;

struct Harness {
    session: Session,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Harness {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(tx),
            rx,
        }
    }

    fn send(&mut self, line: &str) -> Vec<Value> {
        self.session.handle_line(line);
        self.drain()
    }

    fn tick(&mut self) -> Vec<Value> {
        self.session.on_tick();
        self.drain()
    }

    fn drain(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            out.push(serde_json::from_str(&line).expect("server emits valid JSON"));
        }
        out
    }
}

#[test]
fn hello_handshake_and_version_mismatch() {
    let mut h = Harness::new();

    let replies = h.send(r#"{"type":"hello","version":"s1.0.0"}"#);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["type"], "hello");
    assert_eq!(replies[0]["server"], "tetricore-rs");

    let replies = h.send(r#"{"type":"hello","version":"s9.9.9"}"#);
    assert_eq!(replies[0]["type"], "error");
    assert_eq!(replies[0]["code"], "VERSION_MISMATCH");
}

#[test]
fn step_requires_reset_first() {
    let mut h = Harness::new();
    let replies = h.send(r#"{"type":"step","action":"LEFT"}"#);
    assert_eq!(replies[0]["type"], "error");
    assert_eq!(replies[0]["code"], "GAME_NOT_INITIALIZED");
}

#[test]
fn malformed_and_unknown_messages_are_invalid_message() {
    let mut h = Harness::new();
    assert_eq!(h.send("garbage")[0]["code"], "INVALID_MESSAGE");
    assert_eq!(
        h.send(r#"{"type":"warp_speed"}"#)[0]["code"],
        "INVALID_MESSAGE"
    );
}

#[test]
fn unknown_action_is_invalid_action() {
    let mut h = Harness::new();
    h.send(r#"{"type":"reset","seed":1}"#);
    let replies = h.send(r#"{"type":"step","action":"SPIN"}"#);
    assert_eq!(replies[0]["type"], "error");
    assert_eq!(replies[0]["code"], "INVALID_ACTION");
}

#[test]
fn reset_then_step_round_trip() {
    let mut h = Harness::new();

    let replies = h.send(r#"{"type":"reset","seed":42}"#);
    assert_eq!(replies.len(), 1);
    let obs = &replies[0];
    assert_eq!(obs["type"], "obs");
    assert_eq!(obs["done"], false);
    assert_eq!(obs["info"]["event"], "reset");
    assert_eq!(obs["info"]["seed"], 42);
    assert_eq!(obs["data"]["tick"], 0);

    let replies = h.send(r#"{"type":"step","action":"HARD"}"#);
    let obs = &replies[0];
    assert_eq!(obs["type"], "obs");
    assert_eq!(obs["data"]["tick"], 1);
    let events: Vec<&str> = obs["info"]["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert!(events.contains(&"hard_drop"));
    assert!(events.contains(&"lock"));
    assert!(events.contains(&"spawn"));
}

#[test]
fn identical_sessions_emit_identical_streams() {
    let script = [
        r#"{"type":"reset","seed":1234}"#,
        r#"{"type":"step","action":"LEFT"}"#,
        r#"{"type":"step","action":"CW"}"#,
        r#"{"type":"step","action":"SOFT"}"#,
        r#"{"type":"step","action":"HARD"}"#,
        r#"{"type":"step","action":"HOLD"}"#,
        r#"{"type":"step","action":"HARD"}"#,
    ];

    let mut a = Harness::new();
    let mut b = Harness::new();
    for line in script {
        assert_eq!(a.send(line), b.send(line));
    }
}

#[test]
fn stepping_a_finished_episode_reports_game_over() {
    let mut h = Harness::new();
    h.send(r#"{"type":"reset","seed":8}"#);

    // Hard drop until the episode tops out.
    let mut done = false;
    for _ in 0..500 {
        let replies = h.send(r#"{"type":"step","action":"HARD"}"#);
        if replies[0]["done"] == true {
            done = true;
            break;
        }
    }
    assert!(done, "stacking hard drops must eventually top out");

    let replies = h.send(r#"{"type":"step","action":"HARD"}"#);
    assert_eq!(replies[0]["type"], "error");
    assert_eq!(replies[0]["code"], "GAME_OVER");
}

#[test]
fn ai_play_rejects_conflicting_messages_until_stopped() {
    let mut h = Harness::new();
    let replies = h.send(
        r#"{"type":"ai_play","agent_type":"dellacherie","speed":1.0,"seed":3}"#,
    );
    // The implicit reset emits the initial observation.
    assert_eq!(replies[0]["type"], "obs");
    assert!(h.session.cadence().is_some());

    assert_eq!(
        h.send(r#"{"type":"step","action":"LEFT"}"#)[0]["code"],
        "INVALID_MESSAGE"
    );
    assert_eq!(h.send(r#"{"type":"reset"}"#)[0]["code"], "INVALID_MESSAGE");
    assert_eq!(
        h.send(r#"{"type":"compare_start","agent1":"random","agent2":"random"}"#)[0]["code"],
        "INVALID_MESSAGE"
    );

    let replies = h.send(r#"{"type":"ai_stop"}"#);
    assert_eq!(replies[0]["type"], "obs");
    assert_eq!(replies[0]["info"]["event"], "ai_stopped");
    assert!(h.session.cadence().is_none());

    // Manual control is back.
    assert_eq!(h.send(r#"{"type":"step","action":"NOOP"}"#)[0]["type"], "obs");
}

#[test]
fn ai_ticks_emit_observations_and_respect_the_piece_budget() {
    let mut h = Harness::new();
    h.send(r#"{"type":"ai_play","agent_type":"dellacherie","speed":2.0,"seed":5,"max_pieces":3}"#);

    let mut locks = 0;
    for _ in 0..2000 {
        if h.session.cadence().is_none() {
            break;
        }
        for reply in h.tick() {
            if reply["type"] == "obs" {
                let events = reply["info"]["events"].as_array().cloned().unwrap_or_default();
                if events.iter().any(|e| e == "lock") {
                    locks += 1;
                }
            }
        }
    }

    assert_eq!(locks, 3, "ai play should stop after exactly max_pieces locks");
    assert!(h.session.cadence().is_none());
}

#[test]
fn unknown_agent_type_is_rejected() {
    let mut h = Harness::new();
    let replies = h.send(r#"{"type":"ai_play","agent_type":"alphazero","speed":1.0}"#);
    assert_eq!(replies[0]["code"], "INVALID_MESSAGE");
    assert!(h.session.cadence().is_none());
}

#[test]
fn subscribe_is_acknowledged() {
    let mut h = Harness::new();
    let replies = h.send(r#"{"type":"subscribe","stream":true}"#);
    assert_eq!(replies[0]["type"], "subscribe_ack");
    assert_eq!(replies[0]["streaming"], true);
}
