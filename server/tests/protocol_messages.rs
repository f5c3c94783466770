// server/tests/protocol_messages.rs
#![forbid(unsafe_code)]

/**
 * Wire-shape tests for the protocol layer.
 *
 * Covered:
 * - Client message parsing, including defaults and unknown types.
 * - Server message serialization (tags, error codes, observation payload).
 * - Placement-to-frame-action plan translation.
 */
use serde_json::{json, Value};

use tetricore::{Environment, FrameAction, Placement};
use tetricore_server::plan::plan_actions;
use tetricore_server::protocol::{ClientMessage, ErrorCode, ServerMessage, PROTOCOL_VERSION};

fn parse(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(line)
}

#[test]
fn client_messages_parse_with_defaults() {
    assert!(matches!(
        parse(r#"{"type":"hello","version":"s1.0.0"}"#).unwrap(),
        ClientMessage::Hello { version: Some(v) } if v == "s1.0.0"
    ));
    assert!(matches!(
        parse(r#"{"type":"reset"}"#).unwrap(),
        ClientMessage::Reset { seed: None }
    ));
    assert!(matches!(
        parse(r#"{"type":"reset","seed":7}"#).unwrap(),
        ClientMessage::Reset { seed: Some(7) }
    ));
    assert!(matches!(
        parse(r#"{"type":"step","action":"HARD"}"#).unwrap(),
        ClientMessage::Step { action } if action == "HARD"
    ));

    match parse(r#"{"type":"ai_play","agent_type":"dellacherie"}"#).unwrap() {
        ClientMessage::AiPlay {
            agent_type,
            speed,
            seed,
            max_pieces,
        } => {
            assert_eq!(agent_type, "dellacherie");
            assert_eq!(speed, 1.0);
            assert_eq!(seed, None);
            assert_eq!(max_pieces, None);
        }
        other => panic!("unexpected parse: {other:?}"),
    }

    match parse(r#"{"type":"compare_start","agent1":"random","agent2":"dellacherie","seed":7}"#)
        .unwrap()
    {
        ClientMessage::CompareStart {
            agent1,
            agent2,
            speed,
            max_pieces,
            seed,
        } => {
            assert_eq!(agent1, "random");
            assert_eq!(agent2, "dellacherie");
            assert_eq!(speed, 1.0);
            assert_eq!(max_pieces, 1000);
            assert_eq!(seed, Some(7));
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn unknown_message_types_fail_to_parse() {
    assert!(parse(r#"{"type":"teleport"}"#).is_err());
    assert!(parse(r#"{"no_type":true}"#).is_err());
    assert!(parse("not json").is_err());
}

#[test]
fn server_messages_serialize_with_expected_tags() {
    let hello = serde_json::to_value(ServerMessage::hello()).unwrap();
    assert_eq!(hello["type"], "hello");
    assert_eq!(hello["version"], PROTOCOL_VERSION);
    assert_eq!(hello["server"], "tetricore-rs");

    let err = serde_json::to_value(ServerMessage::error(
        ErrorCode::GameNotInitialized,
        "no episode",
    ))
    .unwrap();
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "GAME_NOT_INITIALIZED");
    assert_eq!(err["message"], "no episode");
    assert!(err.get("details").is_none());

    for (code, name) in [
        (ErrorCode::InvalidMessage, "INVALID_MESSAGE"),
        (ErrorCode::InvalidAction, "INVALID_ACTION"),
        (ErrorCode::GameOver, "GAME_OVER"),
        (ErrorCode::VersionMismatch, "VERSION_MISMATCH"),
    ] {
        let v = serde_json::to_value(code).unwrap();
        assert_eq!(v, json!(name));
    }
}

#[test]
fn observation_payload_matches_the_schema() {
    let mut env = Environment::new(42);
    let obs = env.observation();
    let msg = ServerMessage::Obs {
        data: obs,
        reward: 0.0,
        done: false,
        info: json!({"event": "reset", "seed": 42}),
    };
    let v: Value = serde_json::to_value(msg).unwrap();

    assert_eq!(v["type"], "obs");
    let data = &v["data"];
    assert_eq!(data["schema_version"], "s1.0.0");
    assert_eq!(data["board"]["w"], 10);
    assert_eq!(data["board"]["h"], 20);
    assert_eq!(data["board"]["cells"].as_array().unwrap().len(), 200);
    assert_eq!(data["board"]["row_heights"].as_array().unwrap().len(), 10);
    assert_eq!(data["board"]["holes_per_col"].as_array().unwrap().len(), 10);
    assert!(data["current"]["type"].is_string());
    assert_eq!(data["next_queue"].as_array().unwrap().len(), 3);
    assert_eq!(data["hold"]["type"], Value::Null);
    assert_eq!(data["hold"]["used"], false);
    for key in [
        "agg_height",
        "bumpiness",
        "holes",
        "well_max",
        "row_trans",
        "col_trans",
    ] {
        assert!(data["features"][key].is_u64(), "missing feature {key}");
    }
    assert_eq!(data["episode"]["score"], 0);
    assert_eq!(data["episode"]["seed"], 42);
    assert_eq!(data["episode"]["top_out"], false);
    assert!(data["legal_moves"].as_array().unwrap().len() > 0);
    let m = &data["legal_moves"][0];
    for key in ["x", "rot", "use_hold", "harddrop_y"] {
        assert!(!m[key].is_null(), "missing legal move key {key}");
    }
}

#[test]
fn plans_spell_out_hold_rotation_shift_and_drop() {
    let mut env = Environment::new(42);
    let obs = env.observation();
    let current = obs.current.kind.clone();

    // No hold, rotation 1, target left of spawn.
    let plan = plan_actions(
        &obs,
        &Placement {
            x: 0,
            rot: 1,
            use_hold: false,
        },
    );
    let actions: Vec<FrameAction> = plan.into_iter().collect();
    let spawn_x = tetricore::engine::spawn_anchor(
        tetricore::Kind::from_name(&current).unwrap(),
    )
    .0;
    let mut expected = vec![FrameAction::Cw];
    expected.extend(std::iter::repeat(FrameAction::Left).take(spawn_x as usize));
    expected.push(FrameAction::Hard);
    assert_eq!(actions, expected);

    // Hold with an empty slot targets the upcoming piece's spawn anchor.
    let plan = plan_actions(
        &obs,
        &Placement {
            x: 5,
            rot: 3,
            use_hold: true,
        },
    );
    let actions: Vec<FrameAction> = plan.into_iter().collect();
    assert_eq!(actions[0], FrameAction::Hold);
    assert_eq!(actions[1], FrameAction::Ccw);
    assert_eq!(*actions.last().unwrap(), FrameAction::Hard);

    // Rotation 2 is two clockwise turns.
    let plan = plan_actions(
        &obs,
        &Placement {
            x: 3,
            rot: 2,
            use_hold: false,
        },
    );
    let actions: Vec<FrameAction> = plan.into_iter().collect();
    assert_eq!(&actions[..2], &[FrameAction::Cw, FrameAction::Cw]);
}
