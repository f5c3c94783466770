// server/src/protocol.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tetricore::Observation;

/// Protocol version; the observation schema version doubles as the handshake
/// version string.
pub const PROTOCOL_VERSION: &str = tetricore::SCHEMA_VERSION;
pub const SERVER_NAME: &str = "tetricore-rs";

/// Inbound messages. One JSON object per line, discriminated by `type`;
/// anything that fails to parse is INVALID_MESSAGE.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello {
        #[serde(default)]
        version: Option<String>,
    },
    Reset {
        #[serde(default)]
        seed: Option<u64>,
    },
    Step {
        action: String,
    },
    Subscribe {
        #[serde(default = "default_stream")]
        stream: bool,
    },
    AiPlay {
        agent_type: String,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default)]
        max_pieces: Option<u64>,
    },
    AiStop,
    CompareStart {
        agent1: String,
        agent2: String,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default = "default_max_pieces")]
        max_pieces: u64,
        #[serde(default)]
        seed: Option<u64>,
    },
    CompareStop,
    CompareSetSpeed {
        speed: f64,
    },
}

fn default_stream() -> bool {
    true
}

fn default_speed() -> f64 {
    1.0
}

fn default_max_pieces() -> u64 {
    1000
}

/// Outbound messages, mirrored after the inbound shape.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Hello {
        version: String,
        server: String,
    },
    Obs {
        data: Observation,
        reward: f64,
        done: bool,
        info: Value,
    },
    SubscribeAck {
        streaming: bool,
    },
    CompareObs {
        game1: GameSide,
        game2: GameSide,
        comparison: ComparisonStats,
    },
    CompareComplete {
        winner: String,
        game1: FinalGameStats,
        game2: FinalGameStats,
    },
    Error {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl ServerMessage {
    pub fn hello() -> Self {
        Self::Hello {
            version: PROTOCOL_VERSION.to_string(),
            server: SERVER_NAME.to_string(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidMessage,
    InvalidAction,
    GameNotInitialized,
    GameOver,
    VersionMismatch,
}

/// One side of a comparison update.
#[derive(Clone, Debug, Serialize)]
pub struct GameSide {
    pub obs: Observation,
    pub done: bool,
    pub pieces_played: u64,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComparisonStats {
    pub both_done: bool,
    pub leader: Option<String>,
    pub score_diff: i64,
    pub efficiency_agent1: f64,
    pub efficiency_agent2: f64,
    pub avg_clear_agent1: f64,
    pub avg_clear_agent2: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FinalGameStats {
    pub score: u64,
    pub lines: u64,
    pub pieces: u64,
    pub topped_out: bool,
    pub efficiency: f64,
}
