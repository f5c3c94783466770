// server/src/session.rs
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use tetricore::{
    AgentKind, Environment, FrameAction, GameEvent, Policy, StepResult, TICKS_PER_SECOND,
};

use crate::compare::{CompareConfig, CompareRun};
use crate::plan::plan_actions;
use crate::protocol::{ClientMessage, ErrorCode, ServerMessage, PROTOCOL_VERSION};

/// Base cadence for the comparison runner: placements per second at speed 1.
const COMPARE_PIECES_PER_SECOND: f64 = 2.0;

/// Speeds outside this range are rejected rather than clamped.
const SPEED_RANGE: (f64, f64) = (0.05, 50.0);

struct AiRun {
    agent: Box<dyn Policy + Send>,
    speed: f64,
    max_pieces: Option<u64>,
    pieces_placed: u64,
    plan: VecDeque<FrameAction>,
}

enum Mode {
    Idle,
    Single,
    AiPlaying(AiRun),
    Comparing { run: CompareRun, speed: f64 },
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Single => "single",
            Mode::AiPlaying(_) => "ai_playing",
            Mode::Comparing { .. } => "comparing",
        }
    }
}

/// Per-connection state machine.
///
/// Owns the environment(s) for its connection exclusively; nothing is shared
/// across connections. Messages invalid for the current state are rejected
/// with INVALID_MESSAGE and leave the state unchanged.
pub struct Session {
    tx: UnboundedSender<String>,
    env: Option<Environment>,
    mode: Mode,
    /// Reserved for observation streaming.
    #[allow(dead_code)]
    streaming: bool,
}

impl Session {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self {
            tx,
            env: None,
            mode: Mode::Idle,
            streaming: false,
        }
    }

    /// Desired cadence timer period, or None when no timer should run.
    pub fn cadence(&self) -> Option<Duration> {
        match &self.mode {
            Mode::AiPlaying(run) => Some(Duration::from_secs_f64(
                1.0 / (f64::from(TICKS_PER_SECOND) * run.speed),
            )),
            Mode::Comparing { speed, .. } => Some(Duration::from_secs_f64(
                1.0 / (COMPARE_PIECES_PER_SECOND * speed),
            )),
            _ => None,
        }
    }

    fn send(&self, msg: &ServerMessage) {
        send_line(&self.tx, msg);
    }

    fn send_error(&self, code: ErrorCode, message: impl Into<String>) {
        self.send(&ServerMessage::error(code, message));
    }

    fn obs_message(result: StepResult) -> ServerMessage {
        let info = serde_json::to_value(&result.info).unwrap_or(Value::Null);
        ServerMessage::Obs {
            data: result.obs,
            reward: result.reward,
            done: result.done,
            info,
        }
    }

    pub fn handle_line(&mut self, line: &str) {
        let msg: ClientMessage = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                self.send_error(ErrorCode::InvalidMessage, format!("malformed message: {e}"));
                return;
            }
        };

        match msg {
            ClientMessage::Hello { version } => self.on_hello(version),
            ClientMessage::Reset { seed } => self.on_reset(seed),
            ClientMessage::Step { action } => self.on_step(&action),
            ClientMessage::Subscribe { stream } => {
                self.streaming = stream;
                self.send(&ServerMessage::SubscribeAck { streaming: stream });
            }
            ClientMessage::AiPlay {
                agent_type,
                speed,
                seed,
                max_pieces,
            } => self.on_ai_play(&agent_type, speed, seed, max_pieces),
            ClientMessage::AiStop => self.on_ai_stop(),
            ClientMessage::CompareStart {
                agent1,
                agent2,
                speed,
                max_pieces,
                seed,
            } => self.on_compare_start(&agent1, &agent2, speed, max_pieces, seed),
            ClientMessage::CompareStop => self.on_compare_stop(),
            ClientMessage::CompareSetSpeed { speed } => self.on_compare_set_speed(speed),
        }
    }

    fn on_hello(&mut self, version: Option<String>) {
        if let Some(v) = version {
            if v != PROTOCOL_VERSION {
                self.send_error(
                    ErrorCode::VersionMismatch,
                    format!("server speaks {PROTOCOL_VERSION}, client sent {v}"),
                );
                return;
            }
        }
        self.send(&ServerMessage::hello());
    }

    fn reject_for_state(&self, what: &str) {
        self.send_error(
            ErrorCode::InvalidMessage,
            format!("{what} not valid while {}", self.mode.label()),
        );
    }

    fn on_reset(&mut self, seed: Option<u64>) {
        if matches!(self.mode, Mode::AiPlaying(_) | Mode::Comparing { .. }) {
            self.reject_for_state("reset");
            return;
        }

        let seed = seed.unwrap_or_else(rand::random);
        let mut env = Environment::new(seed);
        let obs = env.observation();
        let done = env.done();
        self.env = Some(env);
        self.mode = Mode::Single;
        debug!(seed, "episode reset");

        self.send(&ServerMessage::Obs {
            data: obs,
            reward: 0.0,
            done,
            info: json!({ "event": "reset", "seed": seed }),
        });
    }

    fn on_step(&mut self, action: &str) {
        if matches!(self.mode, Mode::AiPlaying(_) | Mode::Comparing { .. }) {
            self.reject_for_state("step");
            return;
        }
        let Some(env) = self.env.as_mut() else {
            self.send_error(
                ErrorCode::GameNotInitialized,
                "no episode; send reset first",
            );
            return;
        };
        let Some(action) = FrameAction::parse(action) else {
            self.send_error(ErrorCode::InvalidAction, format!("unknown action: {action}"));
            return;
        };
        if env.done() {
            self.send_error(ErrorCode::GameOver, "episode is over; send reset");
            return;
        }

        let result = env.step(action);
        self.send(&Self::obs_message(result));
    }

    fn on_ai_play(
        &mut self,
        agent_type: &str,
        speed: f64,
        seed: Option<u64>,
        max_pieces: Option<u64>,
    ) {
        if matches!(self.mode, Mode::AiPlaying(_) | Mode::Comparing { .. }) {
            self.reject_for_state("ai_play");
            return;
        }
        let Some(kind) = AgentKind::parse(agent_type) else {
            self.send_error(
                ErrorCode::InvalidMessage,
                format!("unknown agent_type: {agent_type}"),
            );
            return;
        };
        if !valid_speed(speed) {
            self.send_error(ErrorCode::InvalidMessage, format!("bad speed: {speed}"));
            return;
        }

        // A fresh seed, a missing episode, or a finished one all start over.
        let needs_reset =
            seed.is_some() || self.env.as_ref().map_or(true, Environment::done);
        if needs_reset {
            self.on_reset(seed);
        }
        let Some(env) = self.env.as_ref() else {
            return;
        };

        let agent = kind.build(env.seed().wrapping_add(0x5EED_A9E7));
        info!(agent = kind.name(), speed, ?max_pieces, "ai play started");
        self.mode = Mode::AiPlaying(AiRun {
            agent,
            speed,
            max_pieces,
            pieces_placed: 0,
            plan: VecDeque::new(),
        });
    }

    fn on_ai_stop(&mut self) {
        let run = match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::AiPlaying(run) => run,
            other => {
                self.mode = other;
                self.reject_for_state("ai_stop");
                return;
            }
        };

        // Complete the scheduled actions for the in-flight placement so the
        // engine is not left half-moved, then hand control back.
        if let Some(env) = self.env.as_mut() {
            let mut plan = run.plan;
            while let Some(action) = plan.pop_front() {
                if env.done() {
                    break;
                }
                let _ = env.step(action);
            }
            let obs = env.observation();
            let done = env.done();
            send_line(
                &self.tx,
                &ServerMessage::Obs {
                    data: obs,
                    reward: 0.0,
                    done,
                    info: json!({ "event": "ai_stopped" }),
                },
            );
        }
        info!("ai play stopped");
        self.mode = Mode::Single;
    }

    fn on_compare_start(
        &mut self,
        agent1: &str,
        agent2: &str,
        speed: f64,
        max_pieces: u64,
        seed: Option<u64>,
    ) {
        if matches!(self.mode, Mode::AiPlaying(_) | Mode::Comparing { .. }) {
            self.reject_for_state("compare_start");
            return;
        }
        let (Some(kind1), Some(kind2)) = (AgentKind::parse(agent1), AgentKind::parse(agent2))
        else {
            self.send_error(
                ErrorCode::InvalidMessage,
                format!("unknown agent pair: {agent1} vs {agent2}"),
            );
            return;
        };
        if !valid_speed(speed) {
            self.send_error(ErrorCode::InvalidMessage, format!("bad speed: {speed}"));
            return;
        }
        if max_pieces == 0 {
            self.send_error(ErrorCode::InvalidMessage, "max_pieces must be positive");
            return;
        }

        let seed = seed.unwrap_or_else(rand::random);
        let mut run = CompareRun::new(CompareConfig {
            agent1: kind1,
            agent2: kind2,
            seed,
            max_pieces,
        });
        info!(
            agent1 = kind1.name(),
            agent2 = kind2.name(),
            seed,
            max_pieces,
            speed,
            "comparison started"
        );

        // Initial paired snapshot so the client can render both boards
        // before the first placement.
        let (game1, game2, comparison) = run.snapshot();
        send_line(
            &self.tx,
            &ServerMessage::CompareObs {
                game1,
                game2,
                comparison,
            },
        );

        self.mode = Mode::Comparing { run, speed };
    }

    fn on_compare_stop(&mut self) {
        if !matches!(self.mode, Mode::Comparing { .. }) {
            self.reject_for_state("compare_stop");
            return;
        }
        info!("comparison stopped");
        self.mode = self.idle_or_single();
    }

    fn on_compare_set_speed(&mut self, speed: f64) {
        if !valid_speed(speed) {
            self.send_error(ErrorCode::InvalidMessage, format!("bad speed: {speed}"));
            return;
        }
        match &mut self.mode {
            Mode::Comparing { speed: s, .. } => {
                *s = speed;
                debug!(speed, "comparison speed changed");
            }
            _ => self.reject_for_state("compare_set_speed"),
        }
    }

    fn idle_or_single(&self) -> Mode {
        if self.env.is_some() {
            Mode::Single
        } else {
            Mode::Idle
        }
    }

    /// Cadence timer fired.
    pub fn on_tick(&mut self) {
        let mode = std::mem::replace(&mut self.mode, Mode::Idle);
        self.mode = match mode {
            Mode::AiPlaying(run) => self.tick_ai(run),
            Mode::Comparing { run, speed } => self.tick_compare(run, speed),
            other => other,
        };
    }

    /// One AI frame: either the next scheduled action of the current plan,
    /// or a fresh plan from the agent when the previous one is spent.
    fn tick_ai(&mut self, mut run: AiRun) -> Mode {
        let Some(env) = self.env.as_mut() else {
            return Mode::Idle;
        };
        if env.done() {
            return Mode::Single;
        }

        if run.plan.is_empty() {
            if let Some(max) = run.max_pieces {
                if run.pieces_placed >= max {
                    info!(pieces = run.pieces_placed, "ai piece budget reached");
                    return Mode::Single;
                }
            }
            let obs = env.observation();
            match run.agent.select(&obs) {
                Some(placement) => run.plan = plan_actions(&obs, &placement),
                None => {
                    warn!("agent produced no decision; stopping ai play");
                    send_line(
                        &self.tx,
                        &ServerMessage::error(
                            ErrorCode::InvalidMessage,
                            "agent produced no decision; ai play stopped",
                        ),
                    );
                    return Mode::Single;
                }
            }
        }

        let Some(action) = run.plan.pop_front() else {
            return Mode::AiPlaying(run);
        };
        let result = env.step(action);
        run.pieces_placed += result
            .info
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Lock))
            .count() as u64;
        let done = result.done;
        send_line(&self.tx, &Self::obs_message(result));

        if done {
            info!(pieces = run.pieces_placed, "ai episode topped out");
            return Mode::Single;
        }
        Mode::AiPlaying(run)
    }

    /// One comparison beat: advance both sides by a placement, emit the
    /// paired update, and finish when neither side can continue.
    fn tick_compare(&mut self, mut run: CompareRun, speed: f64) -> Mode {
        let finished = run.advance();

        let (game1, game2, comparison) = run.snapshot();
        send_line(
            &self.tx,
            &ServerMessage::CompareObs {
                game1,
                game2,
                comparison,
            },
        );

        if finished {
            let (winner, game1, game2) = run.final_stats();
            info!(winner = %winner, "comparison complete");
            send_line(
                &self.tx,
                &ServerMessage::CompareComplete {
                    winner,
                    game1,
                    game2,
                },
            );
            return self.idle_or_single();
        }
        Mode::Comparing { run, speed }
    }
}

fn valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed >= SPEED_RANGE.0 && speed <= SPEED_RANGE.1
}

fn send_line(tx: &UnboundedSender<String>, msg: &ServerMessage) {
    match serde_json::to_string(msg) {
        Ok(line) => {
            // A closed channel means the connection is going away; the
            // read loop will notice and tear the session down.
            let _ = tx.send(line);
        }
        Err(e) => warn!("failed to serialize outbound message: {e}"),
    }
}
