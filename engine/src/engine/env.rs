// engine/src/engine/env.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::engine::bag::SevenBag;
use crate::engine::board::Board;
use crate::engine::constants::{
    score_for_lines, GRAVITY_TICKS, H, LOCK_DELAY_TICKS, NEXT_QUEUE_LEN, SCHEMA_VERSION, W,
};
use crate::engine::features::{compute_features, feature_delta, FeatureDelta, GridFeatures};
use crate::engine::moves::{enumerate_moves, LegalMove};
use crate::engine::obs::{BoardView, EpisodeView, HoldView, Observation, PieceView};
use crate::engine::piece::Piece;
use crate::engine::pieces::Kind;
use crate::engine::srs;

/// One frame of input. Illegal actions are silent no-ops; frame actions are a
/// best-effort stream, never an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameAction {
    Left,
    Right,
    Cw,
    Ccw,
    Soft,
    Hard,
    Hold,
    Noop,
}

impl FrameAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "CW" => Some(Self::Cw),
            "CCW" => Some(Self::Ccw),
            "SOFT" => Some(Self::Soft),
            "HARD" => Some(Self::Hard),
            "HOLD" => Some(Self::Hold),
            "NOOP" => Some(Self::Noop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Cw => "CW",
            Self::Ccw => "CCW",
            Self::Soft => "SOFT",
            Self::Hard => "HARD",
            Self::Hold => "HOLD",
            Self::Noop => "NOOP",
        }
    }
}

/// Everything that happened during one tick, in occurrence order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    Spawn,
    HardDrop,
    Lock,
    Clear,
    TopOut,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub lines_cleared: u32,
    pub events: Vec<GameEvent>,
    pub delta: FeatureDelta,
}

#[derive(Clone, Debug)]
pub struct StepResult {
    pub obs: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Lock-delay state for the active piece.
///
/// The counter is nonzero only while the piece is grounded (would collide one
/// cell below). Successful grounded moves and rotations restart the count;
/// leaving the ground clears it entirely. There is no cap on restarts.
#[derive(Clone, Copy, Debug, Default)]
struct LockDelay {
    active: bool,
    ticks_on_ground: u32,
}

impl LockDelay {
    fn start(&mut self) {
        self.active = true;
        self.ticks_on_ground = 0;
    }

    fn reset(&mut self) {
        self.active = false;
        self.ticks_on_ground = 0;
    }

    /// Advance one grounded tick; true when the piece should lock.
    fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.ticks_on_ground += 1;
        self.ticks_on_ground >= LOCK_DELAY_TICKS
    }
}

/// The tick-driven game environment.
///
/// Exclusively owns the board, bag, hold slot, active piece, lock timer, and
/// episode counters. `step` is a total function of prior state and the input
/// action; nothing inside suspends, blocks, or draws entropy beyond the
/// seeded bag.
#[derive(Clone)]
pub struct Environment {
    board: Board,
    bag: SevenBag,
    current: Piece,
    hold: Option<Kind>,
    hold_used: bool,
    lock_delay: LockDelay,
    gravity_counter: u32,
    tick: u64,
    score: u64,
    lines_total: u64,
    done: bool,
    seed: u64,
    last_features: GridFeatures,
}

impl Environment {
    /// Fresh episode: empty board, bag from `seed`, hold empty, first piece
    /// spawned. A colliding spawn marks the episode topped out immediately.
    pub fn new(seed: u64) -> Self {
        let mut bag = SevenBag::new(seed);
        let current = Piece::spawn(bag.next());
        let board = Board::new();
        let done = board.collides(&current);
        let last_features = compute_features(&board);

        Self {
            board,
            bag,
            current,
            hold: None,
            hold_used: false,
            lock_delay: LockDelay::default(),
            gravity_counter: 0,
            tick: 0,
            score: 0,
            lines_total: 0,
            done,
            seed,
            last_features,
        }
    }

    pub fn reset(&mut self, seed: u64) -> Observation {
        *self = Self::new(seed);
        self.observation()
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lines_total(&self) -> u64 {
        self.lines_total
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current(&self) -> Piece {
        self.current
    }

    /// Ghost preview: where the active piece would land under a hard drop.
    pub fn ghost(&self) -> Piece {
        let mut p = self.current;
        while !self.board.collides(&p.translated(0, 1)) {
            p = p.translated(0, 1);
        }
        p
    }

    /// Apply one frame. After the action, gravity descends the piece every
    /// `GRAVITY_TICKS` ticks, lock delay advances while grounded, and a lock
    /// runs line clearing, scoring, and the next spawn. Reward is identically
    /// zero; consumers shape their own from `info`.
    pub fn step(&mut self, action: FrameAction) -> StepResult {
        if self.done {
            return StepResult {
                obs: self.observation(),
                reward: 0.0,
                done: true,
                info: StepInfo::default(),
            };
        }

        let prev = self.last_features;
        let mut events = Vec::new();
        let mut lines_cleared = 0u32;

        match action {
            FrameAction::Left => {
                self.try_shift(-1);
            }
            FrameAction::Right => {
                self.try_shift(1);
            }
            FrameAction::Cw => {
                self.try_rotate(true);
            }
            FrameAction::Ccw => {
                self.try_rotate(false);
            }
            FrameAction::Soft => {
                self.try_move(0, 1);
            }
            FrameAction::Hard => {
                lines_cleared = self.hard_drop(&mut events);
            }
            FrameAction::Hold => {
                self.try_hold(&mut events);
            }
            FrameAction::Noop => {}
        }

        if action != FrameAction::Hard && !self.done {
            // Gravity at its fixed cadence.
            self.gravity_counter += 1;
            if self.gravity_counter >= GRAVITY_TICKS {
                self.gravity_counter = 0;
                self.try_move(0, 1);
            }

            // Ground tracking happens after every action, not just gravity.
            if self.grounded() {
                if !self.lock_delay.active {
                    self.lock_delay.start();
                }
            } else {
                self.lock_delay.reset();
            }

            if self.lock_delay.active && self.grounded() && self.lock_delay.tick() {
                lines_cleared = self.lock_current(&mut events);
            }
        }

        self.tick += 1;

        let cur = compute_features(&self.board);
        let delta = feature_delta(&prev, &cur);
        self.last_features = cur;

        StepResult {
            obs: self.observation(),
            reward: 0.0,
            done: self.done,
            info: StepInfo {
                lines_cleared,
                events,
                delta,
            },
        }
    }

    fn grounded(&self) -> bool {
        self.board.collides(&self.current.translated(0, 1))
    }

    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        let moved = self.current.translated(dx, dy);
        if self.board.collides(&moved) {
            return false;
        }
        self.current = moved;
        true
    }

    /// Horizontal shift; on success while grounded the lock timer restarts.
    fn try_shift(&mut self, dx: i32) -> bool {
        let moved = self.try_move(dx, 0);
        if moved && self.grounded() {
            self.lock_delay.start();
        }
        moved
    }

    fn try_rotate(&mut self, clockwise: bool) -> bool {
        match srs::try_rotate(&self.board, &self.current, clockwise) {
            Some(rotated) => {
                self.current = rotated;
                if self.grounded() {
                    self.lock_delay.start();
                }
                true
            }
            None => false,
        }
    }

    /// Descend to the landing row and lock immediately, bypassing the timer.
    /// A piece that cannot descend at all locks in place.
    fn hard_drop(&mut self, events: &mut Vec<GameEvent>) -> u32 {
        events.push(GameEvent::HardDrop);
        while self.try_move(0, 1) {}
        self.lock_current(events)
    }

    fn lock_current(&mut self, events: &mut Vec<GameEvent>) -> u32 {
        self.board.lock(&self.current);
        events.push(GameEvent::Lock);
        self.lock_delay.reset();

        let cleared = self.board.clear_lines();
        if cleared > 0 {
            events.push(GameEvent::Clear);
            self.lines_total += u64::from(cleared);
            self.score += score_for_lines(cleared);
        }

        self.current = Piece::spawn(self.bag.next());
        events.push(GameEvent::Spawn);
        self.hold_used = false;

        if self.board.collides(&self.current) {
            self.done = true;
            events.push(GameEvent::TopOut);
        }

        cleared
    }

    /// Swap active and hold. Consumes the next bag piece when the slot is
    /// empty; a no-op once used this piece lifecycle.
    fn try_hold(&mut self, events: &mut Vec<GameEvent>) -> bool {
        if self.hold_used {
            return false;
        }

        let stashed = self.current.kind;
        match self.hold.take() {
            None => {
                self.current = Piece::spawn(self.bag.next());
            }
            Some(held) => {
                self.current = Piece::spawn(held);
            }
        }
        self.hold = Some(stashed);
        self.hold_used = true;
        self.lock_delay.reset();
        events.push(GameEvent::Spawn);

        if self.board.collides(&self.current) {
            self.done = true;
            events.push(GameEvent::TopOut);
        }
        true
    }

    pub fn legal_moves(&mut self) -> Vec<LegalMove> {
        let upcoming = self.bag.peek(1)[0];
        enumerate_moves(
            &self.board,
            self.current.kind,
            self.hold,
            self.hold_used,
            upcoming,
        )
    }

    pub fn observation(&mut self) -> Observation {
        let next_queue = self
            .bag
            .peek(NEXT_QUEUE_LEN)
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        let legal_moves = self.legal_moves();

        Observation {
            schema_version: SCHEMA_VERSION.to_string(),
            tick: self.tick,
            board: BoardView {
                w: W,
                h: H,
                cells: self.board.cells_flat(),
                row_heights: self.board.column_heights().to_vec(),
                holes_per_col: self.board.holes_per_column().to_vec(),
            },
            current: PieceView {
                kind: self.current.kind.name().to_string(),
                x: self.current.x,
                y: self.current.y,
                rot: self.current.rot,
            },
            next_queue,
            hold: HoldView {
                kind: self.hold.map(|k| k.name().to_string()),
                used: self.hold_used,
            },
            features: compute_features(&self.board),
            episode: EpisodeView {
                score: self.score,
                lines_total: self.lines_total,
                top_out: self.done,
                seed: self.seed,
            },
            legal_moves,
        }
    }

    /// Test/benchmark hook: overwrite the locked board.
    pub fn set_board(&mut self, board: Board) {
        self.last_features = compute_features(&board);
        self.board = board;
    }

    /// Test/benchmark hook: replace the active piece.
    pub fn set_current(&mut self, piece: Piece) {
        self.current = piece;
        self.lock_delay.reset();
    }
}
