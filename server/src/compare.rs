// server/src/compare.rs
#![forbid(unsafe_code)]

use tetricore::{AgentKind, Environment, GameEvent, Policy};

use crate::plan::plan_actions;
use crate::protocol::{ComparisonStats, FinalGameStats, GameSide};

/// Two-agent comparison: both environments are seeded identically so their
/// piece streams coincide, and they advance in lock-step by pieces placed.
pub struct CompareConfig {
    pub agent1: AgentKind,
    pub agent2: AgentKind,
    pub seed: u64,
    pub max_pieces: u64,
}

pub struct CompareSide {
    agent: Box<dyn Policy + Send>,
    env: Environment,
    pieces_played: u64,
    clear_events: u64,
    /// Agent returned no decision; the side can make no further progress.
    stuck: bool,
}

impl CompareSide {
    fn new(kind: AgentKind, seed: u64, agent_salt: u64) -> Self {
        Self {
            agent: kind.build(seed.wrapping_add(agent_salt)),
            env: Environment::new(seed),
            pieces_played: 0,
            clear_events: 0,
            stuck: false,
        }
    }

    fn efficiency(&self) -> f64 {
        let lines = self.env.lines_total();
        if lines == 0 {
            0.0
        } else {
            self.env.score() as f64 / lines as f64
        }
    }

    fn avg_lines_per_clear(&self) -> f64 {
        if self.clear_events == 0 {
            0.0
        } else {
            self.env.lines_total() as f64 / self.clear_events as f64
        }
    }

    /// One full placement: query the agent, then feed the plan's frame
    /// actions to the engine. Counts locks and clears from the step events.
    fn play_one_piece(&mut self) {
        let obs = self.env.observation();
        let Some(placement) = self.agent.select(&obs) else {
            // Agent has no decision (no legal moves); nothing more to play.
            self.stuck = true;
            return;
        };

        let mut plan = plan_actions(&obs, &placement);
        while let Some(action) = plan.pop_front() {
            let result = self.env.step(action);
            for event in &result.info.events {
                match event {
                    GameEvent::Lock => self.pieces_played += 1,
                    GameEvent::Clear => self.clear_events += 1,
                    _ => {}
                }
            }
            if result.done {
                break;
            }
        }
    }
}

pub struct CompareRun {
    cfg: CompareConfig,
    sides: [CompareSide; 2],
}

impl CompareRun {
    pub fn new(cfg: CompareConfig) -> Self {
        let sides = [
            CompareSide::new(cfg.agent1, cfg.seed, 0x5EED_0001),
            CompareSide::new(cfg.agent2, cfg.seed, 0x5EED_0002),
        ];
        Self { cfg, sides }
    }

    pub fn seed(&self) -> u64 {
        self.cfg.seed
    }

    fn side_active(&self, i: usize) -> bool {
        let side = &self.sides[i];
        !side.env.done() && !side.stuck && side.pieces_played < self.cfg.max_pieces
    }

    pub fn finished(&self) -> bool {
        !self.side_active(0) && !self.side_active(1)
    }

    /// Advance every still-active side by one placement. Returns true when
    /// the run has finished (both sides topped out or at the piece cap).
    pub fn advance(&mut self) -> bool {
        for i in 0..2 {
            if self.side_active(i) {
                self.sides[i].play_one_piece();
            }
        }
        self.finished()
    }

    pub fn snapshot(&mut self) -> (GameSide, GameSide, ComparisonStats) {
        let active1 = self.side_active(0);
        let active2 = self.side_active(1);
        let score1 = self.sides[0].env.score() as i64;
        let score2 = self.sides[1].env.score() as i64;

        let leader = match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => Some("agent1".to_string()),
            std::cmp::Ordering::Less => Some("agent2".to_string()),
            std::cmp::Ordering::Equal => None,
        };

        let comparison = ComparisonStats {
            both_done: self.finished(),
            leader,
            score_diff: score1 - score2,
            efficiency_agent1: self.sides[0].efficiency(),
            efficiency_agent2: self.sides[1].efficiency(),
            avg_clear_agent1: self.sides[0].avg_lines_per_clear(),
            avg_clear_agent2: self.sides[1].avg_lines_per_clear(),
        };

        let game1 = GameSide {
            obs: self.sides[0].env.observation(),
            done: self.sides[0].env.done(),
            pieces_played: self.sides[0].pieces_played,
            active: active1,
        };
        let game2 = GameSide {
            obs: self.sides[1].env.observation(),
            done: self.sides[1].env.done(),
            pieces_played: self.sides[1].pieces_played,
            active: active2,
        };

        (game1, game2, comparison)
    }

    /// Terminal summary: winner is the higher final score, or TIE.
    pub fn final_stats(&self) -> (String, FinalGameStats, FinalGameStats) {
        let score1 = self.sides[0].env.score();
        let score2 = self.sides[1].env.score();
        let winner = match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => "agent1".to_string(),
            std::cmp::Ordering::Less => "agent2".to_string(),
            std::cmp::Ordering::Equal => "TIE".to_string(),
        };

        let stats = |side: &CompareSide| FinalGameStats {
            score: side.env.score(),
            lines: side.env.lines_total(),
            pieces: side.pieces_played,
            topped_out: side.env.done(),
            efficiency: side.efficiency(),
        };

        (winner, stats(&self.sides[0]), stats(&self.sides[1]))
    }

    pub fn scores(&self) -> (u64, u64) {
        (self.sides[0].env.score(), self.sides[1].env.score())
    }
}
