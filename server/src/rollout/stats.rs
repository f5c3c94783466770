// server/src/rollout/stats.rs
#![forbid(unsafe_code)]

use std::time::Instant;

use tetricore::engine::compute_features;
use tetricore::Board;

#[derive(Clone, Debug)]
pub struct RolloutStats {
    pub episodes_finished: u64,
    pub ep_len: u64,
    pub episode_len_sum: u64,
    pub episode_len_max: u64,

    pub pieces_done: u64,

    // board feature aggregates across all placements
    pub sum_agg_h: f64,
    pub sum_holes: f64,
    pub sum_bump: f64,
    pub max_h_worst: u32,

    t0: Instant,
}

impl RolloutStats {
    pub fn new() -> Self {
        Self {
            episodes_finished: 0,
            ep_len: 0,
            episode_len_sum: 0,
            episode_len_max: 0,
            pieces_done: 0,
            sum_agg_h: 0.0,
            sum_holes: 0.0,
            sum_bump: 0.0,
            max_h_worst: 0,
            t0: Instant::now(),
        }
    }

    /// Call once per placement.
    pub fn on_piece(&mut self, board: &Board) {
        self.pieces_done += 1;
        self.ep_len += 1;

        let f = compute_features(board);
        self.sum_agg_h += f64::from(f.agg_height);
        self.sum_holes += f64::from(f.holes);
        self.sum_bump += f64::from(f.bumpiness);

        let max_h = board
            .column_heights()
            .iter()
            .map(|&h| u32::from(h))
            .max()
            .unwrap_or(0);
        self.max_h_worst = self.max_h_worst.max(max_h);
    }

    /// Call when an episode terminates, before resetting the environment.
    pub fn on_episode_end(&mut self) {
        self.episodes_finished += 1;
        self.episode_len_sum += self.ep_len;
        self.episode_len_max = self.episode_len_max.max(self.ep_len);
        self.ep_len = 0;
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.t0.elapsed().as_secs_f64()
    }

    pub fn pieces_per_sec(&self) -> f64 {
        let dt = self.elapsed_secs();
        if dt > 0.0 {
            self.pieces_done as f64 / dt
        } else {
            0.0
        }
    }

    pub fn avg_ep_len(&self) -> f64 {
        if self.episodes_finished > 0 {
            self.episode_len_sum as f64 / self.episodes_finished as f64
        } else {
            0.0
        }
    }

    pub fn avg_agg_h(&self) -> f64 {
        self.per_piece(self.sum_agg_h)
    }

    pub fn avg_holes(&self) -> f64 {
        self.per_piece(self.sum_holes)
    }

    pub fn avg_bump(&self) -> f64 {
        self.per_piece(self.sum_bump)
    }

    pub fn lines_per_piece(&self, live_total_lines: u64) -> f64 {
        self.per_piece(live_total_lines as f64)
    }

    pub fn score_per_piece(&self, live_total_score: u64) -> f64 {
        self.per_piece(live_total_score as f64)
    }

    fn per_piece(&self, sum: f64) -> f64 {
        if self.pieces_done > 0 {
            sum / self.pieces_done as f64
        } else {
            0.0
        }
    }

    pub fn live_msg(&self, lps: f64, sps: f64) -> String {
        format!(
            "pps={:.1} eps={} avg_ep={:.1} max_ep={} l/piece={:.3} score/piece={:.2} maxH={} avgAgg={:.1} avgHol={:.2} avgBum={:.2}",
            self.pieces_per_sec(),
            self.episodes_finished,
            self.avg_ep_len(),
            self.episode_len_max,
            lps,
            sps,
            self.max_h_worst,
            self.avg_agg_h(),
            self.avg_holes(),
            self.avg_bump(),
        )
    }

    pub fn final_report(
        &self,
        agent_name: &str,
        total_lines: u64,
        total_score: u64,
        last_ep_len: u64,
        last_top_out: bool,
    ) -> FinalReport {
        FinalReport {
            agent: agent_name.to_string(),
            pieces_done: self.pieces_done,
            elapsed_s: self.elapsed_secs(),
            pieces_per_s: self.pieces_per_sec(),
            episodes_finished: self.episodes_finished,
            avg_ep_len: self.avg_ep_len(),
            max_ep_len: self.episode_len_max,
            lines_per_piece: self.lines_per_piece(total_lines),
            score_per_piece: self.score_per_piece(total_score),
            max_h_worst: self.max_h_worst,
            avg_agg_h: self.avg_agg_h(),
            avg_holes: self.avg_holes(),
            avg_bump: self.avg_bump(),
            total_score,
            total_lines,
            last_ep_len,
            last_top_out,
        }
    }
}

impl Default for RolloutStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct FinalReport {
    pub agent: String,

    pub pieces_done: u64,
    pub elapsed_s: f64,
    pub pieces_per_s: f64,

    pub episodes_finished: u64,
    pub avg_ep_len: f64,
    pub max_ep_len: u64,

    pub lines_per_piece: f64,
    pub score_per_piece: f64,

    pub max_h_worst: u32,
    pub avg_agg_h: f64,
    pub avg_holes: f64,
    pub avg_bump: f64,

    pub total_score: u64,
    pub total_lines: u64,

    pub last_ep_len: u64,
    pub last_top_out: bool,
}
