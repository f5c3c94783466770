// server/src/rollout/runner.rs
#![forbid(unsafe_code)]

use indicatif::{ProgressBar, ProgressStyle};

use tetricore::{AgentKind, Environment, GameEvent, Policy};

use crate::plan::plan_actions;

use super::stats::{FinalReport, RolloutStats};

/// Fixed internal cadence for progress-bar live message updates.
/// (No CLI knob on purpose.)
const LIVE_EVERY: u64 = 100;

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Total placements to execute across episodes.
    pub pieces: u64,
    /// Base seed; each episode uses base_seed + episode_id.
    pub base_seed: u64,
    pub agent: AgentKind,

    /// 0 = final summary only, 1 = progress bar.
    pub verbosity: u8,
}

/// Headless agent evaluation: runs placements through the real frame-action
/// pipeline (plan translation + tick stepping), not a shortcut kernel, so the
/// numbers reflect exactly what a session-driven agent would score.
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    pub fn run(&mut self, policy: &mut dyn Policy) -> FinalReport {
        let cfg = self.cfg.clone();

        // Progress bar is UI only; runner logic does not depend on it.
        let pb = if cfg.verbosity >= 1 {
            let pb = ProgressBar::new(cfg.pieces);
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos:>9}/{len:<9}  {percent:>3}%  {elapsed_precise}  {msg}",
                )
                .unwrap()
                .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut stats = RolloutStats::new();

        let mut episode_id: u64 = 0;
        let mut env = Environment::new(cfg.base_seed.wrapping_add(episode_id));

        // Totals across completed episodes (live totals include current).
        let mut total_lines_finished: u64 = 0;
        let mut total_score_finished: u64 = 0;

        while stats.pieces_done < cfg.pieces {
            // ------------------------------------------------------------
            // Episode boundary: finalize counters, then reset.
            // ------------------------------------------------------------
            if env.done() {
                stats.on_episode_end();
                total_lines_finished += env.lines_total();
                total_score_finished += env.score();

                episode_id += 1;
                env = Environment::new(cfg.base_seed.wrapping_add(episode_id));
                continue;
            }

            // ------------------------------------------------------------
            // One placement: agent decides, plan executes tick by tick.
            // ------------------------------------------------------------
            let obs = env.observation();
            let Some(placement) = policy.select(&obs) else {
                stats.on_episode_end();
                total_lines_finished += env.lines_total();
                total_score_finished += env.score();
                episode_id += 1;
                env = Environment::new(cfg.base_seed.wrapping_add(episode_id));
                continue;
            };

            let mut plan = plan_actions(&obs, &placement);
            let mut locked = false;
            while let Some(action) = plan.pop_front() {
                let r = env.step(action);
                locked |= r.info.events.iter().any(|e| matches!(e, GameEvent::Lock));
                if r.done {
                    break;
                }
            }
            if !locked {
                // Plan fizzled without a lock (agent asked for the hold swap
                // twice, say); force progress so the loop cannot spin.
                let r = env.step(tetricore::FrameAction::Hard);
                locked = r.info.events.iter().any(|e| matches!(e, GameEvent::Lock));
            }
            if locked {
                stats.on_piece(env.board());
                if let Some(ref pb) = pb {
                    pb.inc(1);
                }
            }

            if cfg.verbosity >= 1 && stats.pieces_done % LIVE_EVERY == 0 {
                let live_lines = total_lines_finished + env.lines_total();
                let live_score = total_score_finished + env.score();
                let msg = stats.live_msg(
                    stats.lines_per_piece(live_lines),
                    stats.score_per_piece(live_score),
                );
                if let Some(ref pb) = pb {
                    pb.set_message(msg);
                }
            }
        }

        let total_lines = total_lines_finished + env.lines_total();
        let total_score = total_score_finished + env.score();

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        stats.final_report(
            cfg.agent.name(),
            total_lines,
            total_score,
            stats.ep_len,
            env.done(),
        )
    }
}
