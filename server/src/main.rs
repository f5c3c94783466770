// server/src/main.rs
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

use tetricore::AgentKind;
use tetricore_server::net;
use tetricore_server::rollout::{Runner, RunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "tetricore-server")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the line-delimited JSON protocol over TCP.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 7878)]
        port: u16,
    },

    /// Headless agent evaluation without a client.
    Rollout {
        /// Agent: random | dellacherie
        #[arg(long, default_value = "dellacherie")]
        agent: String,

        /// Total placements to execute across episodes.
        #[arg(long, default_value_t = 500)]
        pieces: u64,

        /// Base RNG seed (episodes use base_seed + episode_id).
        #[arg(long)]
        seed: Option<u64>,

        /// Verbosity: 0=final summary only, 1=progress bar.
        #[arg(long, default_value_t = 1)]
        verbosity: u8,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tetricore_server=info".into()),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Serve { host, port } => net::serve(&host, port).await,
        Command::Rollout {
            agent,
            pieces,
            seed,
            verbosity,
        } => {
            let Some(kind) = AgentKind::parse(&agent) else {
                anyhow::bail!("unknown agent: {agent} (expected random | dellacherie)");
            };
            let base_seed = seed.unwrap_or(12345);

            let cfg = RunnerConfig {
                pieces,
                base_seed,
                agent: kind,
                verbosity,
            };
            let mut policy = kind.build(base_seed.wrapping_add(999));
            let report = Runner::new(cfg).run(&mut *policy);

            // Final one-line summary (useful for logs / grep).
            println!(
                "DONE: agent={} pieces_done={} elapsed={:.3}s pieces/s={:.1} episodes_finished={} avg_ep_len={:.2} max_ep_len={} lines/piece={:.3} score/piece={:.2} max_h_worst={} avg_agg_h={:.1} avg_holes={:.2} avg_bump={:.2} total_score={} total_lines={} (last_ep_len={} last_top_out={})",
                report.agent,
                report.pieces_done,
                report.elapsed_s,
                report.pieces_per_s,
                report.episodes_finished,
                report.avg_ep_len,
                report.max_ep_len,
                report.lines_per_piece,
                report.score_per_piece,
                report.max_h_worst,
                report.avg_agg_h,
                report.avg_holes,
                report.avg_bump,
                report.total_score,
                report.total_lines,
                report.last_ep_len,
                report.last_top_out,
            );
            Ok(())
        }
    }
}
