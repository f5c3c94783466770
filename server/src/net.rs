// server/src/net.rs
#![forbid(unsafe_code)]

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::session::Session;

/// Accept loop: one task per connection, no state shared between them.
pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket).await {
                warn!(%peer, "connection error: {e:#}");
            }
            info!(%peer, "client disconnected");
        });
    }
}

fn make_timer(period: std::time::Duration) -> Interval {
    let mut t = time::interval(period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

/// Per-connection event loop. Suspension points are exactly: the next inbound
/// line, the AI cadence tick, and (in the writer task) the outbound channel.
/// A disconnect drops the session and with it every timer and environment.
async fn handle_connection(socket: TcpStream) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if writer.write_all(msg.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut session = Session::new(tx.clone());
    let mut timer: Option<Interval> = None;

    loop {
        // Reconcile the cadence timer with what the session currently wants.
        match session.cadence() {
            Some(period) => {
                if timer.as_ref().map_or(true, |t| t.period() != period) {
                    timer = Some(make_timer(period));
                }
            }
            None => timer = None,
        }

        match timer.as_mut() {
            Some(t) => {
                tokio::select! {
                    line = lines.next_line() => match line? {
                        Some(l) => {
                            let l = l.trim();
                            if !l.is_empty() {
                                session.handle_line(l);
                            }
                        }
                        None => break,
                    },
                    _ = t.tick() => session.on_tick(),
                }
            }
            None => match lines.next_line().await? {
                Some(l) => {
                    let l = l.trim();
                    if !l.is_empty() {
                        session.handle_line(l);
                    }
                }
                None => break,
            },
        }
    }

    drop(session);
    drop(tx);
    let _ = write_task.await;
    Ok(())
}
