use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::CelebrationEngine;
use crate::constants::SCAN_INTERVAL;

/// Start the birthday scheduler.
///
/// Runs a pass immediately, then once per [`SCAN_INTERVAL`]. Every change on
/// `trigger_rx` runs an extra pass without touching the hourly cadence.
pub fn start_birthday_scheduler(
    engine: Arc<CelebrationEngine>,
    trigger_rx: watch::Receiver<u64>,
) -> JoinHandle<()> {
    start_scheduler_with_interval(engine, trigger_rx, SCAN_INTERVAL)
}

fn start_scheduler_with_interval(
    engine: Arc<CelebrationEngine>,
    mut trigger_rx: watch::Receiver<u64>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Birthday scheduler started (every {} minutes)",
            period.as_secs() / 60
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut trigger_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_pass(&engine, "scheduled").await;
                }
                changed = trigger_rx.changed(), if trigger_open => {
                    if changed.is_ok() {
                        info!("Birthday check requested, running an extra pass");
                        run_pass(&engine, "on-demand").await;
                    } else {
                        // Sender gone; keep the hourly cadence only
                        trigger_open = false;
                    }
                }
            }
        }
    })
}

async fn run_pass(engine: &Arc<CelebrationEngine>, kind: &str) {
    let summary = engine.run_pass().await;

    if summary.is_empty() {
        debug!("{} birthday pass: nothing to do", kind);
    } else {
        info!(
            "{} birthday pass: celebrated {} member(s), announced in {} guild(s), expired {} role(s)",
            kind, summary.users_celebrated, summary.guilds_announced, summary.roles_expired
        );
    }
}
