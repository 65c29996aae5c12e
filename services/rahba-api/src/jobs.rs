//! Background sweep tasks

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use crate::state::SweeperImpl;

#[derive(Debug, Clone, Copy)]
enum SweepKind {
    Trial,
    Subscription,
}

impl SweepKind {
    fn label(self) -> &'static str {
        match self {
            SweepKind::Trial => "trial",
            SweepKind::Subscription => "subscription",
        }
    }
}

/// Spawn the trial-expiry and subscription-expiry sweeps.
///
/// Each sweep runs on its own interval. The first tick fires immediately,
/// so expiries missed while the service was down are caught on boot. The
/// tasks live for the lifetime of the runtime and stop with it.
pub fn spawn_sweeps(sweeper: Arc<SweeperImpl>, period: Duration) {
    tokio::spawn(run_sweep_loop(
        Arc::clone(&sweeper),
        period,
        SweepKind::Trial,
    ));
    tokio::spawn(run_sweep_loop(sweeper, period, SweepKind::Subscription));
}

async fn run_sweep_loop(sweeper: Arc<SweeperImpl>, period: Duration, kind: SweepKind) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let outcome = match kind {
            SweepKind::Trial => sweeper.run_trial_sweep(Utc::now()).await,
            SweepKind::Subscription => sweeper.run_subscription_sweep(Utc::now()).await,
        };

        match outcome {
            Ok(report) => {
                metrics::counter!("sweep_transitions_total", "sweep" => kind.label())
                    .increment(report.transitioned as u64);
                tracing::info!(
                    sweep = kind.label(),
                    examined = report.examined,
                    transitioned = report.transitioned,
                    notified = report.notified,
                    failed = report.failed,
                    "Sweep finished"
                );
            }
            Err(e) => {
                tracing::error!(error = ?e, sweep = kind.label(), "Sweep failed");
            }
        }
    }
}
