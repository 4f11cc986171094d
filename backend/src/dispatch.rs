//! The dispatcher: consumes raised flags and drives the planning pipeline.
//!
//! One sequential loop at ~10 Hz takes the highest-priority flag, promotes
//! the captured demand, snapshots the floor, and hands the CPU-bound
//! cluster → select → route run to the blocking pool. A produced route
//! lands in the outbox; a failed or infeasible run leaves the demand in
//! process for the next release.
//!
//! A slower reconciliation loop (~0.2 Hz) settles in-process demand
//! against the FIFO head.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use algorithm::{PlanSettings, solve};
use common::logger::{TraceId, warn_if_slow};

use crate::outbox::RouteMessage;
use crate::state::SharedApp;

/// Runs the dispatch loop until the stop signal flips.
pub async fn run_dispatcher(app: SharedApp, mut stop: watch::Receiver<bool>) {
    info!("dispatcher started");
    let mut ticker = tokio::time::interval(app.config.dispatch_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = dispatch_once(&app).await {
                    error!(error = ?e, "dispatch tick failed; demand stays in process");
                }
            }
            _ = stop.changed() => {
                info!("dispatcher stopping");
                return;
            }
        }
    }
}

/// Runs the reconciliation loop until the stop signal flips.
pub async fn run_reconciler(app: SharedApp, mut stop: watch::Receiver<bool>) {
    info!("reconciler started");
    let mut ticker = tokio::time::interval(app.config.reconcile_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let settled = app.book.lock().reconcile();
                if !settled.is_empty() {
                    debug!(settled = ?settled, "in-process demand settled");
                }
            }
            _ = stop.changed() => {
                info!("reconciler stopping");
                return;
            }
        }
    }
}

/// One dispatch tick. Returns whether a route was produced.
///
/// At most one flag advances per tick; the others stay latched for the
/// following ticks.
#[instrument(skip(app), target = "dispatcher", fields(trace_id))]
pub async fn dispatch_once(app: &SharedApp) -> anyhow::Result<bool> {
    let Some((kind, demand)) = app.flags.take_highest() else {
        return Ok(false);
    };

    let trace = TraceId::default();
    tracing::Span::current().record("trace_id", tracing::field::display(&trace));
    info!(?kind, demand = ?demand, "flag consumed; planning release");

    app.book.lock().promote(&demand);

    let view = app.store.snapshot_view(app.config.start_point).await?;
    let clusters = app.clusterizer.lock().clusters(&view).to_vec();

    let settings = PlanSettings {
        seed: app.config.plan_seed,
        ..PlanSettings::default()
    };

    let planning_demand = demand.clone();
    let planned = warn_if_slow("plan_release", Duration::from_secs(5), async {
        tokio::task::spawn_blocking(move || {
            solve(&view, &clusters, &planning_demand, &settings)
        })
        .await
    })
    .await?;

    match planned? {
        Some(route) => {
            info!(steps = route.length(), "route planned; pushing to outbox");
            app.outbox.push(RouteMessage::new(kind, &route));
            Ok(true)
        }
        None => {
            warn!(demand = ?demand, "demand not coverable; no route produced");
            Ok(false)
        }
    }
}
