//! The trigger engine: independent watchers that decide *when* pending
//! demand is ripe for release.
//!
//! Each watcher is a task polling at ~1 Hz, observing a stop signal at its
//! tick boundary. A watcher owns exactly one flag slot and performs
//! read-only scans otherwise, so the watchers never contend with each
//! other. A panicking tick is caught and logged; the next tick runs
//! normally.

pub mod deadline;
pub mod full_stack;
#[cfg(feature = "singleton-watcher")]
pub mod singleton;

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::state::SharedApp;

/// Spawns the watcher set. Handles resolve once the stop signal flips.
pub fn spawn_watchers(app: SharedApp, stop: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    handles.push(spawn_watcher(
        "deadline-watcher",
        app.clone(),
        stop.clone(),
        |app| {
            deadline::tick(app, std::time::Instant::now());
        },
    ));
    handles.push(spawn_watcher(
        "full-stack-watcher",
        app.clone(),
        stop.clone(),
        |app| {
            full_stack::tick(app);
        },
    ));

    #[cfg(feature = "singleton-watcher")]
    handles.push(spawn_watcher(
        "singleton-watcher",
        app.clone(),
        stop.clone(),
        |app| {
            singleton::tick(app);
        },
    ));

    handles
}

fn spawn_watcher(
    name: &'static str,
    app: SharedApp,
    mut stop: watch::Receiver<bool>,
    tick: impl Fn(&SharedApp) + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(watcher = name, "watcher started");
        let mut ticker = tokio::time::interval(app.config.watcher_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if catch_unwind(AssertUnwindSafe(|| tick(&app))).is_err() {
                        error!(watcher = name, "watcher tick panicked; retrying next tick");
                    }
                }
                _ = stop.changed() => {
                    info!(watcher = name, "watcher stopping");
                    return;
                }
            }
        }
    })
}
