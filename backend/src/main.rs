use std::sync::Arc;

use tokio::sync::watch;

use backend::{
    config::AppConfig,
    db::Db,
    dispatch,
    server,
    state::{App, SharedApp},
    store::{SqlxWarehouseRepository, WarehouseStore},
    trigger,
};
use common::logger::init_logger;

/// Connects, migrates, and builds the storage front end. Startup aborts on
/// any failure here: a coordinator without its floor is useless.
async fn init_store(cfg: &AppConfig) -> anyhow::Result<WarehouseStore> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let repo = Arc::new(SqlxWarehouseRepository::new(db.pool.as_ref().clone()));
    let store = WarehouseStore::new(repo);
    store.reload_catalog().await?;

    Ok(store)
}

/// Spawns the trigger watchers, the dispatcher, and the reconciler.
fn start_background_loops(app: SharedApp, stop: &watch::Receiver<bool>) {
    trigger::spawn_watchers(app.clone(), stop.clone());
    tokio::spawn(dispatch::run_dispatcher(app.clone(), stop.clone()));
    tokio::spawn(dispatch::run_reconciler(app, stop.clone()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();
    init_logger("picking-coordinator");

    tracing::info!("starting picking coordinator...");

    let cfg = AppConfig::from_env();
    let store = init_store(&cfg).await?;
    let app = App::new(cfg, store);

    let (stop_tx, stop_rx) = watch::channel(false);

    start_background_loops(app.clone(), &stop_rx);

    let server_app = app.clone();
    let server_stop = stop_rx.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::run_server(server_app, server_stop).await {
            tracing::error!(error = ?e, "server terminated");
        }
    });

    tracing::info!("coordinator started; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // watchers, dispatcher, and connections observe the flip at their next
    // tick boundary; in-flight planning jobs are dropped with the runtime
    let _ = stop_tx.send(true);
    let _ = server_task.await;

    Ok(())
}
