//! Command handler behavior over the in-memory repository.


use std::sync::Arc;
use std::time::Duration;

use mock_store::MemoryRepository;
use serde_json::json;

use backend::config::AppConfig;
use backend::error::AppError;
use backend::server::handlers::execute;
use backend::server::protocol::{Command, Inbound, parse_frame};
use backend::state::{App, SharedApp};
use backend::store::WarehouseStore;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "unused".into(),
        ws_auth: "secret".into(),
        ws_bind: "127.0.0.1:0".into(),
        start_point: (0, 0),
        dispatch_interval: Duration::from_millis(100),
        reconcile_interval: Duration::from_secs(5),
        watcher_interval: Duration::from_secs(1),
        push_interval: Duration::from_millis(500),
        synthetic_request_every: Duration::from_secs(33),
        plan_seed: Some(5),
    }
}

async fn empty_app() -> SharedApp {
    let repo = Arc::new(MemoryRepository::default());
    let store = WarehouseStore::new(repo);
    store.reload_catalog().await.unwrap();
    App::new(test_config(), store)
}

fn command(frame: serde_json::Value) -> Command {
    match parse_frame(&frame) {
        Inbound::Command(cmd) => cmd,
        other => panic!("expected a command, got {other:?}"),
    }
}

#[tokio::test]
async fn products_are_created_with_defaults_and_listed() {
    let app = empty_app().await;

    let create = command(json!({
        "type": "create_product_type",
        "payload": [
            {"sku": 7, "product_type": "box"},
            {"name": "no sku, skipped"},
            {"sku": 9, "max_per_hand": 2},
        ],
    }));
    let reply = execute(&app, create).await.unwrap();
    assert_eq!(reply["code"], 201);

    let listed = execute(&app, command(json!({"type": "list_product_types"})))
        .await
        .unwrap();
    assert_eq!(listed["code"], 200);
    let products = listed["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn warehouse_needs_products_first() {
    let app = empty_app().await;

    let build = command(json!({
        "type": "create_warehouse",
        "payload": {"layout": [[true, false], [false, true]]},
    }));
    let err = execute(&app, build).await.unwrap_err();
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn warehouse_build_fills_and_retunes() {
    let app = empty_app().await;

    execute(
        &app,
        command(json!({
            "type": "create_product_type",
            "payload": [{"sku": 7}],
        })),
    )
    .await
    .unwrap();

    let build = command(json!({
        "type": "create_warehouse",
        "payload": {
            "layout": [[true, false], [false, true]],
            "workers_count": 3,
            "filling_rules": {"empty_cell_ratio": 0.0},
        },
    }));
    let reply = execute(&app, build).await.unwrap();
    assert_eq!(reply["code"], 201);

    let cells = app.store.snapshot_view((0, 0)).await.unwrap();
    assert_eq!(cells.all_cells().len(), 2);
    // empty_cell_ratio 0: every cell got stocked
    assert!(cells.all_cells().iter().all(|c| c.count > 0));

    assert_eq!(app.roster.lock().count(), 3);
    assert!(app.clusterizer.lock().size_type().is_some());
}

#[tokio::test]
async fn malformed_layout_is_rejected() {
    let app = empty_app().await;
    execute(
        &app,
        command(json!({"type": "create_product_type", "payload": [{"sku": 7}]})),
    )
    .await
    .unwrap();

    let ragged = command(json!({
        "type": "create_warehouse",
        "payload": {"layout": [[true, false], [true]]},
    }));
    let err = execute(&app, ragged).await.unwrap_err();
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn create_request_accepts_and_enqueues() {
    let app = empty_app().await;

    let order = command(json!({
        "type": "create_request",
        "payload": {"request": {"7": 3}},
    }));
    let reply = execute(&app, order).await.unwrap();
    assert_eq!(reply["code"], 201);
    assert_eq!(reply["message"], "ACCEPTED");
    assert!(reply.get("data").is_none(), "outbox was empty");

    let book = app.book.lock();
    assert_eq!(book.waiting_count(7), 3);
    assert_eq!(book.fifo_len(), 1);
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let app = empty_app().await;

    let order = command(json!({
        "type": "create_request",
        "payload": {"request": {"7": 0}},
    }));
    let err = execute(&app, order).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn run_spaces_synthetic_orders() {
    let app = empty_app().await;
    execute(
        &app,
        command(json!({"type": "create_product_type", "payload": [{"sku": 7}]})),
    )
    .await
    .unwrap();

    let reply = execute(&app, command(json!({"type": "run"}))).await.unwrap();
    assert_eq!(reply["code"], 103);
    assert_eq!(app.book.lock().fifo_len(), 1, "first run generates");

    execute(&app, command(json!({"type": "run"}))).await.unwrap();
    assert_eq!(
        app.book.lock().fifo_len(),
        1,
        "33 s spacing suppresses the second synthetic order"
    );
}

#[tokio::test]
async fn run_with_empty_catalog_fails_the_precondition() {
    let app = empty_app().await;
    let err = execute(&app, command(json!({"type": "run"}))).await.unwrap_err();
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn stubbed_commands_answer_not_implemented() {
    let app = empty_app().await;
    for kind in ["server_status", "worker_free_report", "update_warehouse"] {
        let err = execute(&app, command(json!({"type": kind}))).await.unwrap_err();
        assert_eq!(err.code(), 501);
    }
}
