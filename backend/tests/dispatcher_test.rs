//! Dispatcher scenarios over an in-memory floor.


use std::sync::Arc;
use std::time::{Duration, Instant};

use mock_store::MemoryRepository;

use backend::config::AppConfig;
use backend::dispatch::dispatch_once;
use backend::state::{App, SharedApp};
use backend::store::WarehouseStore;
use backend::trigger::{deadline, full_stack};
use warehouse::flags::FlagKind;
use warehouse::{Cell, Product, SelectionRequest};

fn cell(id: i64, x: i64, y: i64, sku: i64, count: i64) -> Cell {
    Cell {
        cell_id: id,
        x,
        y,
        sku: Some(sku),
        count,
        zone_id: None,
    }
}

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

async fn test_app(products: Vec<Product>, cells: Vec<Cell>) -> SharedApp {
    let repo = Arc::new(MemoryRepository::with_inventory(products, cells));
    let store = WarehouseStore::new(repo);
    store.reload_catalog().await.unwrap();
    App::new(test_config(), store)
}

#[tokio::test]
async fn deadline_fires_before_the_stack_threshold() {
    let mut product = Product::with_defaults(1);
    product.max_per_hand = 10;
    let app = test_app(vec![product], vec![cell(1, 1, 1, 1, 20)]).await;

    // two units enqueued at t0, well below max_per_hand
    let t0 = Instant::now();
    app.book
        .lock()
        .enqueue_with_deadline(SelectionRequest::single(1, 2), t0 + Duration::from_secs(10));

    // at t0+6 the deadline watcher is inside its 5 s window; the stack
    // watcher still has nothing
    let catalog = app.store.catalog();
    assert_eq!(
        full_stack::check(&app.book.lock(), &catalog, &app.flags.full_stack),
        None
    );
    assert_eq!(
        deadline::check(
            &mut app.book.lock(),
            &app.flags.deadline,
            t0 + Duration::from_secs(6)
        ),
        Some(1)
    );

    // the dispatcher consumes the deadline flag and leaves the stack clear
    let produced = dispatch_once(&app).await.unwrap();
    assert!(produced);
    assert!(!app.flags.full_stack.is_raised());
    assert!(!app.flags.deadline.is_raised());

    let pushed = app.outbox.pop().expect("route in outbox");
    assert_eq!(pushed.trigger, FlagKind::Deadline);
}

#[tokio::test]
async fn released_demand_turns_into_an_outbox_route() {
    let app = test_app(
        vec![Product::with_defaults(7)],
        vec![cell(1, 1, 1, 7, 5)],
    )
    .await;

    assert!(app.flags.deadline.try_latch(SelectionRequest::single(7, 3)));
    let produced = dispatch_once(&app).await.unwrap();
    assert!(produced);

    let pushed = app.outbox.pop().expect("route in outbox");
    let first = pushed.waypoints.first().unwrap();
    let last = pushed.waypoints.last().unwrap();
    assert_eq!((first.x, first.y), (0, 0));
    assert_eq!((last.x, last.y), (0, 0));
    assert!(pushed.waypoints.iter().any(|s| (s.x, s.y) == (1, 1)));

    // the release went in process; reconciliation has nothing to settle
    // against (the demand never entered the FIFO)
    assert_eq!(app.book.lock().in_process_count(7), 3);
}

#[tokio::test]
async fn uncoverable_demand_leaves_the_outbox_empty() {
    // 4 units of sku 9 on the floor, demand wants 10
    let app = test_app(
        vec![Product::with_defaults(9)],
        vec![cell(1, 2, 2, 9, 2), cell(2, 4, 2, 9, 2)],
    )
    .await;

    assert!(app.flags.deadline.try_latch(SelectionRequest::single(9, 10)));
    let produced = dispatch_once(&app).await.unwrap();
    assert!(!produced);

    assert!(app.outbox.is_empty());
    // the demand stays in process until a later release retries it
    assert_eq!(app.book.lock().in_process_count(9), 10);

    // further ticks with no flag stay quiet
    assert!(!dispatch_once(&app).await.unwrap());
    assert!(app.outbox.is_empty());
}

#[tokio::test]
async fn one_flag_advances_per_tick() {
    let app = test_app(
        vec![Product::with_defaults(1), Product::with_defaults(2)],
        vec![cell(1, 1, 1, 1, 20), cell(2, 3, 1, 2, 20)],
    )
    .await;

    assert!(app.flags.deadline.try_latch(SelectionRequest::single(1, 2)));
    assert!(app.flags.full_stack.try_latch(SelectionRequest::single(2, 4)));

    assert!(dispatch_once(&app).await.unwrap());
    assert!(
        app.flags.full_stack.is_raised(),
        "lower-priority flag must survive the tick"
    );
    assert_eq!(app.outbox.len(), 1);

    assert!(dispatch_once(&app).await.unwrap());
    assert!(!app.flags.full_stack.is_raised());
    assert_eq!(app.outbox.len(), 2);
}

#[tokio::test]
async fn fifo_demand_settles_after_dispatch_and_reconcile() {
    let app = test_app(
        vec![Product::with_defaults(7)],
        vec![cell(1, 1, 1, 7, 5)],
    )
    .await;

    // the order arrives through the book, then the deadline watcher
    // releases it
    let t0 = Instant::now();
    app.book
        .lock()
        .enqueue_with_deadline(SelectionRequest::single(7, 3), t0);
    assert_eq!(
        deadline::check(&mut app.book.lock(), &app.flags.deadline, t0),
        Some(7)
    );

    assert!(dispatch_once(&app).await.unwrap());

    let settled = app.book.lock().reconcile();
    assert_eq!(settled, SelectionRequest::single(7, 3));
    assert_eq!(app.book.lock().fifo_len(), 0);
    assert_eq!(app.book.lock().in_process_count(7), 0);
}
