//! Command handlers. Each returns the success frame; the connection loop
//! converts `AppError` into the error frame.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tracing::{info, instrument};

use warehouse::{Product, SelectionRequest, WarehouseError};

use crate::demand::generate_request;
use crate::error::AppError;
use crate::server::protocol::{
    Command, CreateRequestPayload, CreateWarehousePayload, DeleteProductsPayload,
    ProductPayload, response, response_with_data,
};
use crate::state::SharedApp;
use crate::store::FillRules;

pub async fn execute(app: &SharedApp, command: Command) -> Result<Value, AppError> {
    match command {
        Command::CreateWarehouse { payload } => create_warehouse(app, payload).await,
        Command::CreateProductType { payload } => create_products(app, payload).await,
        Command::DeleteProductType { payload } => delete_products(app, payload).await,
        Command::ListProductTypes => list_products(app).await,
        Command::CreateRequest { payload } => create_request(app, payload),
        Command::Run => run(app).await,
        Command::ServerStatus | Command::WorkerFreeReport | Command::UpdateWarehouse => {
            Err(AppError::NotImplemented)
        }
    }
}

#[instrument(skip(app, payload), target = "handlers")]
async fn create_warehouse(
    app: &SharedApp,
    payload: CreateWarehousePayload,
) -> Result<Value, AppError> {
    // products must exist before the floor can be pre-filled
    app.store.reload_catalog().await?;
    if app.store.catalog_len() == 0 {
        return Err(WarehouseError::EmptyListOfProducts.into());
    }

    let cells = app.store.build_layout(&payload.layout).await?;

    {
        let mut roster = app.roster.lock();
        if let Some(n) = payload.add_workers {
            roster.add(n)?;
        }
        if let Some(n) = payload.remove_workers {
            roster.remove(n)?;
        }
        if let Some(n) = payload.workers_count {
            roster.set(n)?;
        }
    }

    let mut rules = FillRules::default();
    if let Some(overrides) = payload.filling_rules {
        if let Some(ratio) = overrides.empty_cell_ratio {
            rules.empty_cell_ratio = ratio;
        }
        if let Some(ratio) = overrides.heavily_filled_ratio {
            rules.heavily_filled_ratio = ratio;
        }
    }

    let mut rng = match app.config.plan_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    app.store.fill(&rules, &mut rng).await?;

    // the floor changed shape: retune and drop the cached clusters
    let view = app.store.snapshot_view(app.config.start_point).await?;
    app.clusterizer.lock().analyze(&view);

    info!(cells, "warehouse created and pre-filled");
    Ok(response(201, "ok", "warehouse created and pre-filled"))
}

async fn create_products(
    app: &SharedApp,
    payload: Vec<ProductPayload>,
) -> Result<Value, AppError> {
    let mut created = Vec::new();

    for entry in payload {
        let Some(sku) = entry.sku else {
            continue;
        };

        let mut product = Product::with_defaults(sku);
        if let Some(name) = entry.name {
            product.name = name;
        }
        if let Some(v) = entry.time_to_select {
            product.time_to_select = v;
        }
        if let Some(v) = entry.time_to_ship {
            product.time_to_ship = v;
        }
        if let Some(v) = entry.max_amount {
            product.max_amount = v;
        }
        if let Some(v) = entry.max_per_hand {
            product.max_per_hand = v;
        }
        product.product_type = entry.product_type;

        app.store.upsert_product(&product).await?;
        created.push(sku);
    }

    info!(skus = ?created, "products upserted");
    Ok(response(201, "ok", format!("created products {created:?}")))
}

async fn delete_products(
    app: &SharedApp,
    payload: DeleteProductsPayload,
) -> Result<Value, AppError> {
    let deleted = app.store.delete_products(&payload.skus).await?;
    Ok(response(202, "ok", format!("deleted products {deleted:?}")))
}

async fn list_products(app: &SharedApp) -> Result<Value, AppError> {
    let products = app.store.list_products().await?;
    let count = products.len();
    Ok(response_with_data(
        200,
        "ok",
        format!("found {count} product types"),
        json!({ "products": products }),
    ))
}

/// Client-submitted pick order: enqueues it and opportunistically carries
/// the outbox head back in the same frame.
fn create_request(app: &SharedApp, payload: CreateRequestPayload) -> Result<Value, AppError> {
    if payload.request.is_empty() {
        return Err(AppError::Validation("empty order".into()));
    }
    if payload.request.values().any(|&count| count <= 0) {
        return Err(AppError::Validation(
            "order quantities must be positive".into(),
        ));
    }

    let order = SelectionRequest::of(payload.request.iter().map(|(&sku, &n)| (sku, n)));
    app.book.lock().enqueue(order);

    match app.outbox.pop() {
        Some(ready) => Ok(response_with_data(
            201,
            "ok",
            "ACCEPTED",
            json!({ "moving_cells": [ready.waypoints] }),
        )),
        None => Ok(response(201, "ok", "ACCEPTED")),
    }
}

/// Self-test tick: spaces synthetic orders 33 s apart, then reports the
/// next computed route if one is waiting.
async fn run(app: &SharedApp) -> Result<Value, AppError> {
    let due = {
        let last = app.last_synthetic.lock();
        last.map_or(true, |at| at.elapsed() >= app.config.synthetic_request_every)
    };

    if due {
        let products = app.store.list_products().await?;
        let mut rng = match app.config.plan_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let order = generate_request(&products, &mut rng)?;

        app.book.lock().enqueue(order);
        *app.last_synthetic.lock() = Some(Instant::now());
    }

    match app.outbox.pop() {
        Some(ready) => Ok(response_with_data(
            103,
            "ok",
            "pick route released",
            json!({ "worker_id": "UNDEFINED", "moving_cells": [ready.waypoints] }),
        )),
        None => Ok(response(103, "ok", "no route ready")),
    }
}
