//! The framed JSON protocol.
//!
//! Every client frame carries `auth` and usually `type`. The command set is
//! a tagged enum matched exhaustively; the payload shapes mirror the wire
//! contract, with optional fields defaulted at the handler level.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use warehouse::Sku;

use crate::error::AppError;
use crate::outbox::RouteMessage;

/// Command names the protocol understands; anything else is a teapot.
const KNOWN_COMMANDS: &[&str] = &[
    "create_warehouse",
    "create_product_type",
    "delete_product_type",
    "list_product_types",
    "create_request",
    "run",
    "server_status",
    "worker_free_report",
    "update_warehouse",
];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CreateWarehouse { payload: CreateWarehousePayload },
    CreateProductType { payload: Vec<ProductPayload> },
    DeleteProductType { payload: DeleteProductsPayload },
    ListProductTypes,
    CreateRequest { payload: CreateRequestPayload },
    Run,
    ServerStatus,
    WorkerFreeReport,
    UpdateWarehouse,
}

#[derive(Debug, Deserialize)]
pub struct CreateWarehousePayload {
    /// `true` = storage cell, `false` = aisle.
    pub layout: Vec<Vec<bool>>,

    pub add_workers: Option<i64>,
    pub remove_workers: Option<i64>,
    pub workers_count: Option<i64>,

    pub filling_rules: Option<FillRulesPayload>,
}

#[derive(Debug, Deserialize)]
pub struct FillRulesPayload {
    pub empty_cell_ratio: Option<f64>,
    pub heavily_filled_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    /// Entries without a sku are skipped, not rejected.
    pub sku: Option<Sku>,
    pub name: Option<String>,
    pub time_to_select: Option<f64>,
    pub time_to_ship: Option<f64>,
    pub max_amount: Option<i64>,
    pub max_per_hand: Option<i64>,
    pub product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductsPayload {
    pub skus: Vec<Sku>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestPayload {
    pub request: BTreeMap<Sku, i64>,
}

/// What a raw frame turned out to be, after the auth gate.
#[derive(Debug)]
pub enum Inbound {
    /// Valid auth, no `type`: answered `100 ok`.
    NoType,
    Command(Command),
    Unknown,
    Invalid(String),
}

pub fn parse_frame(value: &Value) -> Inbound {
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return Inbound::NoType;
    };

    if !KNOWN_COMMANDS.contains(&kind) {
        return Inbound::Unknown;
    }

    match serde_json::from_value::<Command>(value.clone()) {
        Ok(cmd) => Inbound::Command(cmd),
        Err(e) => Inbound::Invalid(e.to_string()),
    }
}

pub fn response(code: u16, status: &str, message: impl Into<String>) -> Value {
    json!({
        "type": "response",
        "code": code,
        "status": status,
        "message": message.into(),
    })
}

pub fn response_with_data(
    code: u16,
    status: &str,
    message: impl Into<String>,
    data: Value,
) -> Value {
    json!({
        "type": "response",
        "code": code,
        "status": status,
        "message": message.into(),
        "data": data,
    })
}

pub fn error_frame(err: &AppError) -> Value {
    response(err.code(), "error", err.public_message())
}

/// Server-initiated delivery of a computed route.
pub fn request_frame(message: &RouteMessage) -> Value {
    json!({
        "type": "request",
        "message": "pick route released",
        "data": {
            "worker_id": "UNDEFINED",
            "moving_cells": [message.waypoints],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_command_parses() {
        let frame = json!({
            "type": "create_product_type",
            "auth": "s",
            "payload": [{"sku": 7, "max_per_hand": 10}],
        });
        match parse_frame(&frame) {
            Inbound::Command(Command::CreateProductType { payload }) => {
                assert_eq!(payload.len(), 1);
                assert_eq!(payload[0].sku, Some(7));
                assert_eq!(payload[0].max_per_hand, Some(10));
                assert_eq!(payload[0].name, None);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn missing_type_is_a_keepalive() {
        assert!(matches!(
            parse_frame(&json!({"auth": "s"})),
            Inbound::NoType
        ));
    }

    #[test]
    fn unknown_type_is_a_teapot() {
        assert!(matches!(
            parse_frame(&json!({"auth": "s", "type": "brew_coffee"})),
            Inbound::Unknown
        ));
    }

    #[test]
    fn known_type_with_broken_payload_is_invalid() {
        let frame = json!({
            "type": "create_warehouse",
            "auth": "s",
            "payload": {"layout": "not-a-grid"},
        });
        assert!(matches!(parse_frame(&frame), Inbound::Invalid(_)));
    }

    #[test]
    fn request_payload_keys_arrive_as_strings() {
        let frame = json!({
            "type": "create_request",
            "auth": "s",
            "payload": {"request": {"7": 3, "9": 1}},
        });
        match parse_frame(&frame) {
            Inbound::Command(Command::CreateRequest { payload }) => {
                assert_eq!(payload.request.get(&7), Some(&3));
                assert_eq!(payload.request.get(&9), Some(&1));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn run_parses_without_payload() {
        assert!(matches!(
            parse_frame(&json!({"auth": "s", "type": "run"})),
            Inbound::Command(Command::Run)
        ));
    }
}
