use serde::{Deserialize, Serialize};

use crate::product::Sku;

pub type CellId = i64;

/// Integer grid coordinate.
pub type Point = (i64, i64);

/// One storage slot. A coordinate present in the cell table is an obstacle
/// for the route builder regardless of its stock level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub cell_id: CellId,
    pub x: i64,
    pub y: i64,

    /// Product currently stored; `None` when the slot is empty.
    pub sku: Option<Sku>,

    pub count: i64,

    pub zone_id: Option<i64>,
}

impl Cell {
    pub fn position(&self) -> Point {
        (self.x, self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.sku.is_none() || self.count <= 0
    }
}
