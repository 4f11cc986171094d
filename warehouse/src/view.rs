use std::collections::{HashMap, HashSet};

use crate::cell::{Cell, CellId, Point};
use crate::product::{Product, Sku};

/// Read-only projection of warehouse geometry and stock.
///
/// A planning run owns its view by value, so the snapshot stays consistent
/// across the cluster → select → route stages without holding any lock.
#[derive(Clone, Debug, Default)]
pub struct WarehouseView {
    width: i64,
    height: i64,
    start: Point,

    cells: Vec<Cell>,

    /// Coordinates occupied by a cell (obstacles).
    occupied: HashSet<Point>,

    /// Indexes into `cells`, keyed by stored sku.
    by_sku: HashMap<Sku, Vec<usize>>,
    by_id: HashMap<CellId, usize>,

    products: HashMap<Sku, Product>,
}

impl WarehouseView {
    /// Captures a snapshot. Dimensions are the inclusive maxima of the
    /// stored coordinates.
    pub fn new(cells: Vec<Cell>, products: Vec<Product>, start: Point) -> Self {
        let width = cells.iter().map(|c| c.x).max().unwrap_or(0);
        let height = cells.iter().map(|c| c.y).max().unwrap_or(0);

        let mut occupied = HashSet::with_capacity(cells.len());
        let mut by_sku: HashMap<Sku, Vec<usize>> = HashMap::new();
        let mut by_id = HashMap::with_capacity(cells.len());

        for (idx, cell) in cells.iter().enumerate() {
            occupied.insert(cell.position());
            by_id.insert(cell.cell_id, idx);
            if let Some(sku) = cell.sku {
                by_sku.entry(sku).or_default().push(idx);
            }
        }

        Self {
            width,
            height,
            start,
            cells,
            occupied,
            by_sku,
            by_id,
            products: products.into_iter().map(|p| (p.sku, p)).collect(),
        }
    }

    pub fn dimensions(&self) -> (i64, i64) {
        (self.width, self.height)
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    pub fn all_cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_by_sku(&self, sku: Sku) -> impl Iterator<Item = &Cell> + '_ {
        self.by_sku
            .get(&sku)
            .into_iter()
            .flatten()
            .map(|&idx| &self.cells[idx])
    }

    pub fn cell_by_id(&self, cell_id: CellId) -> Option<&Cell> {
        self.by_id.get(&cell_id).map(|&idx| &self.cells[idx])
    }

    pub fn product(&self, sku: Sku) -> Option<&Product> {
        self.products.get(&sku)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.products.values()
    }

    /// Whether a picker may traverse `p`.
    ///
    /// The grid has a hard origin edge; space past the bounding box counts
    /// as walkable aisle. In range, any celled coordinate is an obstacle.
    pub fn is_walkable(&self, p: Point) -> bool {
        let (x, y) = p;
        if x < 0 || y < 0 {
            return false;
        }
        if x > self.width || y > self.height {
            return true;
        }
        !self.occupied.contains(&p)
    }

    /// Total units of `sku` on the floor.
    pub fn stock_of(&self, sku: Sku) -> i64 {
        self.cells_by_sku(sku).map(|c| c.count).sum()
    }
}
