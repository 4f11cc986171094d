//! DBSCAN front end over the warehouse floor.
//!
//! Cells are clustered in a five-dimensional feature space (position,
//! fill ratio, product category, distance to the start point) so that a
//! cluster groups cells that are both spatially close and stock-wise
//! similar. Aggregates are cached on construction; the dispatcher scores
//! clusters per sku without touching the cells again.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use warehouse::{Cell, CellId, Point, Sku, WarehouseView};

use crate::dbscan::dbscan;
use crate::sizing::{DbscanParams, SizeType, tune};

/// DBSCAN-produced group of cells with cached per-sku aggregates.
///
/// Immutable once built; the clusterizer rebuilds the whole set on
/// invalidation.
#[derive(Clone, Debug)]
pub struct Cluster {
    id: i64,
    cells: Vec<Cell>,
    product_counts: HashMap<Sku, i64>,
    fill_ratios: HashMap<Sku, f64>,
    centroid: (f64, f64),
}

impl Cluster {
    fn build(id: i64, cells: Vec<Cell>, view: &WarehouseView) -> Self {
        let mut product_counts: HashMap<Sku, i64> = HashMap::new();
        let mut fill_ratios: HashMap<Sku, f64> = HashMap::new();
        let mut total_x = 0i64;
        let mut total_y = 0i64;

        for cell in &cells {
            total_x += cell.x;
            total_y += cell.y;

            let Some(sku) = cell.sku else { continue };
            *product_counts.entry(sku).or_insert(0) += cell.count;

            let max_amount = view
                .product(sku)
                .map(|p| p.max_amount)
                .filter(|&m| m > 0)
                .unwrap_or(1);
            *fill_ratios.entry(sku).or_insert(0.0) += cell.count as f64 / max_amount as f64;
        }

        let n = cells.len().max(1) as f64;
        Self {
            id,
            cells,
            product_counts,
            fill_ratios,
            centroid: (total_x as f64 / n, total_y as f64 / n),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    /// Dimensionless preference score: stocked units plus accumulated fill
    /// ratio of `sku` across the cluster.
    pub fn score_for_sku(&self, sku: Sku) -> f64 {
        let count = self.product_counts.get(&sku).copied().unwrap_or(0);
        let fill = self.fill_ratios.get(&sku).copied().unwrap_or(0.0);
        count as f64 + fill
    }

    /// Euclidean distance from the cluster centroid to `p`.
    pub fn distance_to(&self, p: Point) -> f64 {
        let (cx, cy) = self.centroid;
        ((cx - p.0 as f64).powi(2) + (cy - p.1 as f64).powi(2)).sqrt()
    }

    pub fn contains_cell(&self, cell_id: CellId) -> bool {
        self.cells.iter().any(|c| c.cell_id == cell_id)
    }
}

/// Auto-tuning clusterizer. Holds the tuned parameters and the cached
/// cluster set; recomputes on the first query after an invalidation or a
/// reanalyze call.
#[derive(Debug, Default)]
pub struct Clusterizer {
    size_type: Option<SizeType>,
    params: Option<DbscanParams>,
    clusters: Option<Vec<Cluster>>,
}

impl Clusterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-tunes ε / min-samples to the warehouse scale and drops the cached
    /// clusters. Returns the classified scale.
    pub fn analyze(&mut self, view: &WarehouseView) -> SizeType {
        let (width, height) = view.dimensions();
        let num_cells = view.all_cells().len();

        let (size_type, params) = tune(num_cells, width * height);
        debug!(
            ?size_type,
            eps = params.eps,
            min_samples = params.min_samples,
            num_cells,
            "clusterizer retuned"
        );

        self.size_type = Some(size_type);
        self.params = Some(params);
        self.clusters = None;
        size_type
    }

    /// Marks the cached clusters stale after an inventory mutation.
    pub fn invalidate(&mut self) {
        self.clusters = None;
    }

    pub fn size_type(&self) -> Option<SizeType> {
        self.size_type
    }

    /// Current clusters of `view`, computing them if stale. Empty when the
    /// floor has no stocked cells.
    pub fn clusters(&mut self, view: &WarehouseView) -> &[Cluster] {
        if self.params.is_none() {
            self.analyze(view);
        }
        if self.clusters.is_none() {
            let params = self.params.expect("tuned above");
            self.clusters = Some(clusterize(view, params));
        }
        self.clusters.as_deref().expect("computed above")
    }
}

/// Runs DBSCAN over the stocked cells of `view` and materializes one
/// [`Cluster`] per label. Noise keeps its −1 label as a cluster of its own.
fn clusterize(view: &WarehouseView, params: DbscanParams) -> Vec<Cluster> {
    let stocked: Vec<&Cell> = view
        .all_cells()
        .iter()
        .filter(|c| c.count > 0 && c.sku.is_some())
        .collect();

    if stocked.is_empty() {
        warn!("no stocked cells; clusterizer produced nothing");
        return Vec::new();
    }

    let type_codes = encode_product_types(view, &stocked);
    let (sx, sy) = view.start_point();

    let features: Vec<Vec<f64>> = stocked
        .iter()
        .map(|cell| {
            let sku = cell.sku.expect("stocked cells carry a sku");
            let max_amount = view
                .product(sku)
                .map(|p| p.max_amount)
                .filter(|&m| m > 0)
                .unwrap_or(1);
            let fill_ratio = cell.count as f64 / max_amount as f64 * 100.0;
            let type_code = view
                .product(sku)
                .and_then(|p| p.product_type.as_deref())
                .map(|t| type_codes[t] as f64)
                .unwrap_or(-1.0);
            let dist_to_start =
                (((cell.x - sx).pow(2) + (cell.y - sy).pow(2)) as f64).sqrt();

            vec![
                cell.x as f64,
                cell.y as f64,
                fill_ratio,
                type_code,
                dist_to_start,
            ]
        })
        .collect();

    let labels = dbscan(&features, params.eps, params.min_samples);

    let mut grouped: BTreeMap<i64, Vec<Cell>> = BTreeMap::new();
    for (cell, &label) in stocked.iter().zip(&labels) {
        grouped.entry(label).or_default().push((*cell).clone());
    }

    grouped
        .into_iter()
        .map(|(label, cells)| Cluster::build(label, cells, view))
        .collect()
}

/// Stable non-negative code per distinct product-type string
/// (lexicographic assignment). Untyped products encode as −1 in the
/// feature vector.
fn encode_product_types(view: &WarehouseView, stocked: &[&Cell]) -> HashMap<String, usize> {
    let distinct: BTreeSet<&str> = stocked
        .iter()
        .filter_map(|c| c.sku)
        .filter_map(|sku| view.product(sku))
        .filter_map(|p| p.product_type.as_deref())
        .collect();

    distinct
        .into_iter()
        .enumerate()
        .map(|(code, name)| (name.to_string(), code))
        .collect()
}
