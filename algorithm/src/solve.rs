//! The planning pipeline: cluster scoring → cell selection → route build.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

use warehouse::{Cell, CellId, SelectionRequest, WarehouseView};

use crate::annealing::DEFAULT_ITERATIONS;
use crate::clusterizer::Cluster;
use crate::error::PlanError;
use crate::route::{Route, build_route};
use crate::selector::{CellSelector, SelectorSettings};

/// End-to-end planning knobs. `seed` pins the RNG for reproducible runs;
/// production leaves it unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanSettings {
    pub selector: SelectorSettings,
    pub annealing_iterations: usize,
    pub seed: Option<u64>,
}

impl PlanSettings {
    fn iterations(&self) -> usize {
        if self.annealing_iterations == 0 {
            DEFAULT_ITERATIONS
        } else {
            self.annealing_iterations
        }
    }
}

/// Picks the clusters worth searching for `demand`.
///
/// Per sku, a cluster qualifies when its score clears twice the required
/// quantity. A sparse floor may feed a feasible order without any cluster
/// clearing that bar; those skus fall back to every cluster stocking them.
pub fn choose_clusters<'a>(
    clusters: &'a [Cluster],
    demand: &SelectionRequest,
) -> Vec<&'a Cluster> {
    let mut chosen: BTreeSet<i64> = BTreeSet::new();

    for (sku, required) in demand.iter() {
        let threshold = 2.0 * required as f64;

        let passing: Vec<&Cluster> = clusters
            .iter()
            .filter(|c| c.score_for_sku(sku) > threshold)
            .collect();

        if passing.is_empty() {
            debug!(sku, threshold, "no cluster clears the bar; widening");
            chosen.extend(
                clusters
                    .iter()
                    .filter(|c| c.score_for_sku(sku) > 0.0)
                    .map(|c| c.id()),
            );
        } else {
            chosen.extend(passing.iter().map(|c| c.id()));
        }
    }

    clusters
        .iter()
        .filter(|c| chosen.contains(&c.id()))
        .collect()
}

/// Flattens the chosen clusters into the selector's candidate map.
fn candidate_cells(clusters: &[&Cluster]) -> BTreeMap<CellId, Cell> {
    clusters
        .iter()
        .flat_map(|c| c.cells())
        .map(|cell| (cell.cell_id, cell.clone()))
        .collect()
}

/// Runs the full pipeline for one released demand.
///
/// `Ok(None)` means the demand cannot be covered from the current floor
/// (no route is produced and the demand stays in process); `Err` carries a
/// structural routing failure.
#[instrument(skip(view, clusters, demand, settings), target = "planner",
             fields(skus = demand.len(), units = demand.total_units()))]
pub fn solve(
    view: &WarehouseView,
    clusters: &[Cluster],
    demand: &SelectionRequest,
    settings: &PlanSettings,
) -> Result<Option<Route>, PlanError> {
    if demand.is_empty() {
        return Ok(None);
    }
    if clusters.is_empty() {
        return Err(PlanError::NoCells);
    }

    let chosen = choose_clusters(clusters, demand);
    let candidates = candidate_cells(&chosen);
    debug!(
        clusters = chosen.len(),
        candidates = candidates.len(),
        "candidate region assembled"
    );

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let selector = CellSelector::new(&candidates);
    let picked = selector.evolve(demand, &settings.selector, &mut rng);
    if picked.is_empty() {
        info!("demand not coverable from the chosen clusters");
        return Ok(None);
    }

    let cells: Vec<Cell> = picked
        .iter()
        .filter_map(|id| candidates.get(id))
        .cloned()
        .collect();

    let route = build_route(view, &cells, settings.iterations(), &mut rng)?;
    info!(
        cells = cells.len(),
        steps = route.length(),
        "route planned"
    );
    Ok(Some(route))
}
