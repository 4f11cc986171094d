//! Evolutionary cell selection.
//!
//! Given a released sub-demand and the candidate cells of the chosen
//! clusters, the selector searches for a small, spatially compact set of
//! cells whose stock covers the demand. The search is elitist: each
//! generation keeps the best individual verbatim and fills the rest of the
//! population with mutations of it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use warehouse::{Cell, CellId, SelectionRequest, Sku};

/// Search knobs. Operating ranges: population 100–300, generations
/// 1000–1600, mutation rate 0.30–0.33.
#[derive(Clone, Copy, Debug)]
pub struct SelectorSettings {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            population_size: 160,
            generations: 1_200,
            mutation_rate: 0.32,
        }
    }
}

/// One individual: the ids of the selected cells.
type Individual = BTreeSet<CellId>;

/// Evolutionary search over a fixed candidate cell map.
pub struct CellSelector<'a> {
    cells: &'a BTreeMap<CellId, Cell>,

    /// Candidate cell ids per sku, in id order.
    locations: BTreeMap<Sku, Vec<CellId>>,
}

impl<'a> CellSelector<'a> {
    pub fn new(cells: &'a BTreeMap<CellId, Cell>) -> Self {
        let mut locations: BTreeMap<Sku, Vec<CellId>> = BTreeMap::new();
        for (&cell_id, cell) in cells {
            if let Some(sku) = cell.sku {
                if cell.count > 0 {
                    locations.entry(sku).or_default().push(cell_id);
                }
            }
        }
        Self { cells, locations }
    }

    /// Runs the search. Returns the best-ever individual, or an empty set
    /// when the candidates cannot cover `order`.
    pub fn evolve(
        &self,
        order: &SelectionRequest,
        settings: &SelectorSettings,
        rng: &mut impl Rng,
    ) -> Individual {
        if order.is_empty() {
            return Individual::new();
        }

        let mut population = Vec::with_capacity(settings.population_size);
        for _ in 0..settings.population_size.max(1) {
            match self.generate_valid_solution(order, rng) {
                Some(individual) => population.push(individual),
                // one sku short of stock fails the whole release
                None => return Individual::new(),
            }
        }
        let mut fitness: Vec<f64> = population.iter().map(|s| self.fitness(s)).collect();

        let mut best_sol = Individual::new();
        let mut best_fit = f64::INFINITY;

        for generation in 0..settings.generations {
            let idx = argmin(&fitness);
            if fitness[idx] < best_fit {
                best_fit = fitness[idx];
                best_sol = population[idx].clone();
                debug!(generation, best_fit, cells = best_sol.len(), "new best");
            }

            let mut new_pop = Vec::with_capacity(settings.population_size);
            let mut new_fit = Vec::with_capacity(settings.population_size);
            new_pop.push(best_sol.clone());
            new_fit.push(best_fit);

            for _ in 1..settings.population_size.max(1) {
                let child = self.mutate(&best_sol, order, settings.mutation_rate, rng);
                let f = self.fitness(&child);
                new_pop.push(child);
                new_fit.push(f);
            }

            population = new_pop;
            fitness = new_fit;
        }

        let idx = argmin(&fitness);
        if fitness[idx] < best_fit {
            best_sol = population[idx].clone();
        }
        best_sol
    }

    /// Greedy randomized constructor: skus in random order, candidate cells
    /// in random order, cells already in the selection preferred. A local
    /// availability map is drained as cells are taken. `None` when some sku
    /// cannot be satisfied.
    fn generate_valid_solution(
        &self,
        order: &SelectionRequest,
        rng: &mut impl Rng,
    ) -> Option<Individual> {
        let mut selected = Individual::new();
        let mut available: HashMap<CellId, i64> =
            self.cells.iter().map(|(&id, c)| (id, c.count)).collect();

        let mut items: Vec<(Sku, i64)> = order.iter().collect();
        items.shuffle(rng);

        for (sku, mut needed) in items {
            let mut possible = self.locations.get(&sku).cloned().unwrap_or_default();
            possible.shuffle(rng);

            let (preferred, others): (Vec<CellId>, Vec<CellId>) =
                possible.into_iter().partition(|id| selected.contains(id));

            for cell_id in preferred.into_iter().chain(others) {
                if needed <= 0 {
                    break;
                }
                let Some(stock) = available.get_mut(&cell_id) else {
                    continue;
                };
                if *stock <= 0 {
                    continue;
                }
                let take = needed.min(*stock);
                *stock -= take;
                needed -= take;
                selected.insert(cell_id);
            }

            if needed > 0 {
                return None;
            }
        }

        Some(selected)
    }

    /// Minimized fitness: spread around the selection centroid plus a small
    /// cardinality penalty. Empty selections are infinitely unfit.
    fn fitness(&self, individual: &Individual) -> f64 {
        if individual.is_empty() {
            return f64::INFINITY;
        }

        let coords: Vec<(f64, f64)> = individual
            .iter()
            .filter_map(|id| self.cells.get(id))
            .map(|c| (c.x as f64, c.y as f64))
            .collect();

        let n = coords.len() as f64;
        let cx = coords.iter().map(|(x, _)| x).sum::<f64>() / n;
        let cy = coords.iter().map(|(_, y)| y).sum::<f64>() / n;

        let total: f64 = coords
            .iter()
            .map(|(x, y)| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt())
            .sum();
        let average = total / n;
        let penalty = n * 0.1;

        total + average + penalty
    }

    /// With probability `rate`, drops the cells serving one random sku and
    /// regenerates them; everything else is kept. A failed regeneration
    /// returns the parent unchanged.
    fn mutate(
        &self,
        parent: &Individual,
        order: &SelectionRequest,
        rate: f64,
        rng: &mut impl Rng,
    ) -> Individual {
        if parent.is_empty() || rng.gen_range(0.0..1.0) > rate {
            return parent.clone();
        }

        let mut present: BTreeSet<Sku> = BTreeSet::new();
        for &cell_id in parent {
            if let Some(sku) = self.cells.get(&cell_id).and_then(|c| c.sku) {
                if order.get(sku) > 0 {
                    present.insert(sku);
                }
            }
        }
        if present.is_empty() {
            return parent.clone();
        }

        let skus: Vec<Sku> = present.into_iter().collect();
        let &sku = skus.choose(rng).expect("non-empty above");

        let keep: Individual = parent
            .iter()
            .copied()
            .filter(|id| self.cells.get(id).and_then(|c| c.sku) != Some(sku))
            .collect();

        let sub_order = SelectionRequest::single(sku, order.get(sku));
        match self.generate_valid_solution(&sub_order, rng) {
            Some(regenerated) => keep.union(&regenerated).copied().collect(),
            None => parent.clone(),
        }
    }
}

fn argmin(fitness: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &f) in fitness.iter().enumerate() {
        if f < fitness[best] {
            best = idx;
        }
    }
    best
}

/// Coverage check: the selected cells must stock at least the demanded
/// quantity of every sku.
pub fn covers(
    cells: &BTreeMap<CellId, Cell>,
    selection: &BTreeSet<CellId>,
    order: &SelectionRequest,
) -> bool {
    order.iter().all(|(sku, needed)| {
        let stocked: i64 = selection
            .iter()
            .filter_map(|id| cells.get(id))
            .filter(|c| c.sku == Some(sku))
            .map(|c| c.count)
            .sum();
        stocked >= needed
    })
}
