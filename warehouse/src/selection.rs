use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::product::Sku;

/// A pick order: multiset of sku → positive quantity.
///
/// The map is ordered so that planning runs iterate skus deterministically
/// under a fixed seed. Quantities that drop to zero are removed; an empty
/// request is falsy for the trigger and dispatch paths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionRequest {
    items: BTreeMap<Sku, i64>,
}

impl SelectionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a request from `(sku, count)` pairs, dropping non-positive
    /// counts and summing duplicates.
    pub fn of(items: impl IntoIterator<Item = (Sku, i64)>) -> Self {
        let mut req = Self::new();
        for (sku, count) in items {
            req.add(sku, count);
        }
        req
    }

    pub fn single(sku: Sku, count: i64) -> Self {
        Self::of([(sku, count)])
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, sku: Sku) -> i64 {
        self.items.get(&sku).copied().unwrap_or(0)
    }

    pub fn add(&mut self, sku: Sku, count: i64) {
        if count > 0 {
            *self.items.entry(sku).or_insert(0) += count;
        }
    }

    /// `|=`: adds the other request's counts into this one.
    pub fn merge(&mut self, other: &SelectionRequest) {
        for (&sku, &count) in &other.items {
            self.add(sku, count);
        }
    }

    /// `-=`: subtracts with floor at zero; exhausted skus are removed.
    pub fn saturating_sub(&mut self, other: &SelectionRequest) {
        for (&sku, &count) in &other.items {
            if let Some(have) = self.items.get_mut(&sku) {
                *have -= count;
                if *have <= 0 {
                    self.items.remove(&sku);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sku, i64)> + '_ {
        self.items.iter().map(|(&sku, &count)| (sku, count))
    }

    pub fn skus(&self) -> impl Iterator<Item = Sku> + '_ {
        self.items.keys().copied()
    }

    pub fn total_units(&self) -> i64 {
        self.items.values().sum()
    }
}

impl FromIterator<(Sku, i64)> for SelectionRequest {
    fn from_iter<T: IntoIterator<Item = (Sku, i64)>>(iter: T) -> Self {
        Self::of(iter)
    }
}
