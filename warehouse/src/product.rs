use serde::{Deserialize, Serialize};

/// Stable integer key of a product (stock-keeping unit).
pub type Sku = i64;

/// One catalog entry. Immutable after creation; identity is the sku alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub sku: Sku,

    pub name: String,

    /// Seconds a picker spends taking one unit out of a cell.
    pub time_to_select: f64,

    /// Seconds per unit at the packing bench.
    pub time_to_ship: f64,

    /// Per-cell capacity for this product.
    pub max_amount: i64,

    /// In-wait units that fill one picker's hands. Reaching this count arms
    /// the full-stack trigger.
    pub max_per_hand: i64,

    /// Category tag; feeds the clusterizer's feature vector.
    pub product_type: Option<String>,
}

impl Product {
    /// Catalog defaults applied when the ingest payload omits a field.
    pub fn with_defaults(sku: Sku) -> Self {
        Self {
            sku,
            name: format!("PRODUCT{sku}"),
            time_to_select: 1.0,
            time_to_ship: 1.0,
            max_amount: 64,
            max_per_hand: 8,
            product_type: None,
        }
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.sku == other.sku
    }
}

impl Eq for Product {}

impl std::hash::Hash for Product {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sku.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_is_sku_only() {
        let mut a = Product::with_defaults(7);
        let mut b = Product::with_defaults(7);
        a.name = "left".into();
        b.name = "right".into();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn defaults_match_catalog_rules() {
        let p = Product::with_defaults(12);
        assert_eq!(p.name, "PRODUCT12");
        assert_eq!(p.max_amount, 64);
        assert_eq!(p.max_per_hand, 8);
        assert!(p.product_type.is_none());
    }
}
