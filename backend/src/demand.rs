use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use warehouse::{Product, SelectionRequest, WarehouseError};

/// Builds a random self-test order: one to eight distinct products, one to
/// five units each. Used by the `run` command to exercise the pipeline
/// without a live client fleet.
pub fn generate_request(
    products: &[Product],
    rng: &mut impl Rng,
) -> Result<SelectionRequest, WarehouseError> {
    if products.is_empty() {
        return Err(WarehouseError::EmptyListOfProducts);
    }

    let size = rng.gen_range(1..=8usize).min(products.len());
    let picked: Vec<&Product> = products.choose_multiple(rng, size).collect();

    let request = SelectionRequest::of(
        picked
            .into_iter()
            .map(|p| (p.sku, rng.gen_range(1..=5i64))),
    );

    debug!(order = ?request, "synthetic order generated");
    Ok(request)
}
