//! Warehouse scale classification and DBSCAN parameter tuning.
//!
//! The clusterizer does not expose ε / min-samples directly; both are
//! derived from the cell count and grid density so that the same code
//! serves a ten-cell test floor and a ten-thousand-cell hall.

/// Discrete warehouse scale, classified by storage-cell count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeType {
    Tiny,
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl SizeType {
    pub fn classify(num_cells: usize) -> Self {
        match num_cells {
            n if n < 50 => SizeType::Tiny,
            n if n < 2_000 => SizeType::Small,
            n if n < 7_000 => SizeType::Medium,
            n if n < 10_000 => SizeType::Large,
            _ => SizeType::ExtraLarge,
        }
    }

    /// Base DBSCAN parameters for this scale, before density adjustment.
    fn base_params(self) -> DbscanParams {
        let (eps, min_samples) = match self {
            SizeType::Tiny => (2.0, 2),
            SizeType::Small => (3.0, 3),
            SizeType::Medium => (5.0, 4),
            SizeType::Large => (7.0, 5),
            SizeType::ExtraLarge => (10.0, 6),
        };
        DbscanParams { eps, min_samples }
    }
}

/// Tuned DBSCAN parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DbscanParams {
    pub eps: f64,
    pub min_samples: usize,
}

/// Classifies the warehouse and tunes DBSCAN to its scale and density.
///
/// Dense floors (> 0.5 cells per grid point) pull ε in by 20%; sparse
/// floors (< 0.2) push it out by 20%. ε is rounded to two decimals.
pub fn tune(num_cells: usize, area: i64) -> (SizeType, DbscanParams) {
    let size_type = SizeType::classify(num_cells);
    let mut params = size_type.base_params();

    let density = if area > 0 {
        num_cells as f64 / area as f64
    } else {
        0.0
    };

    if density > 0.5 {
        params.eps *= 0.8;
    } else if density < 0.2 {
        params.eps *= 1.2;
    }
    params.eps = (params.eps * 100.0).round() / 100.0;

    (size_type, params)
}
