use thiserror::Error;

use warehouse::Point;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A\* exhausted its search between two consecutive stops.
    #[error("no traversable path from {from:?} to {to:?}")]
    NoRoute { from: Point, to: Point },

    /// The warehouse holds no stocked cells to cluster.
    #[error("no stocked cells to plan over")]
    NoCells,
}
