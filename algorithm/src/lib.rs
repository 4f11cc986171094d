//! CPU-bound planning pipeline: cluster the floor, pick supplying cells,
//! build a traversable route.
//!
//! Everything here operates on a by-value [`warehouse::WarehouseView`]
//! snapshot and a caller-supplied RNG, so a planning run is a pure function
//! of its inputs and seed.

pub mod annealing;
pub mod astar;
pub mod clusterizer;
pub mod dbscan;
pub mod error;
pub mod route;
pub mod selector;
pub mod sizing;
pub mod solve;

pub use clusterizer::{Cluster, Clusterizer};
pub use error::PlanError;
pub use route::{Route, RouteStep, StepKind};
pub use selector::SelectorSettings;
pub use sizing::{DbscanParams, SizeType};
pub use solve::{PlanSettings, solve};
