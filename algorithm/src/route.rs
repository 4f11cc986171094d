//! Route assembly: stop ordering, grid expansion, compression.

use std::collections::HashSet;

use rand::Rng;
use serde::{Serialize, Serializer, ser::SerializeTuple};
use tracing::debug;

use warehouse::{Cell, Point, WarehouseView};

use crate::annealing::{anneal, manhattan, path_length};
use crate::astar::find_path;
use crate::error::PlanError;

/// What a waypoint is for: standing at a pick cell or passing through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Product,
    Passage,
}

/// One grid waypoint. Serializes as the wire triple `[x, y, kind]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteStep {
    pub x: i64,
    pub y: i64,
    pub kind: StepKind,
}

impl RouteStep {
    pub fn position(&self) -> Point {
        (self.x, self.y)
    }
}

impl Serialize for RouteStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.x)?;
        tuple.serialize_element(&self.y)?;
        tuple.serialize_element(&self.kind)?;
        tuple.end()
    }
}

/// A pick route from the start point and back.
#[derive(Clone, Debug)]
pub struct Route {
    /// The full unit-step walk, every grid point tagged.
    pub steps: Vec<RouteStep>,

    /// Compressed waypoints delivered on the wire: the start, every turn,
    /// every pick cell, the end.
    pub waypoints: Vec<RouteStep>,
}

impl Route {
    /// Number of unit steps walked.
    pub fn length(&self) -> i64 {
        self.steps.len().saturating_sub(1) as i64
    }

    /// Manhattan length along the compressed waypoints. Equals
    /// [`Route::length`], since compression only drops collinear interior
    /// points.
    pub fn waypoint_length(&self) -> i64 {
        self.waypoints
            .windows(2)
            .map(|w| manhattan(w[0].position(), w[1].position()))
            .sum()
    }
}

/// Builds the route visiting `cells` from the warehouse start point and
/// back: anneals the stop order, expands each leg with A\*, tags and
/// compresses the walk.
pub fn build_route(
    view: &WarehouseView,
    cells: &[Cell],
    iterations: usize,
    rng: &mut impl Rng,
) -> Result<Route, PlanError> {
    let start = view.start_point();

    let mut stops: Vec<Point> = Vec::with_capacity(cells.len() + 2);
    stops.push(start);
    stops.extend(cells.iter().map(|c| c.position()));
    stops.push(start);

    let before = path_length(&stops);
    anneal(&mut stops, iterations, rng);
    debug!(
        stops = stops.len() - 2,
        before,
        after = path_length(&stops),
        "stop order annealed"
    );

    let mut walk: Vec<Point> = vec![start];
    for pair in stops.windows(2) {
        let leg = find_path(view, pair[0], pair[1])?;
        walk.extend(&leg[1..]);
    }

    let picks: HashSet<Point> = cells.iter().map(|c| c.position()).collect();
    let steps: Vec<RouteStep> = walk
        .into_iter()
        .map(|(x, y)| RouteStep {
            x,
            y,
            kind: if picks.contains(&(x, y)) {
                StepKind::Product
            } else {
                StepKind::Passage
            },
        })
        .collect();

    let waypoints = compress(&steps);
    Ok(Route { steps, waypoints })
}

/// Collapses collinear runs. Kept waypoints: the first point, every
/// direction change, every pick cell, the last point.
fn compress(steps: &[RouteStep]) -> Vec<RouteStep> {
    if steps.len() < 3 {
        return steps.to_vec();
    }

    let dir = |a: &RouteStep, b: &RouteStep| (b.x - a.x, b.y - a.y);

    let mut out = vec![steps[0]];
    for i in 1..steps.len() - 1 {
        let turning = dir(&steps[i - 1], &steps[i]) != dir(&steps[i], &steps[i + 1]);
        if turning || steps[i].kind == StepKind::Product {
            out.push(steps[i]);
        }
    }
    out.push(steps[steps.len() - 1]);
    out
}
