//! A\* search between two stops on the 4-connected warehouse grid.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use warehouse::{Point, WarehouseView};

use crate::annealing::manhattan;
use crate::error::PlanError;

const NEIGHBORS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Finds a unit-step path `from ..= to`, inclusive of both endpoints.
///
/// Walkability follows the view, with two exceptions: the target is
/// traversable even when it is a storage cell (the picker stands on the
/// cell being picked), and expansion stays within one ring of the bounding
/// box. Space further out never shortens a route, and the bound keeps the
/// search finite when the target is walled off.
pub fn find_path(view: &WarehouseView, from: Point, to: Point) -> Result<Vec<Point>, PlanError> {
    if from == to {
        return Ok(vec![from]);
    }

    let (width, height) = view.dimensions();

    // min-heap on (f, insertion order); the sequence number breaks f-ties
    // in insertion order
    let mut open: BinaryHeap<Reverse<(i64, u64, Point)>> = BinaryHeap::new();
    let mut came_from: HashMap<Point, Point> = HashMap::new();
    let mut g_score: HashMap<Point, i64> = HashMap::new();
    let mut visited: HashSet<Point> = HashSet::new();
    let mut seq = 0u64;

    g_score.insert(from, 0);
    open.push(Reverse((manhattan(from, to), seq, from)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == to {
            return Ok(reconstruct(&came_from, from, to));
        }
        if !visited.insert(current) {
            continue;
        }

        let g = g_score[&current];
        for (dx, dy) in NEIGHBORS {
            let next = (current.0 + dx, current.1 + dy);

            if next != to {
                if !view.is_walkable(next) {
                    continue;
                }
                if next.0 > width + 1 || next.1 > height + 1 {
                    continue;
                }
            }

            let tentative = g + 1;
            if tentative < g_score.get(&next).copied().unwrap_or(i64::MAX) {
                g_score.insert(next, tentative);
                came_from.insert(next, current);
                seq += 1;
                open.push(Reverse((tentative + manhattan(next, to), seq, next)));
            }
        }
    }

    Err(PlanError::NoRoute { from, to })
}

fn reconstruct(came_from: &HashMap<Point, Point>, from: Point, to: Point) -> Vec<Point> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}
