//! Simulated annealing over the visiting order of route stops.
//!
//! The first and last entries of the path are fixed anchors (the start
//! point); interior stops are swapped pairwise under Metropolis acceptance
//! on the Manhattan length. Only the edges around the swapped positions are
//! re-evaluated per iteration.

use rand::Rng;
use tracing::trace;

use warehouse::Point;

pub const DEFAULT_ITERATIONS: usize = 1_000;

const BASE_TEMP: f64 = 1.0;
const COOLING: f64 = 0.99;

pub fn manhattan(a: Point, b: Point) -> i64 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Total Manhattan length along the sequence.
pub fn path_length(path: &[Point]) -> i64 {
    path.windows(2).map(|w| manhattan(w[0], w[1])).sum()
}

/// Metropolis acceptance on the length delta (`old − new`). Improving and
/// neutral moves always pass; worsening moves pass with probability
/// `exp(Δ/T)`, clamped to zero once `Δ/T` underflows −100.
pub fn accept(delta: i64, temp: f64, roll: f64) -> bool {
    if delta >= 0 {
        return true;
    }
    let x = delta as f64 / temp;
    if x < -100.0 {
        return false;
    }
    roll < x.exp()
}

/// Reorders the interior of `path` in place to shorten it. Paths with fewer
/// than four stops have nothing to reorder. The best order seen during the
/// walk is what remains in `path` afterwards.
pub fn anneal(path: &mut Vec<Point>, iterations: usize, rng: &mut impl Rng) {
    let n = path.len();
    if n < 4 {
        return;
    }

    let mut temp = BASE_TEMP;
    let mut length = path_length(path);

    let mut best = path.clone();
    let mut best_length = length;

    for _ in 0..iterations {
        let i = rng.gen_range(1..n - 1);
        let mut j = rng.gen_range(1..n - 1);
        while j == i {
            j = rng.gen_range(1..n - 1);
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };

        let new_length = swapped_length(path, length, i, j);
        let delta = length - new_length;
        let roll = rng.gen_range(0.0..1.0);

        if accept(delta, temp, roll) {
            path.swap(i, j);
            length = new_length;
            if length < best_length {
                best_length = length;
                best.copy_from_slice(path);
                trace!(best_length, "shorter stop order");
            }
        }

        temp *= COOLING;
    }

    path.copy_from_slice(&best);
}

/// Length of `path` after swapping positions `i < j`, from the current
/// `length` and the edge contributions around both positions.
fn swapped_length(path: &[Point], length: i64, i: usize, j: usize) -> i64 {
    let mut edges = vec![(i - 1, i), (i, i + 1), (j - 1, j), (j, j + 1)];
    // adjacent swap: the middle edge appears twice
    edges.dedup();

    let swapped = |k: usize| {
        if k == i {
            path[j]
        } else if k == j {
            path[i]
        } else {
            path[k]
        }
    };

    let old: i64 = edges.iter().map(|&(a, b)| manhattan(path[a], path[b])).sum();
    let new: i64 = edges.iter().map(|&(a, b)| manhattan(swapped(a), swapped(b))).sum();

    length - old + new
}
