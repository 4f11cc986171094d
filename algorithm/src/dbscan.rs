//! Density-based clustering over points in feature space.
//!
//! Region-growing DBSCAN with Euclidean distance. The neighborhood of a
//! point includes the point itself, so `min_samples` counts it, the same
//! convention the reference clustering stacks use.

use std::collections::VecDeque;

/// Label assigned to points that belong to no dense region.
pub const NOISE: i64 = -1;

const UNVISITED: i64 = -2;

/// Clusters `points` and returns one label per point: `0..k` for the `k`
/// clusters found, [`NOISE`] for outliers.
pub fn dbscan(points: &[Vec<f64>], eps: f64, min_samples: usize) -> Vec<i64> {
    let mut labels = vec![UNVISITED; points.len()];
    let mut next_cluster = 0i64;

    for i in 0..points.len() {
        if labels[i] != UNVISITED {
            continue;
        }

        let neighbors = region_query(points, i, eps);
        if neighbors.len() < min_samples {
            labels[i] = NOISE;
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = cluster;

        let mut seeds: VecDeque<usize> = neighbors.into();
        while let Some(j) = seeds.pop_front() {
            if labels[j] == NOISE {
                // border point: reachable but not dense itself
                labels[j] = cluster;
                continue;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster;

            let reach = region_query(points, j, eps);
            if reach.len() >= min_samples {
                seeds.extend(reach);
            }
        }
    }

    labels
}

fn region_query(points: &[Vec<f64>], center: usize, eps: f64) -> Vec<usize> {
    let eps_sq = eps * eps;
    (0..points.len())
        .filter(|&j| distance_sq(&points[center], &points[j]) <= eps_sq)
        .collect()
}

fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Vec<f64> {
        vec![x, y]
    }

    #[test]
    fn separated_blobs_get_distinct_labels() {
        let points = vec![
            pt(0.0, 0.0),
            pt(0.0, 1.0),
            pt(1.0, 0.0),
            pt(10.0, 10.0),
            pt(10.0, 11.0),
            pt(11.0, 10.0),
        ];
        let labels = dbscan(&points, 1.5, 3);

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[3], labels[5]);
        assert_ne!(labels[0], labels[3]);
        assert!(labels.iter().all(|&l| l != NOISE));
    }

    #[test]
    fn isolated_points_are_noise() {
        let points = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(0.0, 100.0)];
        let labels = dbscan(&points, 2.0, 2);
        assert!(labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn border_point_joins_the_cluster() {
        // chain: the middle points are dense, the tip is only reachable
        let points = vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0), pt(3.0, 0.0)];
        let labels = dbscan(&points, 1.0, 3);

        assert_eq!(labels[1], 0);
        assert_eq!(labels[0], 0, "tip absorbed as border point");
        assert_eq!(labels[3], 0);
    }

    #[test]
    fn min_samples_counts_the_point_itself() {
        let points = vec![pt(0.0, 0.0), pt(1.0, 0.0)];
        let labels = dbscan(&points, 1.0, 2);
        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn empty_input() {
        assert!(dbscan(&[], 1.0, 2).is_empty());
    }
}
