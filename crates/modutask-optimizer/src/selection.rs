//! Pareto dominance and representative selection. Grounded on
//! `original_source/modutask/optimizer/my_moo/utils.py`.

use modutask_core::SimRng;

use crate::encoding::Variable;
use crate::individual::Individual;

/// Lower-is-better Pareto dominance: `a` dominates `b` iff it is no worse
/// on every objective and strictly better on at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
}

/// Individuals not dominated by any other individual in the slice. O(n^2),
/// matching the reference implementation's direct pairwise scan.
pub fn non_dominated<V: Variable>(individuals: &[Individual<V>]) -> Vec<usize> {
    (0..individuals.len())
        .filter(|&i| {
            !(0..individuals.len())
                .any(|j| j != i && dominates(&individuals[j].objectives, &individuals[i].objectives))
        })
        .collect()
}

/// Pick up to `k` representative indices from `front` via k-means over
/// the (deduplicated) objective vectors, seeded from `rng`. No clustering
/// crate is in the dependency stack, so Lloyd's algorithm is hand-rolled
/// here; centroids are seeded by sampling distinct points without
/// replacement.
pub fn select_kmeans_representatives<V: Variable>(front: &[Individual<V>], k: usize, rng: &mut SimRng) -> Vec<usize> {
    if front.len() <= k {
        return (0..front.len()).collect();
    }

    let mut unique_points: Vec<Vec<f64>> = Vec::new();
    for individual in front {
        if !unique_points.iter().any(|p| p == &individual.objectives) {
            unique_points.push(individual.objectives.clone());
        }
    }
    let clusters = k.min(unique_points.len());
    if clusters == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..unique_points.len()).collect();
    rng.shuffle(&mut order);
    let mut centroids: Vec<Vec<f64>> = order.into_iter().take(clusters).map(|i| unique_points[i].clone()).collect();

    for _ in 0..50 {
        let mut sums = vec![vec![0.0; centroids[0].len()]; clusters];
        let mut counts = vec![0usize; clusters];
        for point in &unique_points {
            let assignment = nearest_centroid(point, &centroids);
            for (dim, value) in point.iter().enumerate() {
                sums[assignment][dim] += value;
            }
            counts[assignment] += 1;
        }
        let mut moved = false;
        for c in 0..clusters {
            if counts[c] == 0 {
                continue;
            }
            let new_centroid: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            if new_centroid != centroids[c] {
                moved = true;
            }
            centroids[c] = new_centroid;
        }
        if !moved {
            break;
        }
    }

    let mut representatives = Vec::new();
    for centroid in &centroids {
        let mut best: Option<(usize, f64)> = None;
        for (i, individual) in front.iter().enumerate() {
            let dist = squared_distance(&individual.objectives, centroid);
            if best.map(|(_, best_dist)| dist < best_dist).unwrap_or(true) {
                best = Some((i, dist));
            }
        }
        if let Some((i, _)) = best {
            representatives.push(i);
        }
    }
    representatives
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| squared_distance(point, a).partial_cmp(&squared_distance(point, b)).unwrap())
        .map(|(i, _)| i)
        .expect("centroids non-empty")
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominates_requires_no_worse_and_one_better() {
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0]));
        assert!(!dominates(&[1.0, 2.0], &[1.0, 2.0]));
        assert!(!dominates(&[2.0, 1.0], &[1.0, 2.0]));
    }
}
