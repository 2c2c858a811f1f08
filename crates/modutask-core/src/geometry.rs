//! 2D coordinates and the weighted-variance helper used by task metrics.

use serde::{Deserialize, Serialize};

/// Absolute tolerance used for all coordinate-coincidence checks
/// (robot/task assignment, module mounting, transport-follow verification).
pub const COORDINATE_EPSILON: f64 = 1e-8;

/// An ordered pair of finite reals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coordinate) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// True if the two coordinates coincide within [`COORDINATE_EPSILON`].
    pub fn coincides_with(&self, other: &Coordinate) -> bool {
        self.distance(other) <= COORDINATE_EPSILON
    }

    /// Move toward `target` by at most `step`, snapping to `target` if
    /// already within `step` of it.
    pub fn advance_toward(&self, target: &Coordinate, step: f64) -> Coordinate {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= step || dist == 0.0 {
            return *target;
        }
        Coordinate::new(self.x + dx / dist * step, self.y + dy / dist * step)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(value: (f64, f64)) -> Self {
        Coordinate::new(value.0, value.1)
    }
}

/// Weighted centroid + weighted variance of a set of points, used by the
/// "weighted variance of remaining workload" metric (SPEC_FULL.md §4.4).
///
/// Returns 0.0 when the total weight is zero (no remaining workload to
/// disperse).
pub fn weighted_variance(points: &[Coordinate], weights: &[f64]) -> f64 {
    debug_assert_eq!(points.len(), weights.len());
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let center_x: f64 = points
        .iter()
        .zip(weights)
        .map(|(p, w)| p.x * w)
        .sum::<f64>()
        / total_weight;
    let center_y: f64 = points
        .iter()
        .zip(weights)
        .map(|(p, w)| p.y * w)
        .sum::<f64>()
        / total_weight;
    let center = Coordinate::new(center_x, center_y);
    let weighted_sq_dist: f64 = points
        .iter()
        .zip(weights)
        .map(|(p, w)| w * p.distance(&center).powi(2))
        .sum();
    weighted_sq_dist / total_weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincidence_respects_epsilon() {
        let a = Coordinate::new(1.0, 1.0);
        let b = Coordinate::new(1.0 + 1e-9, 1.0);
        let c = Coordinate::new(1.0 + 1e-6, 1.0);
        assert!(a.coincides_with(&b));
        assert!(!a.coincides_with(&c));
    }

    #[test]
    fn advance_snaps_within_step() {
        let origin = Coordinate::new(0.0, 0.0);
        let dest = Coordinate::new(3.0, 4.0);
        let p1 = origin.advance_toward(&dest, 2.0);
        assert!((p1.distance(&origin) - 2.0).abs() < 1e-9);
        let p2 = p1.advance_toward(&dest, 2.0);
        let p3 = p2.advance_toward(&dest, 2.0);
        assert_eq!(p3.x, dest.x);
        assert_eq!(p3.y, dest.y);
    }

    #[test]
    fn weighted_variance_zero_weight_is_zero() {
        let pts = [Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 10.0)];
        assert_eq!(weighted_variance(&pts, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn weighted_variance_single_point_is_zero() {
        let pts = [Coordinate::new(5.0, 5.0)];
        assert_eq!(weighted_variance(&pts, &[3.0]), 0.0);
    }
}
