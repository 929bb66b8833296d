//! Matching utilities for multi-object tracking.

use ndarray::Array2;
use tracing::{trace, warn};

use crate::geometry::angle_difference;
use crate::tracker::config::TrackerConfig;
use crate::tracker::detection::Detection;

/// Smallest cost given to a forbidden pair.
const FORBIDDEN_COST_FLOOR: f64 = 1e6;

/// `a / b`, with a zero divisor disabling the term.
#[inline]
fn div_or_zero(a: f64, b: f64) -> f64 {
    if b != 0.0 { a / b } else { 0.0 }
}

/// Pairwise cost matrix between previous and current detections.
///
/// Entries of pairs at least `max_dist` apart are `None`.
pub fn cost_matrix(
    prev: &[Detection],
    current: &[Detection],
    config: &TrackerConfig,
) -> Array2<Option<f64>> {
    let mut costs = Array2::from_elem((prev.len(), current.len()), None);
    for (i, p) in prev.iter().enumerate() {
        let a = p.spot(config.reference_spot);
        for (j, c) in current.iter().enumerate() {
            let b = c.spot(config.reference_spot);
            let distance = (a.center.0 - b.center.0).hypot(a.center.1 - b.center.1);
            if !(distance < config.max_dist) {
                continue;
            }
            let angle = angle_difference(a.orientation, b.orientation).abs();
            let area = (p.shape.area - c.shape.area).abs();
            let perim = (p.shape.perimeter - c.shape.perimeter).abs();

            let cost = div_or_zero(distance, config.norm_dist)
                + div_or_zero(angle, config.norm_angle)
                + div_or_zero(area, config.norm_area)
                + div_or_zero(perim, config.norm_perim);
            trace!(i, j, distance, angle, area, perim, cost, "pair cost");
            costs[[i, j]] = Some(cost);
        }
    }
    costs
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Globally optimal one-to-one assignment on a cost matrix with forbidden cells.
///
/// The rectangular problem is padded to a square one. Forbidden cells get a
/// cost larger than any sum of allowed costs, so the solver only uses them when
/// a full matching cannot avoid them, and such pairs are reported unmatched.
pub fn linear_assignment(cost_matrix: &Array2<Option<f64>>) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    let size = num_rows.max(num_cols);
    let max_allowed = cost_matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &c| acc.max(c));
    let forbidden = FORBIDDEN_COST_FLOOR.max(2.0 * (max_allowed + 1.0) * size as f64);
    let mut padded = Array2::<f64>::from_elem((size, size), forbidden);

    for ((i, j), cost) in cost_matrix.indexed_iter() {
        padded[[i, j]] = cost.unwrap_or(forbidden);
    }

    let result = lapjv::lapjv(&padded);
    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match result {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]].is_some() {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(e) => {
            warn!(error = ?e, rows = num_rows, cols = num_cols, "assignment solver failed");
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// For each previous detection, the index of the current detection it
/// continues as, or `None` if it has no valid match in this frame.
///
/// Returned `Some` indices are pairwise distinct.
pub fn assign(
    prev: &[Detection],
    current: &[Detection],
    config: &TrackerConfig,
) -> Vec<Option<usize>> {
    if prev.is_empty() {
        return Vec::new();
    }
    if current.is_empty() {
        return vec![None; prev.len()];
    }

    let costs = cost_matrix(prev, current, config);
    let AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    } = linear_assignment(&costs);
    trace!(
        matched = matches.len(),
        unmatched_prev = unmatched_tracks.len(),
        unmatched_current = unmatched_detections.len(),
        "assignment"
    );

    let mut assignment = vec![None; prev.len()];
    for (i, j) in matches {
        assignment[i] = Some(j);
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::detection::ReferenceSpot;
    use std::collections::HashSet;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn config(norm_dist: f64, norm_angle: f64, max_dist: f64) -> TrackerConfig {
        TrackerConfig {
            reference_spot: ReferenceSpot::Head,
            norm_dist,
            norm_angle,
            norm_area: 0.0,
            norm_perim: 0.0,
            max_dist,
            max_time: 10,
        }
    }

    fn det(x: f64, y: f64, orientation: f64) -> Detection {
        let mut d = Detection::default();
        d.head.center = (x, y);
        d.head.orientation = orientation;
        d
    }

    fn det_shape(x: f64, y: f64, orientation: f64, area: f64, perimeter: f64) -> Detection {
        let mut d = det(x, y, orientation);
        d.shape.area = area;
        d.shape.perimeter = perimeter;
        d
    }

    fn scenario() -> (Vec<Detection>, Vec<Detection>) {
        let prev = vec![det(1.0, 1.0, 45.0), det(3.0, 4.0, 0.0), det(6.0, 6.0, 180.0)];
        let current = vec![det(2.0, 2.0, 40.0), det(2.0, 3.5, 50.0), det(7.5, 5.0, 90.0)];
        (prev, current)
    }

    #[test]
    fn test_max_dist() {
        let (prev, current) = scenario();
        let test = assign(&prev, &current, &config(0.0, 0.5 * PI, 5.0));
        assert_eq!(test, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_max_dist_tight() {
        let (prev, current) = scenario();
        let test = assign(&prev, &current, &config(0.0, 0.5 * PI, 1.0));
        assert_ne!(test, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_zero_max_dist_matches_nothing() {
        let (prev, current) = scenario();
        let test = assign(&prev, &current, &config(0.0, 0.5 * PI, 0.0));
        assert_eq!(test, vec![None, None, None]);
    }

    #[test]
    fn test_empty_current() {
        let (prev, _) = scenario();
        let test = assign(&prev, &[], &config(0.0, 0.5 * PI, 20.0));
        assert_eq!(test, vec![None, None, None]);
    }

    #[test]
    fn test_empty_prev() {
        let (_, current) = scenario();
        let test = assign(&[], &current, &config(0.0, 0.5 * PI, 10.0));
        assert!(test.is_empty());
    }

    #[test]
    fn test_one_object_lost() {
        let prev = vec![det(10.0, 10.0, 0.0), det(30.0, 40.0, 0.0), det(50.0, 60.0, 0.0)];
        let current = vec![det(10.0, 15.0, 0.0), det(35.0, 40.0, 50.0), det(60.0, 60.0, 0.0)];
        let test = assign(&prev, &current, &config(0.0, 0.5 * PI, 10.0));
        assert_eq!(test, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_only_translation() {
        let prev = vec![det(10.0, 10.0, 0.0), det(30.0, 40.0, 0.0), det(50.0, 60.0, 0.0)];
        let current = vec![det(50.0, 60.0, 0.0), det(10.0, 10.0, 50.0), det(30.0, 40.0, 0.0)];
        let test = assign(&prev, &current, &config(1.0, 0.0, 20.0));
        assert_eq!(test, vec![Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn test_only_angle() {
        let prev = vec![
            det(10.0, 10.0, 0.0),
            det(30.0, 40.0, 3.0 * FRAC_PI_2),
            det(50.0, 60.0, FRAC_PI_2),
        ];
        let current = vec![
            det(60.0, 60.0, 0.0),
            det(10.0, 0.0, FRAC_PI_2),
            det(30.0, 40.0, 0.0),
        ];
        let test = assign(&prev, &current, &config(10.0, FRAC_PI_2, 20.0));
        assert_eq!(test, vec![Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn test_area() {
        let prev = vec![
            det_shape(10.0, 10.0, 10.0, 10.0, 0.0),
            det_shape(20.0, 20.0, 20.0, 20.0, 0.0),
            det_shape(30.0, 30.0, 30.0, 30.0, 0.0),
        ];
        let current = vec![
            det_shape(20.0, 20.0, 20.0, 20.0, 0.0),
            det_shape(30.0, 30.0, 30.0, 30.0, 0.0),
            det_shape(10.0, 10.0, 10.0, 10.0, 0.0),
        ];
        let mut cfg = config(0.0, 0.0, 200.0);
        cfg.norm_area = 1.0;
        assert_eq!(assign(&prev, &current, &cfg), vec![Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn test_perim() {
        let prev = vec![
            det_shape(10.0, 10.0, 10.0, 0.0, 10.0),
            det_shape(20.0, 20.0, 20.0, 0.0, 20.0),
            det_shape(30.0, 30.0, 30.0, 0.0, 30.0),
        ];
        let current = vec![
            det_shape(20.0, 20.0, 20.0, 0.0, 20.0),
            det_shape(30.0, 30.0, 30.0, 0.0, 30.0),
            det_shape(10.0, 10.0, 10.0, 0.0, 10.0),
        ];
        let mut cfg = config(0.0, 0.0, 200.0);
        cfg.norm_perim = 1.0;
        assert_eq!(assign(&prev, &current, &cfg), vec![Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn test_area_ignored_when_unnormalized() {
        let prev = vec![det(10.0, 10.0, 0.0), det(30.0, 10.0, 0.0)];
        let current = vec![det(29.0, 10.0, 0.0), det(11.0, 10.0, 0.0)];
        let cfg = config(1.0, 0.0, 100.0);
        let baseline = assign(&prev, &current, &cfg);

        let mut prev_scaled = prev.clone();
        prev_scaled[0].shape.area = 1e5;
        let mut current_scaled = current.clone();
        current_scaled[1].shape.area = 3.0;
        assert_eq!(assign(&prev_scaled, &current_scaled, &cfg), baseline);
        assert_eq!(baseline, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_reference_spot_switches_anchor() {
        let mut a = det(0.0, 0.0, 0.0);
        a.body.center = (100.0, 100.0);
        let mut b = det(50.0, 50.0, 0.0);
        b.body.center = (101.0, 100.0);
        let mut cfg = config(1.0, 0.0, 10.0);
        assert_eq!(assign(&[a], &[b], &cfg), vec![None]);
        cfg.reference_spot = ReferenceSpot::Body;
        assert_eq!(assign(&[a], &[b], &cfg), vec![Some(0)]);
    }

    #[test]
    fn test_rectangular_assignment_is_injective() {
        let prev: Vec<_> = (0..5).map(|i| det(i as f64 * 3.0, 0.0, 0.0)).collect();
        let current: Vec<_> = (0..3).map(|i| det(i as f64 * 3.0 + 1.0, 0.5, 0.1)).collect();
        for max_dist in [0.5, 2.0, 4.0, 100.0] {
            let test = assign(&prev, &current, &config(1.0, 1.0, max_dist));
            assert_eq!(test.len(), prev.len());
            let picked: Vec<_> = test.iter().flatten().collect();
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(picked.len(), unique.len());

            let test = assign(&current, &prev, &config(1.0, 1.0, max_dist));
            assert_eq!(test.len(), current.len());
            let picked: Vec<_> = test.iter().flatten().collect();
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(picked.len(), unique.len());
        }
    }

    #[test]
    fn test_linear_assignment_prefers_allowed_pairs() {
        let mut costs = Array2::from_elem((2, 2), None);
        costs[[0, 0]] = Some(1.0);
        costs[[1, 0]] = Some(0.5);
        costs[[1, 1]] = Some(5.0);
        let result = linear_assignment(&costs);
        let mut matches = result.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 0), (1, 1)]);
        assert!(result.unmatched_tracks.is_empty());
        assert!(result.unmatched_detections.is_empty());
    }
}
