//! Point-ring resampling to an exact vertex count.
//!
//! Rings that are too long lose their flattest vertices, rings that are too
//! short gain midpoints on their longest edges. Both directions rank every
//! vertex/edge once against the *input* ring and apply the whole batch in
//! one pass. This is a one-shot approximation of Visvalingam–Whyatt, not the
//! iterative algorithm; existing datasets depend on its exact output.
//
//  Indices wrap around, so the ring is treated as closed:
//
//      prev(i) = (i + n - 1) % n        next(i) = (i + 1) % n

use std::cmp::Ordering;

use crate::error::{MapSpaceError, Result};
use crate::model::Point;

/// Resample `points` so that exactly `target` points are returned.
///
/// Deterministic: ties are broken by original index order. Geometric
/// validity of the result is not checked, only the count.
pub fn resample(points: &[Point], target: usize) -> Result<Vec<Point>> {
    if target == 0 {
        return Err(MapSpaceError::Geometry(
            "resample target must be positive".into(),
        ));
    }
    if points.is_empty() {
        return Err(MapSpaceError::Geometry("cannot resample an empty ring".into()));
    }

    match points.len().cmp(&target) {
        Ordering::Equal => Ok(points.to_vec()),
        Ordering::Greater => Ok(decimate(points, points.len() - target)),
        Ordering::Less => {
            let mut ring = points.to_vec();
            // a single pass can split each edge at most once
            while ring.len() < target {
                let k = (target - ring.len()).min(ring.len());
                ring = densify(&ring, k);
            }
            Ok(ring)
        }
    }
}

/// Signed area of the triangle (a, b, c); positive for counter-clockwise.
#[inline]
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0
}

/// Drop the `k` vertices with the smallest signed area.
fn decimate(points: &[Point], k: usize) -> Vec<Point> {
    let n = points.len();
    let mut ranked: Vec<(usize, f64)> = (0..n)
        .map(|i| {
            let area = triangle_area(&points[(i + n - 1) % n], &points[i], &points[(i + 1) % n]);
            (i, area)
        })
        .collect();
    // `sort_by` is stable, equal areas keep index order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut removed = vec![false; n];
    for &(idx, _) in &ranked[..k] {
        removed[idx] = true;
    }

    points
        .iter()
        .zip(removed)
        .filter_map(|(p, dropped)| (!dropped).then_some(*p))
        .collect()
}

/// Split the `k` longest edges at their midpoint. `k <= points.len()`.
fn densify(points: &[Point], k: usize) -> Vec<Point> {
    let n = points.len();
    let mut ranked: Vec<(usize, f64)> = (0..n)
        .map(|i| (i, points[i].distance(&points[(i + 1) % n])))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut split = vec![false; n];
    for &(idx, _) in &ranked[..k] {
        split[idx] = true;
    }

    let mut out = Vec::with_capacity(n + k);
    for i in 0..n {
        out.push(points[i]);
        if split[i] {
            out.push(points[i].midpoint(&points[(i + 1) % n]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_identity_when_count_matches() {
        let pts = ring(&[(0.0, 0.0), (3.0, 1.0), (2.0, 5.0)]);
        assert_eq!(resample(&pts, 3).unwrap(), pts);
    }

    #[test]
    fn test_rectangle_gets_midpoints_on_long_sides() {
        // 4×2 rectangle: edges 0→1 and 2→3 are the long ones
        let pts = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)]);
        let out = resample(&pts, 6).unwrap();

        assert_eq!(
            out,
            ring(&[
                (0.0, 0.0),
                (2.0, 0.0),
                (4.0, 0.0),
                (4.0, 2.0),
                (2.0, 2.0),
                (0.0, 2.0),
            ])
        );
    }

    #[test]
    fn test_square_ties_resolved_by_index() {
        let pts = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let out = resample(&pts, 6).unwrap();

        assert_eq!(out.len(), 6);
        assert_eq!(out[1], Point::new(1.0, 0.0));
        assert_eq!(out[3], Point::new(2.0, 1.0));
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert_ne!(a, b, "duplicate point in {out:?}");
            }
        }
    }

    #[test]
    fn test_collinear_points_removed_first() {
        // counter-clockwise square with two collinear extras on the bottom edge
        let pts = ring(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ]);
        let out = resample(&pts, 4).unwrap();
        assert_eq!(out, ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]));
    }

    #[test]
    fn test_grows_past_double_length() {
        let pts = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let out = resample(&pts, 50).unwrap();
        assert_eq!(out.len(), 50);
        assert_eq!(out[0], pts[0]);
    }

    #[test]
    fn test_single_point_ring() {
        let pts = ring(&[(3.0, 3.0)]);
        let out = resample(&pts, 4).unwrap();
        assert_eq!(out, vec![Point::new(3.0, 3.0); 4]);
    }

    #[test]
    fn test_empty_ring_error() {
        let err = resample(&[], 5).unwrap_err();
        assert!(matches!(err, MapSpaceError::Geometry(_)), "got {err}");
    }

    #[test]
    fn test_zero_target_error() {
        let pts = ring(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(matches!(
            resample(&pts, 0),
            Err(MapSpaceError::Geometry(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_output_length_matches_target(
            coords in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 1..80),
            target in 1usize..120,
        ) {
            let pts: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
            let out = resample(&pts, target).unwrap();
            prop_assert_eq!(out.len(), target);
        }

        #[test]
        fn prop_identity_at_own_length(
            coords in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 1..80),
        ) {
            let pts: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
            prop_assert_eq!(resample(&pts, pts.len()).unwrap(), pts);
        }

        #[test]
        fn prop_resample_is_deterministic(
            coords in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 1..40),
            target in 1usize..60,
        ) {
            let pts: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
            prop_assert_eq!(resample(&pts, target).unwrap(), resample(&pts, target).unwrap());
        }
    }
}
