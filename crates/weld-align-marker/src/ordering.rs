//! Canonical corner ordering for detected quads.
//!
//! Image coordinates have `y` pointing down, so sorting by `atan2(dy, dx)`
//! around the centroid already walks the points visually clockwise. The
//! cycle is then rotated to start at the top-left point and its winding is
//! verified with a 2D cross product.

use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Order points clockwise (in image space) starting at the top-left one.
///
/// For four points the result is `[top_left, top_right, bottom_right, bottom_left]`.
/// Fewer than four points are returned unchanged. The function is total and
/// idempotent. Points at the same angle from the centroid are taken nearest
/// first, so distinct points order the same way whatever their input order.
#[cfg_attr(feature = "tracing", instrument(level = "trace", skip(points), fields(n = points.len())))]
pub fn order_corners_clockwise_from_top_left(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if points.len() < 4 {
        return points.to_vec();
    }

    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), p| (ax + p.x, ay + p.y));
    let (cx, cy) = (sx / n, sy / n);

    let mut by_angle: Vec<(f64, f64, Point2<f64>)> = points
        .iter()
        .map(|p| {
            let (dx, dy) = (p.x - cx, p.y - cy);
            (dy.atan2(dx), dx * dx + dy * dy, *p)
        })
        .collect();
    // collinear input puts several points on one ray; nearer goes first
    by_angle.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut start = 0;
    for (i, (_, _, p)) in by_angle.iter().enumerate() {
        let best = by_angle[start].2;
        if p.y.total_cmp(&best.y).then(p.x.total_cmp(&best.x)).is_lt() {
            start = i;
        }
    }

    let mut ordered: Vec<Point2<f64>> = by_angle.iter().map(|(_, _, p)| *p).collect();
    ordered.rotate_left(start);

    let last = ordered.len() - 1;
    let v1 = ordered[1] - ordered[0];
    let v2 = ordered[last] - ordered[0];
    if v1.x * v2.y - v1.y * v2.x < 0.0 {
        // counter-clockwise: keep the anchor, reverse the rest
        ordered[1..].reverse();
    }

    ordered
}

/// Fixed-size variant of [`order_corners_clockwise_from_top_left`] for marker quads.
pub fn order_quad_clockwise_from_top_left(quad: &[Point2<f64>; 4]) -> [Point2<f64>; 4] {
    let ordered = order_corners_clockwise_from_top_left(quad);
    [ordered[0], ordered[1], ordered[2], ordered[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2<f64>> {
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn already_ordered_square_is_unchanged() {
        let input = pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        assert_eq!(order_corners_clockwise_from_top_left(&input), input);
    }

    #[test]
    fn scrambled_quad_is_ordered() {
        let input = pts(&[(50.0, 80.0), (10.0, 10.0), (90.0, 20.0), (20.0, 70.0)]);
        let expected = pts(&[(10.0, 10.0), (90.0, 20.0), (50.0, 80.0), (20.0, 70.0)]);
        assert_eq!(order_corners_clockwise_from_top_left(&input), expected);
    }

    #[test]
    fn three_points_pass_through() {
        let input = pts(&[(5.0, 5.0), (0.0, 0.0), (9.0, 1.0)]);
        assert_eq!(order_corners_clockwise_from_top_left(&input), input);
    }

    #[test]
    fn empty_input_passes_through() {
        assert!(order_corners_clockwise_from_top_left(&[]).is_empty());
    }

    #[test]
    fn every_permutation_of_a_quad_orders_identically() {
        let quad = pts(&[(12.0, 8.0), (140.0, 22.0), (131.0, 118.0), (3.0, 101.0)]);
        let perms = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [2, 0, 3, 1],
            [1, 3, 0, 2],
            [0, 2, 1, 3],
            [3, 0, 2, 1],
        ];
        for perm in perms {
            let input: Vec<_> = perm.iter().map(|&i| quad[i]).collect();
            assert_eq!(order_corners_clockwise_from_top_left(&input), quad, "{perm:?}");
        }
    }

    #[test]
    fn ordering_is_idempotent() {
        let input = pts(&[(300.0, 410.0), (220.0, 180.0), (480.0, 200.0), (510.0, 390.0)]);
        let once = order_corners_clockwise_from_top_left(&input);
        let twice = order_corners_clockwise_from_top_left(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        let collinear = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(order_corners_clockwise_from_top_left(&collinear).len(), 4);

        let coincident = pts(&[(4.0, 4.0); 4]);
        assert_eq!(order_corners_clockwise_from_top_left(&coincident), coincident);

        let with_nan = pts(&[(f64::NAN, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(order_corners_clockwise_from_top_left(&with_nan).len(), 4);
    }

    #[test]
    fn collinear_input_orders_idempotently() {
        let input = pts(&[(1.0, 1.0), (0.0, 0.0), (3.0, 3.0), (2.0, 2.0)]);
        let once = order_corners_clockwise_from_top_left(&input);
        let twice = order_corners_clockwise_from_top_left(&once);
        assert_eq!(once, twice);
        assert_eq!(once, pts(&[(0.0, 0.0), (2.0, 2.0), (3.0, 3.0), (1.0, 1.0)]));
    }

    #[test]
    fn collinear_order_ignores_input_order() {
        let line = pts(&[(0.0, 5.0), (10.0, 5.0), (20.0, 5.0), (30.0, 5.0)]);
        let expected = pts(&[(0.0, 5.0), (20.0, 5.0), (30.0, 5.0), (10.0, 5.0)]);
        let perms = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [1, 0, 3, 2],
            [2, 3, 0, 1],
            [1, 3, 0, 2],
        ];
        for perm in perms {
            let input: Vec<_> = perm.iter().map(|&i| line[i]).collect();
            let once = order_corners_clockwise_from_top_left(&input);
            assert_eq!(once, expected, "{perm:?}");
            assert_eq!(order_corners_clockwise_from_top_left(&once), once, "{perm:?}");
        }
    }

    #[test]
    fn repeated_corners_order_idempotently() {
        let input = pts(&[(6.0, 2.0), (2.0, 2.0), (6.0, 2.0), (2.0, 2.0)]);
        let once = order_corners_clockwise_from_top_left(&input);
        assert_eq!(once, pts(&[(2.0, 2.0), (2.0, 2.0), (6.0, 2.0), (6.0, 2.0)]));
        assert_eq!(order_corners_clockwise_from_top_left(&once), once);
    }

    #[test]
    fn pentagon_starts_top_left_and_runs_clockwise() {
        let input = pts(&[
            (50.0, 0.0),
            (0.0, 40.0),
            (100.0, 40.0),
            (20.0, 100.0),
            (80.0, 100.0),
        ]);
        let ordered = order_corners_clockwise_from_top_left(&input);
        assert_eq!(
            ordered,
            pts(&[
                (50.0, 0.0),
                (100.0, 40.0),
                (80.0, 100.0),
                (20.0, 100.0),
                (0.0, 40.0)
            ])
        );
    }

    #[test]
    fn quad_helper_matches_slice_version() {
        let quad = [
            Point2::new(50.0, 80.0),
            Point2::new(10.0, 10.0),
            Point2::new(90.0, 20.0),
            Point2::new(20.0, 70.0),
        ];
        let ordered = order_quad_clockwise_from_top_left(&quad);
        assert_eq!(
            ordered.to_vec(),
            order_corners_clockwise_from_top_left(&quad)
        );
    }
}
