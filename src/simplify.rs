//! Contour simplification.
//!
//! A single-pass neighbour filter: cheaper than Douglas-Peucker and close
//! enough for pixel-traced outlines.

use kurbo::Point;

pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// Drop interior points lying within `tolerance` of the segment joining
/// their original neighbours. First and last points are always kept.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = Vec::with_capacity(points.len());
    kept.push(points[0]);
    for window in points.windows(3) {
        if segment_distance(window[1], window[0], window[2]) > tolerance {
            kept.push(window[1]);
        }
    }
    kept.push(points[points.len() - 1]);
    kept
}

/// Remove interior points that continue straight on in the same direction.
pub fn merge_collinear(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut merged: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if merged.len() >= 2 {
            let a = merged[merged.len() - 2];
            let b = merged[merged.len() - 1];
            let (ab, bp) = (b - a, p - b);
            if ab.cross(bp) == 0.0 && ab.dot(bp) > 0.0 {
                merged.pop();
            }
        }
        merged.push(p);
    }
    merged
}

/// Reduce a closed contour to its outline polygon.
///
/// The closing point is dropped when it lies on the edge back to the start.
pub fn outline(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut outline = simplify(&merge_collinear(points), tolerance);
    if outline.len() > 3 {
        let n = outline.len();
        if segment_distance(outline[n - 1], outline[n - 2], outline[0]) <= f64::EPSILON {
            outline.pop();
        }
    }
    outline
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_short_input_unchanged() {
        let line = pts(&[(0.0, 0.0), (5.0, 5.0)]);
        assert_eq!(simplify(&line, 1.0), line);
    }

    #[test]
    fn test_drops_points_near_neighbour_segment() {
        let wobble = pts(&[(0.0, 0.0), (1.0, 0.2), (2.0, 0.0), (3.0, 4.0), (4.0, 0.0)]);
        let simplified = simplify(&wobble, 1.0);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (3.0, 4.0), (4.0, 0.0)]));
    }

    #[test]
    fn test_uses_original_neighbours() {
        // (2,0) is measured against (1,0)-(3,0) even though (1,0) is dropped.
        let flat = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert_eq!(simplify(&flat, 0.5), pts(&[(0.0, 0.0), (3.0, 0.0)]));
    }

    #[test]
    fn test_spike_is_kept() {
        let spike = pts(&[(0.0, 0.0), (5.0, 0.0), (0.0, 0.0), (0.0, 1.0)]);
        assert!(simplify(&spike, 1.0).contains(&Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_merge_collinear_keeps_corners() {
        let l_shape = pts(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (1.0, 2.0), (2.0, 2.0)]);
        assert_eq!(
            merge_collinear(&l_shape),
            pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0)])
        );
    }

    #[test]
    fn test_merge_collinear_keeps_reversal() {
        let back = pts(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0)]);
        assert_eq!(merge_collinear(&back), back);
    }

    #[test]
    fn test_outline_of_pixel_square_ring() {
        let mut ring = Vec::new();
        for y in 0..=3 {
            ring.push((0.0, y as f64));
        }
        for x in 1..=3 {
            ring.push((x as f64, 3.0));
        }
        for y in (0..3).rev() {
            ring.push((3.0, y as f64));
        }
        for x in (1..3).rev() {
            ring.push((x as f64, 0.0));
        }
        let outline = outline(&pts(&ring), DEFAULT_TOLERANCE);
        assert_eq!(
            outline,
            pts(&[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)])
        );
    }

    #[test]
    fn test_segment_distance_degenerate() {
        let d = segment_distance(Point::new(3.0, 4.0), Point::ORIGIN, Point::ORIGIN);
        assert!((d - 5.0).abs() < 1e-12);
    }
}
