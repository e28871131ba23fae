//! Pixel silhouette tracing.
//!
//! Opaque pixels are grouped into 4-connected regions; each region's
//! boundary pixels are chained into a contour by nearest-neighbour walk.
//!
//! The walk is a heuristic. For non-convex or multi-lobed regions it can
//! jump across the shape and yield a self-intersecting polygon. That output
//! is accepted as best-effort tracing and kept stable for existing logos.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::raster::PixelBuffer;
use crate::simplify;

pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// Boundary pixels within this Chebyshev distance count as adjacent.
const ADJACENT_DISTANCE: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSettings {
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_alpha_threshold() -> u8 { DEFAULT_ALPHA_THRESHOLD }
fn default_tolerance() -> f64 { simplify::DEFAULT_TOLERANCE }

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            tolerance: simplify::DEFAULT_TOLERANCE,
        }
    }
}

/// Ordered closed outline of one opaque region, in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trace every opaque region of `buffer` into a contour.
///
/// A pixel is opaque when its alpha exceeds `alpha_threshold`. Regions with
/// fewer than three boundary pixels are skipped.
pub fn trace(buffer: &PixelBuffer, alpha_threshold: u8) -> Vec<Contour> {
    let mask = OpacityMask::new(buffer, alpha_threshold);
    let mut visited = vec![false; mask.width * mask.height];
    let mut contours = Vec::new();
    let mut regions = 0usize;

    for y in 0..mask.height {
        for x in 0..mask.width {
            let idx = y * mask.width + x;
            if visited[idx] || !mask.opaque(x as i64, y as i64) {
                continue;
            }
            regions += 1;
            let boundary = mask.region_boundary(x, y, &mut visited);
            if boundary.len() >= 3 {
                contours.push(Contour {
                    points: order_boundary(boundary),
                });
            }
        }
    }

    tracing::debug!(
        "Traced {}x{}: {} regions, {} contours",
        mask.width,
        mask.height,
        regions,
        contours.len()
    );
    contours
}

/// Trace and reduce each contour to a polygon outline.
pub fn trace_outlines(buffer: &PixelBuffer, settings: &TraceSettings) -> Vec<Vec<Point>> {
    trace(buffer, settings.alpha_threshold)
        .iter()
        .map(|c| simplify::outline(c.points(), settings.tolerance))
        .filter(|outline| outline.len() >= 3)
        .collect()
}

/// Pixel bounds `(min_x, min_y, max_x + 1, max_y + 1)` of all opaque pixels.
pub fn opaque_bounds(buffer: &PixelBuffer, alpha_threshold: u8) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            if buffer.alpha(x, y).is_some_and(|a| a > alpha_threshold) {
                bounds = Some(match bounds {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }
    }
    bounds
}

struct OpacityMask {
    width: usize,
    height: usize,
    opaque: Vec<bool>,
}

impl OpacityMask {
    fn new(buffer: &PixelBuffer, alpha_threshold: u8) -> Self {
        let opaque = buffer
            .as_bytes()
            .chunks_exact(4)
            .map(|px| px[3] > alpha_threshold)
            .collect();
        Self {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            opaque,
        }
    }

    fn opaque(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.opaque[y as usize * self.width + x as usize]
    }

    /// Flood-fill from a seed, returning boundary pixels in discovery order.
    /// The seed comes first; it is always a boundary pixel since the pixel
    /// above it precedes it in scan order.
    fn region_boundary(&self, seed_x: usize, seed_y: usize, visited: &mut [bool]) -> Vec<(i64, i64)> {
        let mut boundary = Vec::new();
        let mut stack = vec![(seed_x as i64, seed_y as i64)];

        while let Some((x, y)) = stack.pop() {
            if !self.opaque(x, y) {
                continue;
            }
            let idx = y as usize * self.width + x as usize;
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let is_boundary = !self.opaque(x - 1, y)
                || !self.opaque(x + 1, y)
                || !self.opaque(x, y - 1)
                || !self.opaque(x, y + 1);
            if is_boundary {
                boundary.push((x, y));
            }

            stack.push((x + 1, y));
            stack.push((x - 1, y));
            stack.push((x, y + 1));
            stack.push((x, y - 1));
        }
        boundary
    }
}

/// Chain boundary pixels into a walk, starting at the first one.
fn order_boundary(mut remaining: Vec<(i64, i64)>) -> Vec<Point> {
    let mut current = remaining.remove(0);
    let mut ordered = Vec::with_capacity(remaining.len() + 1);
    ordered.push(current);

    while !remaining.is_empty() {
        let next = nearest(&remaining, current, true).or_else(|| nearest(&remaining, current, false));
        let Some(idx) = next else { break };
        current = remaining.remove(idx);
        ordered.push(current);
    }

    ordered
        .into_iter()
        .map(|(x, y)| Point::new(x as f64, y as f64))
        .collect()
}

/// Index of the closest candidate (squared Euclidean), earliest on ties.
fn nearest(candidates: &[(i64, i64)], from: (i64, i64), adjacent_only: bool) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, &(x, y)) in candidates.iter().enumerate() {
        let (dx, dy) = (x - from.0, y - from.1);
        if adjacent_only && dx.abs().max(dy.abs()) > ADJACENT_DISTANCE {
            continue;
        }
        let dist = dx * dx + dy * dy;
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best.map(|(i, _)| i)
}
