//! Background shape recognition.
//!
//! The normalizer and the validator must agree on what counts as a canvas
//! background, so both go through [`BackgroundMatch`].

use crate::document::{Geometry, VectorElement, ViewBox};

/// Circle centre may be off by this much in covering mode.
pub const CENTER_TOLERANCE: f64 = 1.0;
/// Circle radius may fall short of half the frame by this much.
pub const RADIUS_TOLERANCE: f64 = 1.0;
/// Rect may fall short of the frame edges by this much.
pub const EXTENT_TOLERANCE: f64 = 2.0;

const EXACT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMatch {
    /// Exactly the shape a normalizer would emit for this frame.
    Exact,
    /// Any shape covering the frame within the tolerances above.
    Covering,
}

impl BackgroundMatch {
    pub fn matches(self, element: &VectorElement, frame: &ViewBox) -> bool {
        if element.transform.is_some_and(|t| t != kurbo::Affine::IDENTITY) {
            return false;
        }
        let mid = frame.center();
        let half_edge = frame.width / 2.0;

        match (&element.geometry, self) {
            (Geometry::Circle { center, r }, BackgroundMatch::Exact) => {
                close(center.x, mid.x) && close(center.y, mid.y) && close(*r, half_edge)
            }
            (Geometry::Circle { center, r }, BackgroundMatch::Covering) => {
                (center.x - mid.x).abs() < CENTER_TOLERANCE
                    && (center.y - mid.y).abs() < CENTER_TOLERANCE
                    && *r >= half_edge - RADIUS_TOLERANCE
            }
            (Geometry::Rect { x, y, width, height, .. }, BackgroundMatch::Exact) => {
                close(*x, frame.x)
                    && close(*y, frame.y)
                    && close(*width, frame.width)
                    && close(*height, frame.height)
            }
            (Geometry::Rect { x, y, width, height, .. }, BackgroundMatch::Covering) => {
                *x <= frame.x + 1.0
                    && *y <= frame.y + 1.0
                    && *width >= frame.width - EXTENT_TOLERANCE
                    && *height >= frame.height - EXTENT_TOLERANCE
            }
            _ => false,
        }
    }

    /// Indices of the top-level elements matching in this mode.
    pub fn positions(self, elements: &[VectorElement], frame: &ViewBox) -> Vec<usize> {
        elements
            .iter()
            .enumerate()
            .filter(|(_, e)| self.matches(e, frame))
            .map(|(i, _)| i)
            .collect()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EXACT_EPSILON
}
