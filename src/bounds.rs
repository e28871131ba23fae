//! Geometric bounding boxes over the document model.
//!
//! Boxes are computed per primitive and unioned, with every local and
//! ancestor transform applied before measuring. Stroke width is not
//! included. Rounded rect corners are measured as square corners.

use kurbo::{Affine, BezPath, Point, Rect, Shape};

use crate::document::{Geometry, TextSpan, VectorElement};

/// Advance of one character as a fraction of the font size.
const TEXT_ADVANCE_EM: f64 = 0.6;

/// Box of one element in the coordinate space of `parent`.
///
/// `None` for empty groups and empty paths.
pub fn element_bounds(element: &VectorElement, parent: Affine) -> Option<Rect> {
    let transform = parent * element.local_transform();
    match &element.geometry {
        Geometry::Group(children) => union_all(children.iter().map(|c| element_bounds(c, transform))),
        Geometry::Text(span) => Some(transform.transform_rect_bbox(text_box(span))),
        Geometry::Circle { center, r } => Some(ellipse_box(transform, *center, *r, *r)),
        Geometry::Ellipse { center, rx, ry } => Some(ellipse_box(transform, *center, *rx, *ry)),
        Geometry::Rect { x, y, width, height, .. } => {
            Some(transform.transform_rect_bbox(Rect::new(*x, *y, x + width, y + height)))
        }
        Geometry::Path(path) => path_box(path.clone(), transform),
        Geometry::Polygon(points) => {
            let (first, rest) = points.split_first()?;
            let mut path = BezPath::new();
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            path.close_path();
            path_box(path, transform)
        }
    }
}

/// Union of the boxes of `elements`, measured in their shared frame.
pub fn content_bounds(elements: &[VectorElement]) -> Option<Rect> {
    union_all(elements.iter().map(|e| element_bounds(e, Affine::IDENTITY)))
}

fn union_all(boxes: impl Iterator<Item = Option<Rect>>) -> Option<Rect> {
    boxes.flatten().reduce(|acc, r| acc.union(r))
}

fn path_box(mut path: BezPath, transform: Affine) -> Option<Rect> {
    if path.elements().is_empty() {
        return None;
    }
    path.apply_affine(transform);
    Some(path.bounding_box())
}

/// Exact box of an axis-aligned ellipse under an affine map.
fn ellipse_box(transform: Affine, center: Point, rx: f64, ry: f64) -> Rect {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    let half_w = (a * rx).hypot(c * ry);
    let half_h = (b * rx).hypot(d * ry);
    let mid = transform * center;
    Rect::new(mid.x - half_w, mid.y - half_h, mid.x + half_w, mid.y + half_h)
}

/// Estimated box of a text run: one em tall above the baseline.
fn text_box(span: &TextSpan) -> Rect {
    let advance = span.font_size * TEXT_ADVANCE_EM * span.content.chars().count() as f64;
    Rect::new(span.x, span.y - span.font_size, span.x + advance, span.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paint;

    fn approx(a: Rect, b: Rect) -> bool {
        (a.x0 - b.x0).abs() < 1e-6
            && (a.y0 - b.y0).abs() < 1e-6
            && (a.x1 - b.x1).abs() < 1e-6
            && (a.y1 - b.y1).abs() < 1e-6
    }

    fn circle(cx: f64, cy: f64, r: f64) -> VectorElement {
        VectorElement::new(Geometry::Circle { center: Point::new(cx, cy), r }, Paint::default())
    }

    #[test]
    fn test_circle_bounds() {
        let b = element_bounds(&circle(10.0, 20.0, 5.0), Affine::IDENTITY).unwrap();
        assert!(approx(b, Rect::new(5.0, 15.0, 15.0, 25.0)));
    }

    #[test]
    fn test_path_bounds_include_curve_extrema() {
        let path = BezPath::from_svg("M0 0 C 0 10 10 10 10 0").unwrap();
        let el = VectorElement::new(Geometry::Path(path), Paint::default());
        let b = element_bounds(&el, Affine::IDENTITY).unwrap();
        assert!(approx(b, Rect::new(0.0, 0.0, 10.0, 7.5)));
    }

    #[test]
    fn test_local_transform_applied() {
        let el = circle(0.0, 0.0, 1.0).with_transform(Affine::translate((10.0, 5.0)) * Affine::scale(2.0));
        let b = element_bounds(&el, Affine::IDENTITY).unwrap();
        assert!(approx(b, Rect::new(8.0, 3.0, 12.0, 7.0)));
    }

    #[test]
    fn test_group_composes_transforms() {
        let inner = circle(0.0, 0.0, 1.0).with_transform(Affine::scale(3.0));
        let group = VectorElement::new(Geometry::Group(vec![inner, circle(20.0, 0.0, 1.0)]), Paint::default())
            .with_transform(Affine::translate((5.0, 5.0)));
        let b = element_bounds(&group, Affine::IDENTITY).unwrap();
        assert!(approx(b, Rect::new(2.0, 2.0, 26.0, 8.0)));
    }

    #[test]
    fn test_empty_group_has_no_bounds() {
        let group = VectorElement::new(Geometry::Group(vec![]), Paint::default());
        assert_eq!(element_bounds(&group, Affine::IDENTITY), None);
        assert_eq!(content_bounds(&[]), None);
    }

    #[test]
    fn test_rect_and_polygon_union() {
        let rect = VectorElement::new(
            Geometry::Rect { x: 10.0, y: 10.0, width: 5.0, height: 5.0, rx: 1.0, ry: 1.0 },
            Paint::default(),
        );
        let poly = VectorElement::new(
            Geometry::Polygon(vec![Point::new(0.0, 2.0), Point::new(3.0, 0.0), Point::new(4.0, 4.0)]),
            Paint::default(),
        );
        let b = content_bounds(&[rect, poly]).unwrap();
        assert!(approx(b, Rect::new(0.0, 0.0, 15.0, 15.0)));
    }

    #[test]
    fn test_text_estimate() {
        let text = VectorElement::new(
            Geometry::Text(TextSpan {
                x: 10.0,
                y: 50.0,
                font_size: 10.0,
                font_family: None,
                content: "ACME".into(),
            }),
            Paint::default(),
        );
        let b = element_bounds(&text, Affine::IDENTITY).unwrap();
        assert!(approx(b, Rect::new(10.0, 40.0, 34.0, 50.0)));
    }
}
