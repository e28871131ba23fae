//! Geometry Normalizer
//!
//! Fits arbitrary vector content into the canonical square canvas:
//! background shape first, then every content element wrapped in one
//! translate+scale group centred in the safe zone.

use kurbo::{Affine, Point, Rect};

use crate::background::BackgroundMatch;
use crate::bounds;
use crate::document::{Geometry, Paint, VectorDocument, VectorElement, ViewBox};
use crate::options::{BackgroundShape, ConvertOptions};

/// Edge length of the canonical frame, in logical units.
pub const CANVAS_SIZE: f64 = 100.0;

/// Corner radius of the rounded-square background, as a fraction of the edge.
pub const ROUNDED_CORNER_FRACTION: f64 = 0.2;

/// Source frame assumed when a document declares none.
const DEFAULT_SOURCE_SIZE: f64 = 100.0;

/// The uniform map from source coordinates to the canonical canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl FitTransform {
    pub fn to_affine(self) -> Affine {
        Affine::translate((self.translate_x, self.translate_y)) * Affine::scale(self.scale)
    }
}

/// Safe zone `[min, max]` on both axes of the canonical canvas.
pub fn safe_zone(padding_percent: f64) -> (f64, f64) {
    let safe_min = CANVAS_SIZE * padding_percent / 100.0;
    (safe_min, CANVAS_SIZE - safe_min)
}

/// Content elements: all top-level elements except exact full-frame
/// backgrounds, so normalizing twice never stacks backgrounds.
pub fn content_elements<'a>(doc: &'a VectorDocument) -> Vec<&'a VectorElement> {
    let frame = source_frame(doc);
    doc.elements
        .iter()
        .filter(|e| !BackgroundMatch::Exact.matches(e, &frame))
        .collect()
}

/// Compute the fit for measured content `bounds` in `frame`.
///
/// Total: a missing or zero-area box falls back to the plain frame scale.
pub fn compute_fit(frame: &ViewBox, content: Option<Rect>, padding_percent: f64) -> FitTransform {
    let canvas_scale = CANVAS_SIZE / frame.width.max(frame.height);
    let (safe_min, safe_max) = safe_zone(padding_percent);
    let safe = safe_max - safe_min;

    match content {
        Some(b) if b.width() > 0.0 && b.height() > 0.0 => {
            let fit_scale = (safe / (b.width() * canvas_scale)).min(safe / (b.height() * canvas_scale));
            let scale = canvas_scale * fit_scale;
            FitTransform {
                scale,
                translate_x: safe_min + (safe - b.width() * scale) / 2.0 - b.x0 * scale,
                translate_y: safe_min + (safe - b.height() * scale) / 2.0 - b.y0 * scale,
            }
        }
        Some(b) => {
            // Degenerate box: centre it on the safe zone at frame scale.
            let mid = (safe_min + safe_max) / 2.0;
            let centre = b.center();
            FitTransform {
                scale: canvas_scale,
                translate_x: mid - centre.x * canvas_scale,
                translate_y: mid - centre.y * canvas_scale,
            }
        }
        None => FitTransform {
            scale: canvas_scale,
            translate_x: 0.0,
            translate_y: 0.0,
        },
    }
}

/// Normalize `doc` onto the canonical canvas. Never fails.
pub fn normalize(doc: &VectorDocument, options: &ConvertOptions) -> VectorDocument {
    let frame = source_frame(doc);
    let padding = options.clamped_padding();
    if padding != options.padding_percent {
        tracing::warn!(
            "Padding {}% out of range, using {}%",
            options.padding_percent,
            padding
        );
    }

    let content: Vec<VectorElement> = content_elements(doc).into_iter().cloned().collect();
    let measured = bounds::content_bounds(&content);
    let fit = compute_fit(&frame, measured, padding);
    tracing::debug!(
        "Normalize: frame {}x{}, content {:?}, fit {:?}",
        frame.width,
        frame.height,
        measured,
        fit
    );

    let mut elements = vec![background_element(options)];
    if !content.is_empty() {
        elements.push(
            VectorElement::new(Geometry::Group(content), Paint::default())
                .with_transform(fit.to_affine()),
        );
    }

    VectorDocument {
        view_box: Some(ViewBox::square(CANVAS_SIZE)),
        title: options
            .title()
            .map(str::to_string)
            .or_else(|| doc.title.clone().filter(|t| !t.trim().is_empty())),
        elements,
    }
}

/// The full-canvas background shape for `options`.
pub fn background_element(options: &ConvertOptions) -> VectorElement {
    let paint = Paint::filled(&options.background_color);
    let half = CANVAS_SIZE / 2.0;
    let geometry = match options.shape {
        BackgroundShape::Circle => Geometry::Circle {
            center: Point::new(half, half),
            r: half,
        },
        BackgroundShape::RoundedSquare => Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            rx: CANVAS_SIZE * ROUNDED_CORNER_FRACTION,
            ry: CANVAS_SIZE * ROUNDED_CORNER_FRACTION,
        },
    };
    VectorElement::new(geometry, paint)
}

fn source_frame(doc: &VectorDocument) -> ViewBox {
    doc.view_box
        .unwrap_or_else(|| ViewBox::square(DEFAULT_SOURCE_SIZE))
}
