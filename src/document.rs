//! Vector Document Model
//!
//! Drawable elements plus a declared coordinate frame. Documents are value
//! objects: stages build new documents instead of editing their input.

use kurbo::{Affine, BezPath, Point};

/// Fill given to traced silhouettes.
pub const TRACE_FILL: &str = "#000000";

/// Declared coordinate frame (`viewBox`). Width and height are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Returns `None` unless both dimensions are finite and positive.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        let finite = [x, y, width, height].iter().all(|v| v.is_finite());
        (finite && width > 0.0 && height > 0.0).then_some(Self { x, y, width, height })
    }

    pub fn square(size: f64) -> Self {
        Self { x: 0.0, y: 0.0, width: size, height: size }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Parse `min-x min-y width height`, separated by whitespace and/or commas.
    pub fn parse(raw: &str) -> Option<Self> {
        let values: Vec<f64> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok())
            .collect::<Option<_>>()?;
        match values.as_slice() {
            [x, y, w, h] => Self::new(*x, *y, *w, *h),
            _ => None,
        }
    }
}

/// Presentation attributes. Colours keep their literal notation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
    pub fill_rule: Option<String>,
}

impl Paint {
    pub fn filled(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub font_family: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Path(BezPath),
    Polygon(Vec<Point>),
    Circle { center: Point, r: f64 },
    Ellipse { center: Point, rx: f64, ry: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64 },
    Text(TextSpan),
    Group(Vec<VectorElement>),
}

impl Geometry {
    pub fn tag(&self) -> &'static str {
        match self {
            Geometry::Path(_) => "path",
            Geometry::Polygon(_) => "polygon",
            Geometry::Circle { .. } => "circle",
            Geometry::Ellipse { .. } => "ellipse",
            Geometry::Rect { .. } => "rect",
            Geometry::Text(_) => "text",
            Geometry::Group(_) => "g",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorElement {
    pub geometry: Geometry,
    pub paint: Paint,
    pub transform: Option<Affine>,
}

impl VectorElement {
    pub fn new(geometry: Geometry, paint: Paint) -> Self {
        Self { geometry, paint, transform: None }
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Local transform, identity when absent.
    pub fn local_transform(&self) -> Affine {
        self.transform.unwrap_or(Affine::IDENTITY)
    }

    pub fn children(&self) -> &[VectorElement] {
        match &self.geometry {
            Geometry::Group(children) => children,
            _ => &[],
        }
    }

    /// This element followed by all descendants, depth first.
    pub fn walk(&self) -> Vec<&VectorElement> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.walk());
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorDocument {
    pub view_box: Option<ViewBox>,
    pub title: Option<String>,
    pub elements: Vec<VectorElement>,
}

impl VectorDocument {
    pub fn new(view_box: Option<ViewBox>, elements: Vec<VectorElement>) -> Self {
        Self { view_box, title: None, elements }
    }

    /// Build a document from traced outlines in pixel coordinates.
    ///
    /// A conversion must always yield something drawable, so with no
    /// outlines the `fallback` rectangle (pixel bounds `x0, y0, x1, y1`) is
    /// used instead.
    pub fn from_outlines(
        width: u32,
        height: u32,
        outlines: Vec<Vec<Point>>,
        fallback: (u32, u32, u32, u32),
    ) -> Self {
        let view_box = ViewBox::new(0.0, 0.0, f64::from(width), f64::from(height));
        let polygons: Vec<Vec<Point>> = if outlines.is_empty() {
            let (x0, y0, x1, y1) = fallback;
            let (x0, y0, x1, y1) = (f64::from(x0), f64::from(y0), f64::from(x1), f64::from(y1));
            tracing::debug!("No traced outlines, substituting rectangle {x0},{y0}-{x1},{y1}");
            vec![vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ]]
        } else {
            outlines
        };

        let elements = polygons
            .into_iter()
            .map(|points| VectorElement::new(Geometry::Polygon(points), Paint::filled(TRACE_FILL)))
            .collect();
        Self::new(view_box, elements)
    }

    /// Every element in document order, groups before their children.
    pub fn walk(&self) -> Vec<&VectorElement> {
        self.elements.iter().flat_map(|e| e.walk()).collect()
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().map_or(false, |t| !t.trim().is_empty())
    }
}
