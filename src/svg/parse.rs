use kurbo::{Affine, BezPath, Point};
use roxmltree::Node;

use crate::document::{Geometry, Paint, TextSpan, VectorDocument, VectorElement, ViewBox};
use crate::error::InputError;

const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Frame percentages resolve against when the root declares no viewBox.
const DEFAULT_FRAME_SIZE: f64 = 100.0;

/// Counts of content removed while parsing. These never reach the model,
/// so the validator reads them from here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrippedContent {
    pub images: usize,
    pub scripts: usize,
    pub foreign_objects: usize,
    pub style_blocks: usize,
    pub comments: usize,
    pub unsupported: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedSvg {
    pub document: VectorDocument,
    pub stripped: StrippedContent,
}

/// Parse SVG text into a sanitized document.
pub fn parse(text: &str) -> Result<ParsedSvg, InputError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, options)?;
    let root = xml.root_element();
    if root.tag_name().name() != "svg" {
        return Err(InputError::MissingRoot(root.tag_name().name().to_string()));
    }

    let view_box = root.attribute("viewBox").and_then(ViewBox::parse);
    let lengths = Lengths::new(view_box.unwrap_or_else(|| ViewBox::square(DEFAULT_FRAME_SIZE)));

    let mut stripped = StrippedContent::default();
    let mut title = None;
    let mut elements = Vec::new();
    for child in root.children() {
        if child.is_comment() {
            stripped.comments += 1;
        } else if child.is_element() && child.tag_name().name() == "title" {
            title = title.or_else(|| text_content(child));
        } else if child.is_element() {
            elements.extend(convert(child, &lengths, &mut stripped));
        }
    }

    tracing::debug!(
        "Parsed SVG: {} top-level elements, stripped {:?}",
        elements.len(),
        stripped
    );

    Ok(ParsedSvg {
        document: VectorDocument { view_box, title, elements },
        stripped,
    })
}

fn convert(node: Node<'_, '_>, lengths: &Lengths, stripped: &mut StrippedContent) -> Option<VectorElement> {
    let geometry = match node.tag_name().name() {
        "g" | "a" | "switch" => {
            let mut children = Vec::new();
            for child in node.children() {
                if child.is_comment() {
                    stripped.comments += 1;
                } else if child.is_element() {
                    children.extend(convert(child, lengths, stripped));
                }
            }
            if children.is_empty() {
                return None;
            }
            Geometry::Group(children)
        }
        "path" => {
            let path = BezPath::from_svg(node.attribute("d")?).ok()?;
            if path.elements().is_empty() {
                return None;
            }
            Geometry::Path(path)
        }
        "rect" => {
            let width = lengths.get(node, "width", Axis::X)?;
            let height = lengths.get(node, "height", Axis::Y)?;
            if width <= 0.0 || height <= 0.0 {
                return None;
            }
            let rx = lengths.get(node, "rx", Axis::X);
            let ry = lengths.get(node, "ry", Axis::Y);
            Geometry::Rect {
                x: lengths.get(node, "x", Axis::X).unwrap_or(0.0),
                y: lengths.get(node, "y", Axis::Y).unwrap_or(0.0),
                width,
                height,
                rx: rx.or(ry).unwrap_or(0.0),
                ry: ry.or(rx).unwrap_or(0.0),
            }
        }
        "circle" => {
            let r = lengths.get(node, "r", Axis::Diagonal).filter(|r| *r > 0.0)?;
            Geometry::Circle { center: lengths.center(node), r }
        }
        "ellipse" => {
            let rx = lengths.get(node, "rx", Axis::X);
            let ry = lengths.get(node, "ry", Axis::Y);
            let (rx, ry) = (rx.or(ry)?, ry.or(rx)?);
            if rx <= 0.0 || ry <= 0.0 {
                return None;
            }
            Geometry::Ellipse { center: lengths.center(node), rx, ry }
        }
        "line" => {
            if ["x1", "y1", "x2", "y2"].iter().all(|a| node.attribute(*a).is_none()) {
                return None;
            }
            let coord = |name, axis| lengths.get(node, name, axis).unwrap_or(0.0);
            let mut path = BezPath::new();
            path.move_to((coord("x1", Axis::X), coord("y1", Axis::Y)));
            path.line_to((coord("x2", Axis::X), coord("y2", Axis::Y)));
            Geometry::Path(path)
        }
        "polygon" => {
            let points = parse_points(node.attribute("points")?);
            if points.len() < 2 {
                return None;
            }
            Geometry::Polygon(points)
        }
        "polyline" => {
            let points = parse_points(node.attribute("points")?);
            let (first, rest) = points.split_first()?;
            if rest.is_empty() {
                return None;
            }
            let mut path = BezPath::new();
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            Geometry::Path(path)
        }
        "text" => {
            let content = text_content(node)?;
            let style = style_declarations(node);
            Geometry::Text(TextSpan {
                x: first_number(node.attribute("x")).unwrap_or(0.0),
                y: first_number(node.attribute("y")).unwrap_or(0.0),
                font_size: lookup(node, &style, "font-size")
                    .and_then(parse_number)
                    .filter(|s| *s > 0.0)
                    .unwrap_or(DEFAULT_FONT_SIZE),
                font_family: lookup(node, &style, "font-family").map(str::to_string),
                content,
            })
        }
        "image" => {
            stripped.images += 1;
            return None;
        }
        "script" => {
            stripped.scripts += 1;
            return None;
        }
        "foreignObject" => {
            stripped.foreign_objects += 1;
            return None;
        }
        "style" => {
            stripped.style_blocks += 1;
            return None;
        }
        other => {
            tracing::debug!("Dropping unsupported <{}>", other);
            stripped.unsupported += 1;
            tally_nested(node, stripped);
            return None;
        }
    };

    let transform = node
        .attribute("transform")
        .and_then(parse_transform)
        .filter(|t| *t != Affine::IDENTITY);

    Some(VectorElement {
        geometry,
        paint: parse_paint(node),
        transform,
    })
}

/// Count forbidden content hidden inside a dropped subtree (e.g. `<defs>`).
fn tally_nested(node: Node<'_, '_>, stripped: &mut StrippedContent) {
    for inner in node.descendants().skip(1) {
        if inner.is_comment() {
            stripped.comments += 1;
            continue;
        }
        match inner.tag_name().name() {
            "image" if inner.is_element() => stripped.images += 1,
            "script" if inner.is_element() => stripped.scripts += 1,
            "foreignObject" if inner.is_element() => stripped.foreign_objects += 1,
            "style" if inner.is_element() => stripped.style_blocks += 1,
            _ => {}
        }
    }
}

fn parse_paint(node: Node<'_, '_>) -> Paint {
    let style = style_declarations(node);
    let color = |name: &str| {
        lookup(node, &style, name)
            .filter(|v| {
                let external = v.starts_with("url(");
                if external {
                    tracing::debug!("Dropping {} reference {}", name, v);
                }
                !external
            })
            .map(str::to_string)
    };
    let number = |name: &str| lookup(node, &style, name).and_then(parse_number);

    Paint {
        fill: color("fill"),
        stroke: color("stroke"),
        stroke_width: number("stroke-width"),
        opacity: number("opacity"),
        fill_opacity: number("fill-opacity"),
        fill_rule: lookup(node, &style, "fill-rule").map(str::to_string),
    }
}

/// Declarations of the inline `style` attribute.
fn style_declarations<'a>(node: Node<'a, '_>) -> Vec<(&'a str, &'a str)> {
    node.attribute("style")
        .map(|style| {
            style
                .split(';')
                .filter_map(|decl| decl.split_once(':'))
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// A style declaration wins over the presentation attribute.
fn lookup<'a>(node: Node<'a, '_>, style: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
    style
        .iter()
        .rev()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| *v)
        .or_else(|| node.attribute(name).map(str::trim))
        .filter(|v| !v.is_empty())
}

fn text_content(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    /// Radii: the frame diagonal divided by sqrt(2).
    Diagonal,
}

/// Resolves length attributes, including percentages of the frame.
struct Lengths {
    frame: ViewBox,
}

impl Lengths {
    fn new(frame: ViewBox) -> Self {
        Self { frame }
    }

    fn get(&self, node: Node<'_, '_>, name: &str, axis: Axis) -> Option<f64> {
        let raw = node.attribute(name)?.trim();
        let Some(percent) = raw.strip_suffix('%') else {
            return parse_number(raw);
        };
        let percent = percent.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        let reference = match axis {
            Axis::X => self.frame.width,
            Axis::Y => self.frame.height,
            Axis::Diagonal => {
                ((self.frame.width.powi(2) + self.frame.height.powi(2)) / 2.0).sqrt()
            }
        };
        Some(percent / 100.0 * reference)
    }

    fn center(&self, node: Node<'_, '_>) -> Point {
        Point::new(
            self.get(node, "cx", Axis::X).unwrap_or(0.0),
            self.get(node, "cy", Axis::Y).unwrap_or(0.0),
        )
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let value = ["px", "pt", "mm", "cm", "in"]
        .iter()
        .find_map(|unit| trimmed.strip_suffix(unit))
        .unwrap_or(trimmed)
        .trim();
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn first_number(raw: Option<&str>) -> Option<f64> {
    split_numbers(raw?).first().copied()
}

fn split_numbers(raw: &str) -> Vec<f64> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(parse_number)
        .collect()
}

fn parse_points(raw: &str) -> Vec<Point> {
    split_numbers(raw)
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Parse an SVG `transform` attribute. `None` when any function is malformed.
pub fn parse_transform(raw: &str) -> Option<Affine> {
    let mut out = Affine::IDENTITY;
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = open + rest[open..].find(')')?;
        let name = rest[..open].trim();
        let args = split_numbers(&rest[open + 1..close]);

        let step = match (name, args.as_slice()) {
            ("translate", [tx]) => Affine::translate((*tx, 0.0)),
            ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
            ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", [deg, cx, cy]) => {
                Affine::translate((*cx, *cy))
                    * Affine::rotate(deg.to_radians())
                    * Affine::translate((-cx, -cy))
            }
            ("skewX", [deg]) => Affine::skew(deg.to_radians().tan(), 0.0),
            ("skewY", [deg]) => Affine::skew(0.0, deg.to_radians().tan()),
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            _ => return None,
        };
        out = out * step;
        rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> ParsedSvg {
        parse(text).unwrap()
    }

    #[test]
    fn test_rejects_non_svg_root() {
        let err = parse("<html><body/></html>").unwrap_err();
        assert!(matches!(err, InputError::MissingRoot(ref name) if name == "html"));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(matches!(parse("<svg><g></svg>"), Err(InputError::Xml(_))));
    }

    #[test]
    fn test_accepts_doctype() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="5" height="5"/></svg>"#;
        assert_eq!(parse_ok(text).document.elements.len(), 1);
    }

    #[test]
    fn test_strips_forbidden_content() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
            <!-- exported by tool -->
            <script>alert(1)</script>
            <image href="logo.png" width="10" height="10"/>
            <foreignObject><div xmlns="http://www.w3.org/1999/xhtml">hi</div></foreignObject>
            <style>.a { fill: red }</style>
            <defs><image href="x.png"/></defs>
            <circle cx="5" cy="5" r="2"/>
        </svg>"#;
        let parsed = parse_ok(text);
        assert_eq!(parsed.document.elements.len(), 1);
        assert_eq!(
            parsed.stripped,
            StrippedContent {
                images: 2,
                scripts: 1,
                foreign_objects: 1,
                style_blocks: 1,
                comments: 1,
                unsupported: 1,
            }
        );
    }

    #[test]
    fn test_drops_elements_without_geometry() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path/>
            <rect width="10"/>
            <circle cx="3"/>
            <polygon points="1 1"/>
            <text> </text>
            <g><path/></g>
        </svg>"#;
        assert!(parse_ok(text).document.elements.is_empty());
    }

    #[test]
    fn test_view_box_and_title() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">
            <title> Acme Corp </title><rect width="1" height="1"/></svg>"#;
        let doc = parse_ok(text).document;
        assert_eq!(doc.view_box, ViewBox::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(doc.title.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_missing_view_box_is_none() {
        let doc = parse_ok(r#"<svg width="64" height="64"><rect width="1" height="1"/></svg>"#).document;
        assert_eq!(doc.view_box, None);
    }

    #[test]
    fn test_style_attribute_overrides_presentation() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect width="4" height="4" fill="red" stroke="blue" style="fill: #00ff00; stroke-width: 2px"/>
        </svg>"#;
        let paint = &parse_ok(text).document.elements[0].paint;
        assert_eq!(paint.fill.as_deref(), Some("#00ff00"));
        assert_eq!(paint.stroke.as_deref(), Some("blue"));
        assert_eq!(paint.stroke_width, Some(2.0));
    }

    #[test]
    fn test_url_paint_dropped() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="3" fill="url(#grad)"/></svg>"#;
        assert_eq!(parse_ok(text).document.elements[0].paint.fill, None);
    }

    #[test]
    fn test_shapes_and_text() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <ellipse cx="5" cy="6" rx="2"/>
            <line x2="10" y2="10"/>
            <polyline points="0,0 5,5 10,0"/>
            <text x="3 4" y="12" style="font-family: Brand Sans">AC<tspan>ME</tspan></text>
        </svg>"#;
        let doc = parse_ok(text).document;
        assert_eq!(doc.elements.len(), 4);
        assert!(matches!(doc.elements[0].geometry, Geometry::Ellipse { rx, ry, .. } if rx == 2.0 && ry == 2.0));
        assert!(matches!(doc.elements[1].geometry, Geometry::Path(_)));
        match &doc.elements[3].geometry {
            Geometry::Text(span) => {
                assert_eq!(span.content, "ACME");
                assert_eq!(span.x, 3.0);
                assert_eq!(span.font_family.as_deref(), Some("Brand Sans"));
                assert_eq!(span.font_size, DEFAULT_FONT_SIZE);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_parsing() {
        let t = parse_transform("translate(10, 5) scale(2)").unwrap();
        assert_eq!(t, Affine::new([2.0, 0.0, 0.0, 2.0, 10.0, 5.0]));

        let m = parse_transform("matrix(1 0 0 1 3 4)").unwrap();
        assert_eq!(m * Point::new(0.0, 0.0), Point::new(3.0, 4.0));

        let r = parse_transform("rotate(90 5 5)").unwrap() * Point::new(10.0, 5.0);
        assert!((r.x - 5.0).abs() < 1e-9 && (r.y - 10.0).abs() < 1e-9);

        assert_eq!(parse_transform("translate(1 2"), None);
        assert_eq!(parse_transform("wobble(3)"), None);
    }

    #[test]
    fn test_identity_transform_not_stored() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="3" transform="scale(1)"/></svg>"#;
        assert_eq!(parse_ok(text).document.elements[0].transform, None);
    }

    #[test]
    fn test_percentage_lengths_resolve_against_frame() {
        let text = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">
            <rect x="10%" width="50%" height="100%" fill="#fff"/>
            <circle cx="50%" cy="50%" r="10%"/>
        </svg>"##;
        let doc = parse_ok(text).document;
        assert_eq!(
            doc.elements[0].geometry,
            Geometry::Rect { x: 20.0, y: 0.0, width: 100.0, height: 100.0, rx: 0.0, ry: 0.0 }
        );
        match doc.elements[1].geometry {
            Geometry::Circle { center, r } => {
                assert_eq!(center, Point::new(100.0, 50.0));
                // 10% of sqrt((200^2 + 100^2) / 2)
                assert!((r - 15.811388300841896).abs() < 1e-9);
            }
            ref other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_percentage_dropped() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="abc%" height="10"/></svg>"#;
        assert!(parse_ok(text).document.elements.is_empty());
    }
}
