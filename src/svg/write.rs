use std::fmt::Write as _;

use kurbo::Affine;

use super::{fmt_num, SVG_NAMESPACE};
use crate::document::{Geometry, Paint, VectorDocument, VectorElement};

/// Serialize a document. Output is deterministic for a given model.
pub fn write(doc: &VectorDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="{}" version="1.2" baseProfile="tiny-ps""#,
        SVG_NAMESPACE
    ));
    if let Some(vb) = &doc.view_box {
        out.push_str(&format!(
            r#" viewBox="{} {} {} {}" width="{}" height="{}""#,
            fmt_num(vb.x),
            fmt_num(vb.y),
            fmt_num(vb.width),
            fmt_num(vb.height),
            fmt_num(vb.width),
            fmt_num(vb.height)
        ));
    }
    out.push_str(">\n");

    if let Some(title) = &doc.title {
        out.push_str(&format!("  <title>{}</title>\n", escape(title)));
    }
    for element in &doc.elements {
        write_element(&mut out, element, 1);
    }
    out.push_str("</svg>\n");
    out
}

fn write_element(out: &mut String, element: &VectorElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let tag = element.geometry.tag();
    let mut attrs = geometry_attrs(&element.geometry);
    paint_attrs(&element.paint, &mut attrs);
    if let Some(t) = element.transform {
        attrs.push(("transform", transform_value(t)));
    }

    let _ = write!(out, "{}<{}", indent, tag);
    for (name, value) in &attrs {
        let _ = write!(out, r#" {}="{}""#, name, escape(value));
    }

    match &element.geometry {
        Geometry::Group(children) => {
            out.push_str(">\n");
            for child in children {
                write_element(out, child, depth + 1);
            }
            let _ = writeln!(out, "{}</g>", indent);
        }
        Geometry::Text(span) => {
            let _ = writeln!(out, ">{}</text>", escape(&span.content));
        }
        _ => out.push_str("/>\n"),
    }
}

fn geometry_attrs(geometry: &Geometry) -> Vec<(&'static str, String)> {
    match geometry {
        Geometry::Path(path) => vec![("d", path.to_svg())],
        Geometry::Polygon(points) => {
            let list = points
                .iter()
                .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
                .collect::<Vec<_>>()
                .join(" ");
            vec![("points", list)]
        }
        Geometry::Circle { center, r } => vec![
            ("cx", fmt_num(center.x)),
            ("cy", fmt_num(center.y)),
            ("r", fmt_num(*r)),
        ],
        Geometry::Ellipse { center, rx, ry } => vec![
            ("cx", fmt_num(center.x)),
            ("cy", fmt_num(center.y)),
            ("rx", fmt_num(*rx)),
            ("ry", fmt_num(*ry)),
        ],
        Geometry::Rect { x, y, width, height, rx, ry } => {
            let mut attrs = vec![
                ("x", fmt_num(*x)),
                ("y", fmt_num(*y)),
                ("width", fmt_num(*width)),
                ("height", fmt_num(*height)),
            ];
            if *rx > 0.0 || *ry > 0.0 {
                attrs.push(("rx", fmt_num(*rx)));
                attrs.push(("ry", fmt_num(*ry)));
            }
            attrs
        }
        Geometry::Text(span) => {
            let mut attrs = vec![
                ("x", fmt_num(span.x)),
                ("y", fmt_num(span.y)),
                ("font-size", fmt_num(span.font_size)),
            ];
            if let Some(family) = &span.font_family {
                attrs.push(("font-family", family.clone()));
            }
            attrs
        }
        Geometry::Group(_) => vec![],
    }
}

fn paint_attrs(paint: &Paint, attrs: &mut Vec<(&'static str, String)>) {
    if let Some(fill) = &paint.fill {
        attrs.push(("fill", fill.clone()));
    }
    if let Some(rule) = &paint.fill_rule {
        attrs.push(("fill-rule", rule.clone()));
    }
    if let Some(v) = paint.fill_opacity {
        attrs.push(("fill-opacity", fmt_num(v)));
    }
    if let Some(stroke) = &paint.stroke {
        attrs.push(("stroke", stroke.clone()));
    }
    if let Some(v) = paint.stroke_width {
        attrs.push(("stroke-width", fmt_num(v)));
    }
    if let Some(v) = paint.opacity {
        attrs.push(("opacity", fmt_num(v)));
    }
}

/// `translate(..) scale(..)` when the map is a uniform scale plus offset,
/// `matrix(..)` otherwise.
fn transform_value(t: Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    if b == 0.0 && c == 0.0 && a == d {
        format!("translate({}, {}) scale({})", fmt_num(e), fmt_num(f), fmt_num(a))
    } else {
        format!(
            "matrix({} {} {} {} {} {})",
            fmt_num(a),
            fmt_num(b),
            fmt_num(c),
            fmt_num(d),
            fmt_num(e),
            fmt_num(f)
        )
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{TextSpan, ViewBox};
    use kurbo::Point;

    #[test]
    fn test_root_attributes() {
        let doc = VectorDocument::new(Some(ViewBox::square(100.0)), vec![]);
        let text = write(&doc);
        assert!(text.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.2" baseProfile="tiny-ps" viewBox="0 0 100 100" width="100" height="100">"#
        ));
    }

    #[test]
    fn test_escapes_text() {
        let text_el = VectorElement::new(
            Geometry::Text(TextSpan {
                x: 0.0,
                y: 10.0,
                font_size: 10.0,
                font_family: Some("Georgia, serif".into()),
                content: "A<B & \"C\"".into(),
            }),
            Paint::filled("#000"),
        );
        let mut doc = VectorDocument::new(None, vec![text_el]);
        doc.title = Some("Tom & Jerry".into());
        let text = write(&doc);
        assert!(text.contains("<title>Tom &amp; Jerry</title>"));
        assert!(text.contains(">A&lt;B &amp; &quot;C&quot;</text>"));
    }

    #[test]
    fn test_transform_forms() {
        let uniform = Affine::translate((12.5, 12.5)) * Affine::scale(0.75);
        assert_eq!(transform_value(uniform), "translate(12.5, 12.5) scale(0.75)");
        let skewed = Affine::new([1.0, 0.5, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(transform_value(skewed), "matrix(1 0.5 0 1 0 0)");
    }

    #[test]
    fn test_rounded_rect_radii() {
        let rect = VectorElement::new(
            Geometry::Rect { x: 0.0, y: 0.0, width: 100.0, height: 100.0, rx: 20.0, ry: 20.0 },
            Paint::filled("#FFFFFF"),
        );
        let poly = VectorElement::new(
            Geometry::Polygon(vec![Point::new(0.0, 0.0), Point::new(1.5, 0.0), Point::new(1.0, 2.0)]),
            Paint::filled("#000000"),
        );
        let text = write(&VectorDocument::new(None, vec![rect, poly]));
        assert!(text.contains(r##"<rect x="0" y="0" width="100" height="100" rx="20" ry="20" fill="#FFFFFF"/>"##));
        assert!(text.contains(r##"<polygon points="0,0 1.5,0 1,2" fill="#000000"/>"##));
    }
}
