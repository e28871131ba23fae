//! SVG text in and out of the document model.

mod parse;
mod write;

pub use parse::{parse, parse_transform, ParsedSvg, StrippedContent};
pub use write::write;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Shortest text that reads back as exactly the same number.
pub(crate) fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        // Avoids "-0".
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Geometry, Paint, VectorDocument, VectorElement, ViewBox};
    use kurbo::{Affine, Point};

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(0.1 + 0.2).parse::<f64>().unwrap(), 0.1 + 0.2);
    }

    #[test]
    fn test_write_then_parse_preserves_model() {
        let inner = VectorElement::new(
            Geometry::Polygon(vec![Point::new(1.0, 1.0), Point::new(9.0, 1.0), Point::new(5.0, 8.5)]),
            Paint::filled("#000000"),
        );
        let group = VectorElement::new(Geometry::Group(vec![inner]), Paint::default())
            .with_transform(Affine::translate((12.5, 3.0)) * Affine::scale(0.75));
        let background = VectorElement::new(
            Geometry::Circle { center: Point::new(50.0, 50.0), r: 50.0 },
            Paint::filled("#FFFFFF"),
        );
        let mut doc = VectorDocument::new(Some(ViewBox::square(100.0)), vec![background, group]);
        doc.title = Some("Acme & Sons".to_string());

        let text = write(&doc);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.document, doc);
        assert_eq!(parsed.stripped, StrippedContent::default());
    }
}
