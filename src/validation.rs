//! Compliance Validation - Rule/Report Separation
//!
//! Each BIMI requirement is a rule producing a finding.
//! The validator runs the rules in a fixed order and folds findings into
//! a report: error findings flip the verdict, warnings never do.

use kurbo::Affine;
use serde::{Deserialize, Serialize};

use crate::background::BackgroundMatch;
use crate::bounds;
use crate::document::{Geometry, VectorDocument, VectorElement, ViewBox};
use crate::svg::{self, StrippedContent};

/// Smallest declared frame edge accepted.
pub const MIN_FRAME_SIZE: f64 = 64.0;
/// Margin assumed when checking artwork placement.
pub const ASSUMED_PADDING_PERCENT: f64 = 12.5;
/// Elements sampled by the safe-zone check.
pub const SAFE_ZONE_SAMPLE: usize = 10;

const SAFE_ZONE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub severity: ViolationSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub valid: bool,
    pub checks: Vec<ComplianceCheck>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ComplianceReport {
    /// A report for a document that could not be inspected at all.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            checks: vec![],
            errors: vec![error.into()],
            warnings: vec![],
        }
    }

    pub fn check(&self, name: &str) -> Option<&ComplianceCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn passed(&self, name: &str) -> bool {
        self.check(name).map_or(false, |c| c.passed)
    }
}

/// Result of one rule.
#[derive(Debug, Clone, Default)]
pub struct Finding {
    pub passed: bool,
    /// Short note shown on the check entry.
    pub message: Option<String>,
    /// Full sentence recorded as an error or warning when the rule fails.
    pub issue: Option<String>,
    /// Extra warnings, recorded whether or not the rule passed.
    pub advisories: Vec<String>,
}

impl Finding {
    pub fn pass() -> Self {
        Self { passed: true, ..Self::default() }
    }

    pub fn pass_with(message: impl Into<String>) -> Self {
        Self { passed: true, message: Some(message.into()), ..Self::default() }
    }

    pub fn fail(message: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            issue: Some(issue.into()),
            advisories: vec![],
        }
    }
}

/// Everything a rule may look at.
pub struct Inspection<'a> {
    pub doc: &'a VectorDocument,
    pub frame: ViewBox,
    pub stripped: &'a StrippedContent,
    /// Top-level indices of elements covering the canvas.
    pub backgrounds: Vec<usize>,
}

impl<'a> Inspection<'a> {
    pub fn new(doc: &'a VectorDocument, frame: ViewBox, stripped: &'a StrippedContent) -> Self {
        let backgrounds = BackgroundMatch::Covering.positions(&doc.elements, &frame);
        Self { doc, frame, stripped, backgrounds }
    }

    pub fn background(&self) -> Option<&'a VectorElement> {
        self.backgrounds.first().map(|&i| &self.doc.elements[i])
    }

    /// Non-background elements in pre-order with their parent transform.
    fn artwork(&self) -> Vec<(&'a VectorElement, Affine)> {
        fn visit<'e>(el: &'e VectorElement, parent: Affine, out: &mut Vec<(&'e VectorElement, Affine)>) {
            out.push((el, parent));
            let transform = parent * el.local_transform();
            for child in el.children() {
                visit(child, transform, out);
            }
        }

        let mut out = Vec::new();
        for (i, el) in self.doc.elements.iter().enumerate() {
            if !self.backgrounds.contains(&i) {
                visit(el, Affine::IDENTITY, &mut out);
            }
        }
        out
    }
}

/// Compliance rule trait - produces one finding
pub trait ComplianceRule {
    fn name(&self) -> &'static str;
    fn severity(&self) -> ViolationSeverity;
    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding;
}

// --- Concrete Rules ---

pub struct SquareFrameRule;

impl ComplianceRule for SquareFrameRule {
    fn name(&self) -> &'static str { "Square viewBox" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Error }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        let size = format!("{}x{}", ctx.frame.width, ctx.frame.height);
        if ctx.frame.width == ctx.frame.height {
            Finding::pass_with(size)
        } else {
            Finding::fail(
                format!("ViewBox is not square: {}", size),
                format!("ViewBox is not square: {}", size),
            )
        }
    }
}

pub struct MinimumSizeRule;

impl ComplianceRule for MinimumSizeRule {
    fn name(&self) -> &'static str { "Minimum size (64x64)" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Error }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        let size = format!("{}x{}", ctx.frame.width, ctx.frame.height);
        if ctx.frame.width >= MIN_FRAME_SIZE && ctx.frame.height >= MIN_FRAME_SIZE {
            Finding::pass_with(size)
        } else {
            Finding::fail(
                format!("Size {} is below minimum", size),
                format!("ViewBox size {} is below minimum 64x64", size),
            )
        }
    }
}

/// Fails when any element of a forbidden kind was present.
pub struct ForbiddenContentRule {
    name: &'static str,
    tag: &'static str,
    reason: &'static str,
    count: fn(&StrippedContent) -> usize,
}

impl ForbiddenContentRule {
    pub fn raster_images() -> Self {
        Self {
            name: "No raster images",
            tag: "image",
            reason: "BIMI requires vector-only SVG",
            count: |s| s.images,
        }
    }

    pub fn scripts() -> Self {
        Self {
            name: "No scripts",
            tag: "script",
            reason: "Scripts are not allowed in BIMI SVG",
            count: |s| s.scripts,
        }
    }

    pub fn foreign_objects() -> Self {
        Self {
            name: "No foreign objects",
            tag: "foreignObject",
            reason: "Foreign objects are not allowed",
            count: |s| s.foreign_objects,
        }
    }
}

impl ComplianceRule for ForbiddenContentRule {
    fn name(&self) -> &'static str { self.name }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Error }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        match (self.count)(ctx.stripped) {
            0 => Finding::pass(),
            n => Finding::fail(
                format!("Found {} <{}> tag(s)", n, self.tag),
                format!("Found {} <{}> tag(s). {}", n, self.tag, self.reason),
            ),
        }
    }
}

pub struct BackgroundRule;

impl ComplianceRule for BackgroundRule {
    fn name(&self) -> &'static str { "Solid background" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Error }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        match ctx.backgrounds.len() {
            0 => Finding::fail(
                "No background shape found",
                "No solid background shape found covering the entire viewBox",
            ),
            1 => Finding::pass(),
            n => {
                let mut finding = Finding::pass_with(format!("{} canvas-covering shapes", n));
                finding.advisories.push(format!(
                    "Found {} shapes covering the entire viewBox; only the first is treated as the background",
                    n
                ));
                finding
            }
        }
    }
}

pub struct OpaqueBackgroundRule;

impl ComplianceRule for OpaqueBackgroundRule {
    fn name(&self) -> &'static str { "Opaque background" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Error }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        let Some(background) = ctx.background() else {
            return Finding {
                passed: false,
                message: Some("Cannot check opacity without background".into()),
                issue: None,
                advisories: vec![],
            };
        };

        let paint = &background.paint;
        let translucent_color = paint.fill.as_deref().map_or(false, has_alpha_channel);
        let faded = [paint.opacity, paint.fill_opacity]
            .iter()
            .flatten()
            .any(|v| *v < 1.0);

        if translucent_color || faded {
            Finding::fail(
                "Background has transparency",
                "Background color has transparency (alpha channel). BIMI requires opaque background",
            )
        } else {
            Finding::pass()
        }
    }
}

pub struct TitleRule;

impl ComplianceRule for TitleRule {
    fn name(&self) -> &'static str { "Has title element" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Warning }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        if ctx.doc.has_title() {
            Finding::pass()
        } else {
            Finding::fail(
                "Missing <title> element (recommended)",
                "SVG missing <title> element. Some BIMI validators require a title for accessibility.",
            )
        }
    }
}

pub struct SafeZoneRule;

impl ComplianceRule for SafeZoneRule {
    fn name(&self) -> &'static str { "Artwork within safe zone" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Warning }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        let f = &ctx.frame;
        let (mx, my) = (
            f.width * ASSUMED_PADDING_PERCENT / 100.0,
            f.height * ASSUMED_PADDING_PERCENT / 100.0,
        );
        let (min_x, max_x) = (f.x + mx - SAFE_ZONE_TOLERANCE, f.x + f.width - mx + SAFE_ZONE_TOLERANCE);
        let (min_y, max_y) = (f.y + my - SAFE_ZONE_TOLERANCE, f.y + f.height - my + SAFE_ZONE_TOLERANCE);

        let offender = ctx
            .artwork()
            .into_iter()
            .take(SAFE_ZONE_SAMPLE)
            .filter_map(|(el, parent)| bounds::element_bounds(el, parent).map(|b| (el, b)))
            .find(|(_, b)| b.x0 < min_x || b.y0 < min_y || b.x1 > max_x || b.y1 > max_y);

        match offender {
            None => Finding::pass(),
            Some((el, _)) => Finding::fail(
                format!("<{}> extends outside the safe area", el.geometry.tag()),
                "Some artwork elements may extend outside the safe padding area",
            ),
        }
    }
}

pub struct StyleBlockRule;

impl ComplianceRule for StyleBlockRule {
    fn name(&self) -> &'static str { "No style blocks" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Warning }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        match ctx.stripped.style_blocks {
            0 => Finding::pass(),
            n => Finding::fail(
                format!("Found {} <style> tag(s)", n),
                "SVG contains <style> tags. Inline styles are preferred for BIMI",
            ),
        }
    }
}

pub struct FontFamilyRule;

impl ComplianceRule for FontFamilyRule {
    fn name(&self) -> &'static str { "Standard font families" }
    fn severity(&self) -> ViolationSeverity { ViolationSeverity::Warning }

    fn evaluate(&self, ctx: &Inspection<'_>) -> Finding {
        let external = ctx
            .doc
            .walk()
            .into_iter()
            .filter_map(|el| match &el.geometry {
                Geometry::Text(span) => span.font_family.as_deref(),
                _ => None,
            })
            .filter(|family| !family.to_ascii_lowercase().contains("serif"))
            .count();

        match external {
            0 => Finding::pass(),
            n => Finding::fail(
                format!("{} text element(s) with non-generic fonts", n),
                "Text elements may use external fonts. Convert text to paths for better compatibility",
            ),
        }
    }
}

/// True when a colour literal carries an alpha component below fully opaque.
///
/// Notations without an alpha component are opaque; `none` and
/// `transparent` are not.
pub fn has_alpha_channel(color: &str) -> bool {
    let color = color.trim().to_ascii_lowercase();
    if color == "none" || color == "transparent" {
        return true;
    }

    if let Some(hex) = color.strip_prefix('#') {
        return match hex.len() {
            8 => hex.get(6..8)
                .and_then(|a| u8::from_str_radix(a, 16).ok())
                .map_or(false, |a| a < 255),
            4 => hex.get(3..4)
                .and_then(|a| u8::from_str_radix(a, 16).ok())
                .map_or(false, |a| a < 15),
            _ => false,
        };
    }

    let functional = ["rgba(", "rgb(", "hsla(", "hsl("]
        .iter()
        .find_map(|prefix| color.strip_prefix(prefix));
    if let Some(args) = functional {
        let args = args.trim_end_matches(')');
        let parts: Vec<&str> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(alpha) = parts.get(3) {
            return parse_alpha(alpha).map_or(false, |a| a < 1.0);
        }
    }

    false
}

fn parse_alpha(raw: &str) -> Option<f64> {
    match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok().map(|p| p / 100.0),
        None => raw.parse::<f64>().ok(),
    }
}

/// Validator orchestrates rules and folds findings into a report
pub struct Validator {
    rules: Vec<Box<dyn ComplianceRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SquareFrameRule),
                Box::new(MinimumSizeRule),
                Box::new(ForbiddenContentRule::raster_images()),
                Box::new(ForbiddenContentRule::scripts()),
                Box::new(ForbiddenContentRule::foreign_objects()),
                Box::new(BackgroundRule),
                Box::new(OpaqueBackgroundRule),
                Box::new(TitleRule),
                Box::new(SafeZoneRule),
                Box::new(StyleBlockRule),
                Box::new(FontFamilyRule),
            ],
        }
    }

    pub fn validate(&self, doc: &VectorDocument, stripped: &StrippedContent) -> ComplianceReport {
        let Some(frame) = doc.view_box else {
            return ComplianceReport::rejected("SVG must have a valid viewBox attribute");
        };

        let ctx = Inspection::new(doc, frame, stripped);
        let mut report = ComplianceReport {
            valid: true,
            checks: vec![],
            errors: vec![],
            warnings: vec![],
        };

        for rule in &self.rules {
            let finding = rule.evaluate(&ctx);
            let severity = rule.severity();
            if !finding.passed {
                match severity {
                    ViolationSeverity::Error => {
                        report.valid = false;
                        report.errors.extend(finding.issue);
                    }
                    ViolationSeverity::Warning => report.warnings.extend(finding.issue),
                }
            }
            report.warnings.extend(finding.advisories);
            report.checks.push(ComplianceCheck {
                name: rule.name().to_string(),
                passed: finding.passed,
                message: finding.message,
                severity,
            });
        }

        tracing::debug!(
            "Validated: valid={}, {} errors, {} warnings",
            report.valid,
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Parse `text`, then validate. Unparseable text yields a rejected report.
    pub fn validate_svg(&self, text: &str) -> ComplianceReport {
        match svg::parse(text) {
            Ok(parsed) => self.validate(&parsed.document, &parsed.stripped),
            Err(err) => ComplianceReport::rejected(err.to_string()),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a document model. Content stripped from a model can never be
/// present, so only geometry, frame and paint rules can fail.
pub fn validate(doc: &VectorDocument) -> ComplianceReport {
    Validator::new().validate(doc, &StrippedContent::default())
}

/// Validate a parsed document together with what the parser stripped.
pub fn validate_parsed(doc: &VectorDocument, stripped: &StrippedContent) -> ComplianceReport {
    Validator::new().validate(doc, stripped)
}

/// Validate SVG text, including content the parser strips.
pub fn validate_svg(text: &str) -> ComplianceReport {
    Validator::new().validate_svg(text)
}
