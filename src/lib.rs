//! BIMI Forge Core - BIMI Logo Compiler
//!
//! Turns a raster or vector logo into a square, BIMI-ready SVG.
//!
//! # The Rules
//! 1. Every conversion yields a drawable SVG
//! 2. The canvas is always 100x100 with a solid background
//! 3. Artwork sits inside the safe margin
//! 4. Validation always runs, and never raises
//! 5. Identical inputs produce identical output

pub mod error;
pub mod raster;
pub mod simplify;
pub mod trace;
pub mod document;
pub mod bounds;
pub mod background;
pub mod options;
pub mod svg;
pub mod normalize;
pub mod validation;
pub mod hashing;
pub mod pipeline;

pub use error::InputError;
pub use raster::PixelBuffer;
pub use trace::{Contour, TraceSettings};
pub use document::{Geometry, Paint, VectorDocument, VectorElement, ViewBox};
pub use options::{BackgroundShape, ConvertOptions, OptionsError};
pub use normalize::normalize;
pub use validation::{ComplianceCheck, ComplianceReport, ComplianceRule, ViolationSeverity};
pub use hashing::{canonical_json, compute_job_hash, sha256_hex};
pub use pipeline::{
    ConversionPipeline, ConvertRequest, ConvertedLogo, PipelineConfig, PipelineError, SourceKind,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
