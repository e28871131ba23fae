//! Conversion Pipeline - Single Entry Point
//!
//! CRITICAL: every conversion MUST validate its own output. No bypass.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::document::VectorDocument;
use crate::error::InputError;
use crate::hashing::{compute_job_hash, sha256_hex};
use crate::normalize::normalize;
use crate::options::{ConvertOptions, OptionsError};
use crate::raster::PixelBuffer;
use crate::svg;
use crate::trace::{self, TraceSettings};
use crate::validation::{ComplianceReport, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("Invalid base64 source data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Raster,
    Vector,
}

impl SourceKind {
    /// Classify an upload by media type, falling back to the file extension.
    pub fn detect(filename: &str, media_type: Option<&str>) -> Result<Self, InputError> {
        let media = media_type
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty());
        match media.as_deref() {
            Some("image/svg+xml") => return Ok(SourceKind::Vector),
            Some(m) if m.starts_with("image/") => return Ok(SourceKind::Raster),
            _ => {}
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("svg") => Ok(SourceKind::Vector),
            Some("png" | "jpg" | "jpeg") => Ok(SourceKind::Raster),
            _ => Err(InputError::UnsupportedFileType(
                media.unwrap_or_else(|| filename.to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default)]
    pub trace: TraceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub filename: String,
    #[serde(default)]
    pub media_type: Option<String>,
    pub source_data: String,  // Base64 encoded source
    #[serde(default)]
    pub options: ConvertOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedLogo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub source_kind: SourceKind,
    pub svg: String,
    pub svg_hash: String,
    pub job_hash: String,
    pub report: ComplianceReport,
}

/// The conversion pipeline - single entry point for all logo operations
pub struct ConversionPipeline {
    config: PipelineConfig,
    validator: Validator,
}

impl ConversionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            validator: Validator::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate SVG text
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_svg_text(&self, text: &str) -> ComplianceReport {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate_svg(text)
    }

    /// Convert an uploaded file, raster or vector.
    pub fn convert_bytes(
        &self,
        filename: &str,
        media_type: Option<&str>,
        bytes: &[u8],
        options: &ConvertOptions,
    ) -> Result<ConvertedLogo, PipelineError> {
        options.validate()?;
        let kind = SourceKind::detect(filename, media_type)?;
        tracing::info!("Converting {} ({:?}, {} bytes)", filename, kind, bytes.len());

        let doc = match kind {
            SourceKind::Raster => self.vectorize(&PixelBuffer::decode(bytes)?),
            SourceKind::Vector => {
                let text = std::str::from_utf8(bytes).map_err(InputError::from)?;
                svg::parse(text)?.document
            }
        };
        self.finish(kind, bytes, &doc, options)
    }

    pub fn convert_svg(&self, text: &str, options: &ConvertOptions) -> Result<ConvertedLogo, PipelineError> {
        options.validate()?;
        tracing::info!("Converting SVG text ({} bytes)", text.len());
        let parsed = svg::parse(text)?;
        self.finish(SourceKind::Vector, text.as_bytes(), &parsed.document, options)
    }

    pub fn convert_pixels(
        &self,
        buffer: &PixelBuffer,
        options: &ConvertOptions,
    ) -> Result<ConvertedLogo, PipelineError> {
        options.validate()?;
        tracing::info!("Converting {}x{} pixel buffer", buffer.width(), buffer.height());

        let mut source = Vec::with_capacity(buffer.as_bytes().len() + 8);
        source.extend_from_slice(&buffer.width().to_be_bytes());
        source.extend_from_slice(&buffer.height().to_be_bytes());
        source.extend_from_slice(buffer.as_bytes());
        self.finish(SourceKind::Raster, &source, &self.vectorize(buffer), options)
    }

    /// Convert a JSON request carrying base64 source data.
    pub fn convert_request(&self, request: &ConvertRequest) -> Result<ConvertedLogo, PipelineError> {
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            request.source_data.trim(),
        )?;
        self.convert_bytes(
            &request.filename,
            request.media_type.as_deref(),
            &bytes,
            &request.options,
        )
    }

    fn vectorize(&self, buffer: &PixelBuffer) -> VectorDocument {
        let settings = &self.config.trace;
        let outlines = trace::trace_outlines(buffer, settings);
        let fallback = trace::opaque_bounds(buffer, settings.alpha_threshold)
            .unwrap_or((0, 0, buffer.width(), buffer.height()));
        tracing::debug!("Traced {} outline(s)", outlines.len());
        VectorDocument::from_outlines(buffer.width(), buffer.height(), outlines, fallback)
    }

    /// Normalize, serialize and validate.
    ///
    /// CRITICAL: This ALWAYS calls validate_svg_text on the final text.
    fn finish(
        &self,
        kind: SourceKind,
        source: &[u8],
        doc: &VectorDocument,
        options: &ConvertOptions,
    ) -> Result<ConvertedLogo, PipelineError> {
        let normalized = normalize(doc, options);
        let svg = svg::write(&normalized);

        // MANDATORY: the serialized output is what gets validated.
        let report = self.validate_svg_text(&svg);
        if !report.valid {
            tracing::warn!("Converted logo is not BIMI compliant: {}", report.errors.join("; "));
        }

        let job_hash = compute_job_hash(source, options, &self.config.trace, ENGINE_VERSION)?;
        let logo = ConvertedLogo {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            source_kind: kind,
            svg_hash: sha256_hex(svg.as_bytes()),
            svg,
            job_hash,
            report,
        };
        tracing::info!(
            "Converted logo {}: valid={}, {} warning(s)",
            logo.id,
            logo.report.valid,
            logo.report.warnings.len()
        );
        Ok(logo)
    }
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
