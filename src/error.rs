//! Input errors - the only failures that stop a conversion.
//!
//! Structural problems with an otherwise readable logo are never raised;
//! they are reported by the compliance validator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid SVG: no <svg> root element found (found <{0}>)")]
    MissingRoot(String),

    #[error("Invalid SVG: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("SVG source is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Pixel buffer has zero dimension: {0}x{1}")]
    EmptyBuffer(u32, u32),

    #[error("Pixel buffer length {actual} does not match {width}x{height} RGBA ({expected} bytes)")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to decode raster image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported file type: {0}. Supported: PNG, JPG, SVG")]
    UnsupportedFileType(String),
}
