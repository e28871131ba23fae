//! Conversion options - one explicit record per conversion.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_PADDING_PERCENT: f64 = 12.5;
pub const MIN_PADDING_PERCENT: f64 = 5.0;
pub const MAX_PADDING_PERCENT: f64 = 25.0;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Padding {0}% is outside the allowed range 5-25%")]
    PaddingOutOfRange(f64),

    #[error("Background color must not be empty")]
    EmptyBackgroundColor,

    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundShape {
    #[default]
    Circle,
    RoundedSquare,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default)]
    pub shape: BackgroundShape,
    #[serde(default = "default_padding_percent")]
    pub padding_percent: f64,
    #[serde(default)]
    pub title: String,
}

fn default_background_color() -> String { DEFAULT_BACKGROUND_COLOR.to_string() }
fn default_padding_percent() -> f64 { DEFAULT_PADDING_PERCENT }

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            shape: BackgroundShape::default(),
            padding_percent: DEFAULT_PADDING_PERCENT,
            title: String::new(),
        }
    }
}

impl ConvertOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, OptionsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(MIN_PADDING_PERCENT..=MAX_PADDING_PERCENT).contains(&self.padding_percent) {
            return Err(OptionsError::PaddingOutOfRange(self.padding_percent));
        }
        if self.background_color.trim().is_empty() {
            return Err(OptionsError::EmptyBackgroundColor);
        }
        Ok(())
    }

    /// Padding forced into the allowed range. NaN falls back to the default.
    pub fn clamped_padding(&self) -> f64 {
        if self.padding_percent.is_nan() {
            return DEFAULT_PADDING_PERCENT;
        }
        self.padding_percent.clamp(MIN_PADDING_PERCENT, MAX_PADDING_PERCENT)
    }

    pub fn title(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let opts: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ConvertOptions::default());
        assert_eq!(opts.background_color, "#FFFFFF");
        assert_eq!(opts.shape, BackgroundShape::Circle);
        assert_eq!(opts.padding_percent, 12.5);
        assert_eq!(opts.title(), None);
    }

    #[test]
    fn test_camel_case_fields() {
        let opts: ConvertOptions = serde_json::from_str(
            r##"{"backgroundColor": "#112233", "shape": "rounded-square", "paddingPercent": 20, "title": " Acme "}"##,
        )
        .unwrap();
        assert_eq!(opts.shape, BackgroundShape::RoundedSquare);
        assert_eq!(opts.padding_percent, 20.0);
        assert_eq!(opts.title(), Some("Acme"));
    }

    #[test]
    fn test_padding_range() {
        let mut opts = ConvertOptions::default();
        opts.padding_percent = 4.9;
        assert!(matches!(opts.validate(), Err(OptionsError::PaddingOutOfRange(_))));
        assert_eq!(opts.clamped_padding(), 5.0);
        opts.padding_percent = 25.0;
        assert!(opts.validate().is_ok());
        opts.padding_percent = f64::NAN;
        assert!(opts.validate().is_err());
        assert_eq!(opts.clamped_padding(), DEFAULT_PADDING_PERCENT);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"shape": "rounded-square"}"#).unwrap();
        let opts = ConvertOptions::from_json_file(&path).unwrap();
        assert_eq!(opts.shape, BackgroundShape::RoundedSquare);
        assert_eq!(opts.padding_percent, DEFAULT_PADDING_PERCENT);
    }
}
