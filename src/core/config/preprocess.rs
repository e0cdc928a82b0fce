//! Heuristics used to turn a drawn canvas into glyphs.

use super::errors::{ConfigError, ConfigValidator};
use crate::core::constants::{DEFAULT_FOREGROUND_THRESHOLD, DEFAULT_MIN_SEGMENT_WIDTH};
use serde::{Deserialize, Serialize};

/// Parameters shared by the glyph normalizer and the digit segmenter.
///
/// Both values were tuned by hand against canvas drawings; they are kept
/// configurable so deployments with different brushes can adjust them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Pixels with intensity strictly above this value count as ink.
    #[serde(default = "PreprocessConfig::default_foreground_threshold")]
    pub foreground_threshold: f32,
    /// Column runs narrower than this are dropped as noise.
    #[serde(default = "PreprocessConfig::default_min_segment_width")]
    pub min_segment_width: usize,
}

impl PreprocessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foreground_threshold(mut self, threshold: f32) -> Self {
        self.foreground_threshold = threshold;
        self
    }

    pub fn with_min_segment_width(mut self, width: usize) -> Self {
        self.min_segment_width = width;
        self
    }

    fn default_foreground_threshold() -> f32 {
        DEFAULT_FOREGROUND_THRESHOLD
    }

    fn default_min_segment_width() -> usize {
        DEFAULT_MIN_SEGMENT_WIDTH
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            foreground_threshold: Self::default_foreground_threshold(),
            min_segment_width: Self::default_min_segment_width(),
        }
    }
}

impl ConfigValidator for PreprocessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        // A threshold of 1.0 or more can never be exceeded.
        if !(0.0..1.0).contains(&self.foreground_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "foreground_threshold",
                expected: "[0, 1)",
                actual: self.foreground_threshold.to_string(),
            });
        }
        if self.min_segment_width == 0 {
            return Err(ConfigError::OutOfRange {
                field: "min_segment_width",
                expected: "[1, inf)",
                actual: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigValidatorExt;

    #[test]
    fn test_defaults() {
        let config = PreprocessConfig::default();
        assert_eq!(config.foreground_threshold, 0.08);
        assert_eq!(config.min_segment_width, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(
            PreprocessConfig::new()
                .with_foreground_threshold(1.0)
                .validated()
                .is_err()
        );
        assert!(
            PreprocessConfig::new()
                .with_foreground_threshold(f32::NAN)
                .validated()
                .is_err()
        );
        assert!(
            PreprocessConfig::new()
                .with_min_segment_width(0)
                .validated()
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: PreprocessConfig =
            serde_json::from_str(r#"{"min_segment_width": 6}"#).unwrap();
        assert_eq!(config.min_segment_width, 6);
        assert_eq!(config.foreground_threshold, 0.08);
    }
}
