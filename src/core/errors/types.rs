//! Core error types for the digit recognition pipeline.
//!
//! This module defines the [`DigitError`] enum used throughout the crate and the
//! [`ProcessingStage`] tag that records where a processing failure happened.

use thiserror::Error;

/// Enum representing different stages of the recognition pipeline.
///
/// Used to identify which stage an error occurred in, providing context for
/// debugging and error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Decoding the submitted image into a grayscale array.
    Decode,
    /// Reshaping model output into a probability matrix.
    TensorOperation,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Decode => write!(f, "decode"),
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
        }
    }
}

/// Enum representing the errors that can occur while recognizing digits.
#[derive(Error, Debug)]
pub enum DigitError {
    /// A required input field was not supplied.
    #[error("missing input: {field}")]
    MissingInput {
        /// Name of the missing field.
        field: String,
    },

    /// The image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageLoad(#[source] image::ImageError),

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during inference.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a model file, with context and suggestions.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the model that failed to load
        model_path: String,
        /// Short reason string
        reason: String,
        /// Optional suggestion (prefixed with '; ' when present)
        suggestion: String,
        /// Underlying source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<image::ImageError> for DigitError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for DigitError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl DigitError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a missing input error for the named field.
    pub fn missing_input(field: impl Into<String>) -> Self {
        Self::MissingInput {
            field: field.into(),
        }
    }

    /// Wraps an error that occurred in a given processing stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an inference error without an underlying source.
    pub fn inference(model_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates a model load error with a recovery suggestion.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use digit_ocr::core::DigitError;
    /// let err = DigitError::model_load(
    ///     "models/mnist.onnx",
    ///     "file not found",
    ///     Some("export the trained model to ONNX first"),
    ///     None,
    /// );
    /// assert!(err.to_string().contains("; export the trained model"));
    /// ```
    pub fn model_load(
        model_path: impl Into<String>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.into(),
            reason: reason.into(),
            suggestion: suggestion.map(|s| format!("; {s}")).unwrap_or_default(),
            source,
        }
    }

    /// Creates a configuration error for invalid field values.
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Returns true when the error was caused by what the caller submitted
    /// rather than by the service itself.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::InvalidInput { .. } | Self::ImageLoad(_)
        ) || matches!(
            self,
            Self::Processing {
                kind: ProcessingStage::Decode,
                ..
            }
        )
    }
}
