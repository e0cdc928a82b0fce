//! The core module of the digit pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - ONNX Runtime integration
//! - Traits defining the classifier interface

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{ConfigError, ConfigValidator, ConfigValidatorExt, PreprocessConfig};
pub use constants::*;
pub use errors::{DigitError, DigitResult, ProcessingStage};
pub use inference::{OrtInfer, load_session};
pub use traits::DigitClassifier;
