//! Configuration management for the recognition pipeline.
//!
//! This module provides configuration types, validation traits, and utilities
//! for the preprocessing heuristics and the ONNX Runtime session.

pub mod errors;
pub mod onnx;
pub mod preprocess;

pub use errors::{ConfigError, ConfigValidator, ConfigValidatorExt};
pub use onnx::*;
pub use preprocess::PreprocessConfig;
