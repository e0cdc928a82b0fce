//! Error types for the recognition pipeline.

mod types;

pub use types::{DigitError, ProcessingStage};

/// Convenience result alias used across the crate.
pub type DigitResult<T> = Result<T, DigitError>;
