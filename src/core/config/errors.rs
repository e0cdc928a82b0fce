//! Configuration errors and validation traits.

use thiserror::Error;

/// Errors raised while validating a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A numeric field is outside its allowed range.
    #[error("'{field}' must be in {expected}, got {actual}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },
    /// Any other invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Implemented by configuration structs that can check their own fields.
pub trait ConfigValidator {
    /// Validates the configuration, returning the first problem found.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Extension helpers for [`ConfigValidator`] implementors.
pub trait ConfigValidatorExt: ConfigValidator + Sized {
    /// Validates and returns `self` so construction can be chained.
    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

impl<T: ConfigValidator> ConfigValidatorExt for T {}
