//! Utility functions for the digit pipeline.
//!
//! This module provides image decoding helpers, score utilities for
//! classifier output, and logging setup.

pub mod image;
pub mod topk;

pub use self::image::{
    decode_data_url, decode_grayscale, load_grayscale, load_grayscale_from_data_url,
};
pub use topk::{argmax, softmax_rows, validate_probabilities};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that honours `RUST_LOG`, defaulting to
/// `info`. Calling it more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
