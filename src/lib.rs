//! # digit_ocr
//!
//! Handwritten digit recognition on top of ONNX Runtime.
//!
//! A drawing arrives as a grayscale image, is split into per-digit segments
//! by vertical gaps, and every segment is normalized into the 28x28 glyph a
//! MNIST-style classifier expects. The crate is organised in layers:
//!
//! - [`core`]: configuration, errors, constants and the ONNX session wrapper
//! - [`processors`]: glyph normalization and digit segmentation
//! - [`models`]: the ONNX-backed digit classifier
//! - [`domain`]: the recognizer that decides between one digit and a sequence
//! - [`utils`]: image decoding, score helpers and logging setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use digit_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = OnnxDigitClassifierBuilder::new().build("models/mnist_cnn.onnx")?;
//! let recognizer = DigitRecognizer::new(Box::new(classifier), PreprocessConfig::default())?;
//!
//! let image = digit_ocr::utils::load_grayscale("drawing.png")?;
//! match recognizer.recognize(&image, false)? {
//!     Recognition::Single(single) => println!("digit {}", single.classification.label),
//!     Recognition::Sequence(sequence) => println!("digits {}", sequence.text),
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod processors;
pub mod utils;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::core::config::{OrtSessionConfig, PreprocessConfig};
    pub use crate::core::{DigitClassifier, DigitError, DigitResult};
    pub use crate::domain::{
        Classification, DigitPrediction, DigitRecognizer, DigitSequence, Recognition,
    };
    pub use crate::models::classification::{
        InputLayout, OnnxDigitClassifier, OnnxDigitClassifierBuilder, OutputKind,
    };
    pub use crate::processors::{DigitSegmenter, Glyph, GlyphNormalizer, GrayscaleImage};
}
