//! Digit classification models.

mod digit_cnn;

pub use digit_cnn::{
    InputLayout, OnnxDigitClassifier, OnnxDigitClassifierBuilder, OutputKind, glyph_batch_tensor,
};
