//! Model implementations.
//!
//! Models wrap an ONNX session together with the tensor layout it expects
//! and the post-processing its raw output needs. They are independent of the
//! recognition logic, which only sees them through
//! [`DigitClassifier`](crate::core::DigitClassifier).

pub mod classification;

pub use classification::{
    InputLayout, OnnxDigitClassifier, OnnxDigitClassifierBuilder, OutputKind,
};
