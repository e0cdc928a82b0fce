//! MNIST-style CNN classifier backed by ONNX Runtime.
//!
//! The model takes a batch of 28x28 single-channel glyphs and returns ten
//! scores per glyph. Keras exports expect channels-last input
//! (`[N, 28, 28, 1]`); PyTorch exports expect channels-first
//! (`[N, 1, 28, 28]`). Some exports end in a softmax layer, others return raw
//! logits.

use crate::core::config::OrtSessionConfig;
use crate::core::constants::{GLYPH_SIZE, NUM_CLASSES};
use crate::core::inference::OrtInfer;
use crate::core::{DigitClassifier, DigitError, DigitResult};
use crate::processors::Glyph;
use crate::utils::topk::{softmax_rows, validate_probabilities};
use ndarray::{Array2, Array4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Memory layout of the model's input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// `[N, 28, 28, 1]`
    #[default]
    Nhwc,
    /// `[N, 1, 28, 28]`
    Nchw,
}

impl InputLayout {
    /// Tensor shape for a batch of `batch` glyphs.
    pub fn shape(self, batch: usize) -> [usize; 4] {
        match self {
            Self::Nhwc => [batch, GLYPH_SIZE, GLYPH_SIZE, 1],
            Self::Nchw => [batch, 1, GLYPH_SIZE, GLYPH_SIZE],
        }
    }
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nhwc => write!(f, "nhwc"),
            Self::Nchw => write!(f, "nchw"),
        }
    }
}

impl FromStr for InputLayout {
    type Err = DigitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nhwc" => Ok(Self::Nhwc),
            "nchw" => Ok(Self::Nchw),
            other => Err(DigitError::invalid_field("input_layout", "nhwc or nchw", other)),
        }
    }
}

/// What the model's output row holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Rows are already probabilities.
    #[default]
    Probabilities,
    /// Rows are logits; softmax is applied before use.
    Logits,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probabilities => write!(f, "probabilities"),
            Self::Logits => write!(f, "logits"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = DigitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "probabilities" | "probs" | "softmax" => Ok(Self::Probabilities),
            "logits" => Ok(Self::Logits),
            other => Err(DigitError::invalid_field(
                "output_kind",
                "probabilities or logits",
                other,
            )),
        }
    }
}

/// Stacks glyphs into a model input tensor with the given layout.
pub fn glyph_batch_tensor(glyphs: &[Glyph], layout: InputLayout) -> Array4<f32> {
    let shape = layout.shape(glyphs.len());
    Array4::from_shape_fn(shape, |(n, a, b, c)| {
        let (row, col) = match layout {
            InputLayout::Nhwc => (a, b),
            InputLayout::Nchw => (b, c),
        };
        glyphs[n].as_array()[[row, col]]
    })
}

/// Digit classifier running an ONNX model.
#[derive(Debug)]
pub struct OnnxDigitClassifier {
    inference: OrtInfer,
    input_layout: InputLayout,
    output_kind: OutputKind,
}

impl OnnxDigitClassifier {
    /// Wraps a loaded session.
    pub fn new(inference: OrtInfer, input_layout: InputLayout, output_kind: OutputKind) -> Self {
        Self {
            inference,
            input_layout,
            output_kind,
        }
    }

    pub fn input_layout(&self) -> InputLayout {
        self.input_layout
    }

    pub fn output_kind(&self) -> OutputKind {
        self.output_kind
    }

    /// Builds the input tensor for a batch of glyphs.
    pub fn preprocess(&self, glyphs: &[Glyph]) -> Array4<f32> {
        glyph_batch_tensor(glyphs, self.input_layout)
    }

    /// Runs the model on a prepared tensor and returns raw scores.
    pub fn infer(&self, batch_tensor: &Array4<f32>) -> DigitResult<Array2<f32>> {
        self.inference.infer_2d(batch_tensor)
    }

    /// Converts raw scores into validated probabilities.
    pub fn postprocess(&self, scores: Array2<f32>, batch: usize) -> DigitResult<Array2<f32>> {
        to_probabilities(self.inference.model_name(), scores, self.output_kind, batch)
    }

    /// Runs the complete forward pass: preprocess -> infer -> postprocess.
    pub fn forward(&self, glyphs: &[Glyph]) -> DigitResult<Array2<f32>> {
        if glyphs.is_empty() {
            return Ok(Array2::zeros((0, NUM_CLASSES)));
        }
        let tensor = self.preprocess(glyphs);
        let scores = self.infer(&tensor)?;
        let probs = self.postprocess(scores, glyphs.len())?;
        debug!(
            model = self.inference.model_name(),
            batch = glyphs.len(),
            "classified glyph batch"
        );
        Ok(probs)
    }
}

impl DigitClassifier for OnnxDigitClassifier {
    fn name(&self) -> &str {
        self.inference.model_name()
    }

    fn classify(&self, glyphs: &[Glyph]) -> DigitResult<Array2<f32>> {
        self.forward(glyphs)
    }
}

fn to_probabilities(
    model_name: &str,
    mut scores: Array2<f32>,
    kind: OutputKind,
    batch: usize,
) -> DigitResult<Array2<f32>> {
    if kind == OutputKind::Logits {
        softmax_rows(&mut scores);
    }
    validate_probabilities(model_name, &scores, batch, NUM_CLASSES)?;
    Ok(scores)
}

/// Builder for [`OnnxDigitClassifier`].
#[derive(Debug, Default)]
pub struct OnnxDigitClassifierBuilder {
    input_layout: InputLayout,
    output_kind: OutputKind,
    ort_config: Option<OrtSessionConfig>,
}

impl OnnxDigitClassifierBuilder {
    /// Creates a builder for a channels-last model that outputs probabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input tensor layout.
    pub fn input_layout(mut self, layout: InputLayout) -> Self {
        self.input_layout = layout;
        self
    }

    /// Sets what the model's output holds.
    pub fn output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Loads the model and builds the classifier.
    pub fn build(self, model_path: impl AsRef<Path>) -> DigitResult<OnnxDigitClassifier> {
        let inference = OrtInfer::from_file(model_path, self.ort_config.as_ref())?;
        Ok(OnnxDigitClassifier::new(
            inference,
            self.input_layout,
            self.output_kind,
        ))
    }
}
