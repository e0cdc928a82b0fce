//! ONNX Runtime integration.
//!
//! [`OrtInfer`] owns one session and runs a 4D float batch through it,
//! returning the first output as a `[batch, classes]` matrix.

mod ort_infer_config;

use crate::core::config::OrtSessionConfig;
use crate::core::{DigitError, DigitResult, ProcessingStage};
use ndarray::{Array2, Array4};
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A loaded ONNX model.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex
/// and concurrent callers take turns.
#[derive(Debug)]
pub struct OrtInfer {
    session: Mutex<Session>,
    model_name: String,
}

impl OrtInfer {
    /// Loads a model from disk, applying the session configuration if given.
    pub fn from_file(
        model_path: impl AsRef<Path>,
        ort_config: Option<&OrtSessionConfig>,
    ) -> DigitResult<Self> {
        let model_path = model_path.as_ref();
        let session = load_session(model_path, ort_config)?;
        let model_name = model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %model_name, path = %model_path.display(), "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
            model_name,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Runs a batch through the model and returns its first output as a 2D
    /// matrix of shape `[batch, outputs]`.
    pub fn infer_2d(&self, input: &Array4<f32>) -> DigitResult<Array2<f32>> {
        let batch = input.shape()[0];
        let tensor = TensorRef::from_array_view(input).map_err(|e| {
            DigitError::inference(&self.model_name, format!("failed to wrap input: {e}"))
        })?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DigitError::inference(&self.model_name, "session lock poisoned"))?;

        let outputs = session.run(ort::inputs![tensor]).map_err(|e| {
            DigitError::inference(
                &self.model_name,
                format!("forward pass failed for input shape {:?}: {e}", input.shape()),
            )
        })?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            DigitError::inference(&self.model_name, format!("output extraction: {e}"))
        })?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        debug!(model = %self.model_name, ?dims, "inference finished");

        // Accept [N, C] and the [N, 1, C] / [N, C, 1] variants some exporters emit.
        let classes = match dims.as_slice() {
            [n, c] if *n == batch => *c,
            [n, 1, c] | [n, c, 1] if *n == batch => *c,
            _ => {
                return Err(DigitError::inference(
                    &self.model_name,
                    format!("unexpected output shape {dims:?} for batch of {batch}"),
                ));
            }
        };

        reshape_output(batch, classes, data.to_vec())
    }
}

/// Packs flat model output into a `[batch, classes]` matrix.
fn reshape_output(batch: usize, classes: usize, data: Vec<f32>) -> DigitResult<Array2<f32>> {
    let len = data.len();
    Array2::from_shape_vec((batch, classes), data).map_err(|e| {
        DigitError::processing(
            ProcessingStage::TensorOperation,
            format!("reshape {len} output values into [{batch}, {classes}]"),
            e,
        )
    })
}

/// Builds an ONNX Runtime session for the model at `model_path`.
pub fn load_session(
    model_path: &Path,
    ort_config: Option<&OrtSessionConfig>,
) -> DigitResult<Session> {
    if !model_path.exists() {
        return Err(DigitError::model_load(
            model_path.display().to_string(),
            "file not found",
            Some("export the trained classifier to ONNX and pass its path with --model"),
            None,
        ));
    }

    let mut builder = Session::builder()?;
    if let Some(cfg) = ort_config {
        builder = OrtInfer::apply_ort_config(builder, cfg)?;
    }

    builder.commit_from_file(model_path).map_err(|e| {
        DigitError::model_load(
            model_path.display().to_string(),
            e.to_string(),
            Some("check that the file is a valid ONNX model"),
            None,
        )
    })
}
