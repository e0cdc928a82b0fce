//! Recognition logic shared between CLI and server modes.

use crate::config::EngineConfig;
use digit_ocr::core::config::OrtSessionConfig;
use digit_ocr::core::{DigitError, DigitResult};
use digit_ocr::domain::{DigitRecognizer, Recognition};
use digit_ocr::models::OnnxDigitClassifierBuilder;
use digit_ocr::processors::GrayscaleImage;
use digit_ocr::utils::{decode_grayscale, load_grayscale_from_data_url};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Failed to download image: {0}")]
    Download(String),

    #[error(transparent)]
    Digit(#[from] DigitError),
}

/// Label and confidence of one digit in a sequence.
#[derive(Debug, Serialize)]
pub struct DigitResponse {
    pub prediction: usize,
    pub confidence: f32,
}

/// Body returned by a successful prediction.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    #[serde(rename_all = "camelCase")]
    Single {
        prediction: usize,
        confidence: f32,
        success: bool,
        probs: Vec<f32>,
        processing_time_ms: f64,
    },
    #[serde(rename_all = "camelCase")]
    Sequence {
        sequence: String,
        per_digit: Vec<DigitResponse>,
        num_digits: usize,
        processing_time_ms: f64,
    },
    /// A sequence was requested but nothing was drawn.
    #[serde(rename_all = "camelCase")]
    Empty {
        prediction: Option<usize>,
        confidence: f32,
        sequence: String,
        per_digit: Vec<DigitResponse>,
    },
}

impl PredictResponse {
    pub fn from_recognition(recognition: Recognition, processing_time_ms: f64) -> Self {
        match recognition {
            Recognition::Single(single) => Self::Single {
                prediction: single.classification.label,
                confidence: single.classification.confidence,
                success: true,
                probs: single.probabilities,
                processing_time_ms,
            },
            Recognition::Sequence(sequence) if sequence.is_empty() => Self::Empty {
                prediction: None,
                confidence: 0.0,
                sequence: String::new(),
                per_digit: Vec::new(),
            },
            Recognition::Sequence(sequence) => Self::Sequence {
                num_digits: sequence.len(),
                per_digit: sequence
                    .digits
                    .iter()
                    .map(|digit| DigitResponse {
                        prediction: digit.classification.label,
                        confidence: digit.classification.confidence,
                    })
                    .collect(),
                sequence: sequence.text,
                processing_time_ms,
            },
        }
    }
}

/// Body returned by a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            received_json: None,
            files: None,
        }
    }

    pub fn missing_image(received_json: bool, files: Vec<String>) -> Self {
        Self {
            error: "Missing 'image' field".to_string(),
            received_json: Some(received_json),
            files: Some(files),
        }
    }
}

/// Recognition engine wrapper for thread-safe access
#[derive(Debug)]
pub struct PredictEngine {
    recognizer: DigitRecognizer,
}

impl PredictEngine {
    /// Loads the model and builds the recognizer.
    pub fn new(config: &EngineConfig) -> DigitResult<Self> {
        let mut builder = OnnxDigitClassifierBuilder::new()
            .input_layout(config.input_layout)
            .output_kind(config.output_kind);
        if let Some(ort_config) = OrtSessionConfig::for_device(&config.device)? {
            builder = builder.with_ort_config(ort_config);
        }
        let classifier = builder.build(&config.model)?;
        let recognizer = DigitRecognizer::new(Box::new(classifier), config.preprocess)?;
        Ok(Self { recognizer })
    }

    pub fn from_recognizer(recognizer: DigitRecognizer) -> Self {
        Self { recognizer }
    }

    pub fn model_name(&self) -> &str {
        self.recognizer.classifier_name()
    }

    pub fn recognize(&self, image: &GrayscaleImage, multi: bool) -> DigitResult<Recognition> {
        self.recognizer.recognize(image, multi)
    }

    /// Decodes encoded image bytes and recognizes them.
    pub fn recognize_bytes(&self, bytes: &[u8], multi: bool) -> DigitResult<Recognition> {
        let image = decode_grayscale(bytes)?;
        self.recognize(&image, multi)
    }

    /// Decodes a data URL and recognizes it.
    pub fn recognize_data_url(&self, data_url: &str, multi: bool) -> DigitResult<Recognition> {
        let image = load_grayscale_from_data_url(data_url)?;
        self.recognize(&image, multi)
    }
}

/// Download bytes from a URL
pub async fn download_bytes(url: &str) -> Result<Vec<u8>, PredictError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| PredictError::Download(format!("Failed to fetch URL: {}", e)))?;

    if !response.status().is_success() {
        return Err(PredictError::Download(format!(
            "HTTP error: {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PredictError::Download(format!("Failed to read response body: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Thread-safe recognition engine wrapped in Arc
pub type SharedEngine = Arc<PredictEngine>;
