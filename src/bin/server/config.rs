//! Configuration types for the digit server and CLI.

use clap::Args;
use digit_ocr::core::config::{ConfigValidator, PreprocessConfig};
use digit_ocr::core::constants::{DEFAULT_FOREGROUND_THRESHOLD, DEFAULT_MIN_SEGMENT_WIDTH};
use digit_ocr::core::DigitResult;
use digit_ocr::models::{InputLayout, OutputKind};
use std::path::PathBuf;

/// Options shared by every subcommand that loads the model.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Path to the ONNX digit classifier
    #[arg(long, env = "DIGIT_MODEL", default_value = "models/mnist_cnn.onnx")]
    pub model: PathBuf,

    /// Device to use (cpu, cuda, cuda:0, etc.)
    #[arg(long, default_value = "cpu", env = "DIGIT_DEVICE")]
    pub device: String,

    /// Input tensor layout of the model (nhwc, nchw)
    #[arg(long = "input-layout", default_value = "nhwc", env = "DIGIT_INPUT_LAYOUT")]
    pub input_layout: InputLayout,

    /// What the model outputs (probabilities, logits)
    #[arg(long = "output-kind", default_value = "probabilities", env = "DIGIT_OUTPUT_KIND")]
    pub output_kind: OutputKind,

    /// Intensity above which a pixel counts as ink
    #[arg(long, default_value_t = DEFAULT_FOREGROUND_THRESHOLD, env = "DIGIT_THRESHOLD")]
    pub threshold: f32,

    /// Narrowest column run kept as a digit
    #[arg(
        long = "min-segment-width",
        default_value_t = DEFAULT_MIN_SEGMENT_WIDTH,
        env = "DIGIT_MIN_SEGMENT_WIDTH"
    )]
    pub min_segment_width: usize,
}

/// Configuration for building the recognition engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model: PathBuf,
    pub device: String,
    pub input_layout: InputLayout,
    pub output_kind: OutputKind,
    pub preprocess: PreprocessConfig,
}

impl EngineConfig {
    pub fn from_args(args: EngineArgs) -> DigitResult<Self> {
        let preprocess = PreprocessConfig::new()
            .with_foreground_threshold(args.threshold)
            .with_min_segment_width(args.min_segment_width);
        preprocess.validate()?;

        Ok(Self {
            model: args.model,
            device: args.device,
            input_layout: args.input_layout,
            output_kind: args.output_kind,
            preprocess,
        })
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub engine: EngineConfig,
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
}
