//! CLI mode for digit recognition.

use crate::config::EngineConfig;
use crate::predict::{PredictEngine, PredictError, PredictResponse, download_bytes};
use digit_ocr::domain::Recognition;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Process an image fetched from a URL
pub async fn process_url(
    url: &str,
    config: &EngineConfig,
    multi: bool,
    output_format: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();

    info!("Downloading image from URL...");
    let bytes = download_bytes(url).await?;
    let download_time = start.elapsed();
    info!(
        "Downloaded {} bytes in {:.2}ms",
        bytes.len(),
        download_time.as_secs_f64() * 1000.0
    );

    process_bytes(&bytes, config, multi, output_format)
}

/// Process a local image file
pub fn process_file(
    path: &Path,
    config: &EngineConfig,
    multi: bool,
    output_format: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();

    info!("Loading image from file...");
    let bytes = std::fs::read(path)?;
    info!("Loaded in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    process_bytes(&bytes, config, multi, output_format)
}

fn process_bytes(
    bytes: &[u8],
    config: &EngineConfig,
    multi: bool,
    output_format: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing recognition engine...");
    let init_start = Instant::now();
    let engine = PredictEngine::new(config).map_err(PredictError::from)?;
    info!(
        "Engine initialized in {:.2}ms",
        init_start.elapsed().as_secs_f64() * 1000.0
    );

    let predict_start = Instant::now();
    let recognition = engine
        .recognize_bytes(bytes, multi)
        .map_err(PredictError::from)?;
    let processing_time_ms = predict_start.elapsed().as_secs_f64() * 1000.0;
    info!("Recognition completed in {:.2}ms", processing_time_ms);

    output_result(recognition, output_format, processing_time_ms)
}

/// Output the recognition result in the specified format
fn output_result(
    recognition: Recognition,
    format: &str,
    processing_time_ms: f64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        "json" => {
            let response = PredictResponse::from_recognition(recognition, processing_time_ms);
            println!("{}", serde_json::to_string(&response)?);
        }
        "text" => match &recognition {
            Recognition::Single(single) => println!("{}", single.classification.label),
            Recognition::Sequence(sequence) => println!("{}", sequence.text),
        },
        _ => {
            println!("\n=== Digit Recognition ===");
            println!("Processing time: {:.2}ms", processing_time_ms);
            println!();

            match &recognition {
                Recognition::Single(single) => {
                    println!(
                        "Prediction: {} ({:.1}%)",
                        single.classification.label,
                        single.classification.confidence * 100.0
                    );
                    println!();
                    println!("--- Probabilities ---");
                    for (digit, prob) in single.probabilities.iter().enumerate() {
                        println!("  {}: {:.4}", digit, prob);
                    }
                }
                Recognition::Sequence(sequence) if sequence.is_empty() => {
                    println!("No digits detected.");
                }
                Recognition::Sequence(sequence) => {
                    println!("Sequence: {} ({} digits)", sequence.text, sequence.len());
                    println!();
                    println!("--- Per Digit ---");
                    for (idx, digit) in sequence.digits.iter().enumerate() {
                        println!(
                            "[{}] {} ({:.1}%)  columns {}-{}",
                            idx + 1,
                            digit.classification.label,
                            digit.classification.confidence * 100.0,
                            digit.segment.start,
                            digit.segment.end
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
