//! Digit recognition server and CLI
//!
//! A cross-platform binary that recognizes handwritten digits via CLI or
//! HTTP server.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! digit-ocr-server predict --file drawing.png --model models/mnist_cnn.onnx
//! digit-ocr-server predict --url "https://example.com/digits.png" --multi --output json
//! ```
//!
//! ## Server Mode
//! ```bash
//! digit-ocr-server serve --model models/mnist_cnn.onnx --port 5000
//! ```

mod cli;
mod config;
mod predict;
mod server;

use clap::{Parser, Subcommand};
use config::{EngineArgs, EngineConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "digit-ocr-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Handwritten digit recognition via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize a single image via CLI
    Predict {
        /// URL of the image to process
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,

        /// Local file path of the image to process
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Read the drawing as a sequence of digits
        #[arg(long)]
        multi: bool,

        /// Output format (json, text, pretty)
        #[arg(long, default_value = "pretty")]
        output: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "5000", env = "DIGIT_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "DIGIT_HOST")]
        host: String,

        /// Largest accepted request body, in bytes
        #[arg(long = "body-limit", default_value = "10485760", env = "DIGIT_BODY_LIMIT")]
        body_limit: usize,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    digit_ocr::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            url,
            file,
            multi,
            output,
            engine,
        } => {
            let config = EngineConfig::from_args(engine)?;

            if let Some(url) = url {
                info!("Processing URL: {}", url);
                cli::process_url(&url, &config, multi, &output).await?;
            } else if let Some(file) = file {
                info!("Processing file: {}", file.display());
                cli::process_file(&file, &config, multi, &output)?;
            } else {
                eprintln!("Error: Either --url or --file must be provided");
                std::process::exit(1);
            }
        }
        Commands::Serve {
            port,
            host,
            body_limit,
            engine,
        } => {
            let config = config::ServerConfig {
                engine: EngineConfig::from_args(engine)?,
                host,
                port,
                body_limit,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
