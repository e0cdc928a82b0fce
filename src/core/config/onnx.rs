//! ONNX Runtime configuration types and utilities.

use super::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Execution providers for ONNX Runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available)
    #[default]
    CPU,
    /// NVIDIA CUDA execution provider
    CUDA {
        /// CUDA device ID (default: 0)
        device_id: Option<i32>,
        /// Memory limit in bytes (optional)
        gpu_mem_limit: Option<usize>,
    },
}

/// Configuration for ONNX Runtime sessions.
///
/// Every field is optional; unset fields leave the ONNX Runtime default in
/// place when the session is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes
    pub inter_threads: Option<usize>,
    /// Graph optimization level
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session config from a device string such as `cpu`, `cuda` or
    /// `cuda:1`.
    ///
    /// Returns `None` for `cpu`, meaning the ONNX Runtime defaults are used.
    pub fn for_device(device: &str) -> Result<Option<Self>, ConfigError> {
        let device_lower = device.trim().to_lowercase();

        if device_lower == "cpu" {
            return Ok(None);
        }

        if let Some(rest) = device_lower.strip_prefix("cuda") {
            let device_id = match rest {
                "" => 0,
                _ => rest
                    .strip_prefix(':')
                    .and_then(|id| id.parse::<i32>().ok())
                    .ok_or_else(|| {
                        ConfigError::Invalid(format!(
                            "invalid device format: {device}. Expected 'cuda' or 'cuda:N'"
                        ))
                    })?,
            };

            let config = Self::new().with_execution_providers(vec![
                OrtExecutionProvider::CUDA {
                    device_id: Some(device_id),
                    gpu_mem_limit: None,
                },
                OrtExecutionProvider::CPU,
            ]);
            return Ok(Some(config));
        }

        Err(ConfigError::Invalid(format!("unsupported device: {device}")))
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets the execution providers, in order of preference.
    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Gets the execution providers, defaulting to CPU only.
    pub fn get_execution_providers(&self) -> Vec<OrtExecutionProvider> {
        self.execution_providers
            .clone()
            .unwrap_or_else(|| vec![OrtExecutionProvider::CPU])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ort_session_config_builder() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_inter_threads(2)
            .with_optimization_level(OrtGraphOptimizationLevel::Level2);

        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(config.inter_threads, Some(2));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level2)
        );
        assert_eq!(
            config.get_execution_providers(),
            vec![OrtExecutionProvider::CPU]
        );
    }

    #[test]
    fn test_for_device() {
        assert_eq!(OrtSessionConfig::for_device("CPU").unwrap(), None);

        let cuda = OrtSessionConfig::for_device("cuda:1").unwrap().unwrap();
        assert_eq!(
            cuda.get_execution_providers()[0],
            OrtExecutionProvider::CUDA {
                device_id: Some(1),
                gpu_mem_limit: None
            }
        );

        let default_cuda = OrtSessionConfig::for_device("cuda").unwrap().unwrap();
        assert!(matches!(
            default_cuda.get_execution_providers()[0],
            OrtExecutionProvider::CUDA {
                device_id: Some(0),
                ..
            }
        ));

        assert!(OrtSessionConfig::for_device("cuda:x").is_err());
        assert!(OrtSessionConfig::for_device("tpu").is_err());
    }
}
