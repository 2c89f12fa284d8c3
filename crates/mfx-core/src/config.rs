//! Configuration types for the chain scheduler

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{MfxError, MfxResult};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples per DSP sub-block; smoothers are retargeted once per chunk
    pub chunk_size: usize,

    /// Ramp time of every parameter smoother, in seconds
    pub smoothing_ramp_seconds: f64,

    /// Pending orders held by each order channel before the oldest is dropped
    pub order_channel_capacity: usize,

    /// Post-chain samples buffered per channel for analysis (0 = disabled)
    pub analyzer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            smoothing_ramp_seconds: 0.05,
            order_channel_capacity: 8,
            analyzer_capacity: 8192,
        }
    }
}

impl EngineConfig {
    /// Set chunk size
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set smoothing ramp time
    pub fn with_ramp_seconds(mut self, seconds: f64) -> Self {
        self.smoothing_ramp_seconds = seconds;
        self
    }

    /// Set analyzer capacity (0 disables the tap)
    pub fn with_analyzer_capacity(mut self, samples: usize) -> Self {
        self.analyzer_capacity = samples;
        self
    }

    pub fn validate(&self) -> MfxResult<()> {
        if self.chunk_size == 0 {
            return Err(MfxError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if !self.smoothing_ramp_seconds.is_finite() || self.smoothing_ramp_seconds < 0.0 {
            return Err(MfxError::InvalidConfig(format!(
                "smoothing_ramp_seconds must be a non-negative number, got {}",
                self.smoothing_ramp_seconds
            )));
        }
        if self.order_channel_capacity == 0 {
            return Err(MfxError::InvalidConfig(
                "order_channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> MfxResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> MfxResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}
