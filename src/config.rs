//! Engine configuration.
//!
//! All tunable parameters for one SMP engine instance. Values can be
//! loaded from a JSON file; missing fields fall back to the defaults.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::smp::codec::HEADER_SIZE;

/// Core engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmpConfig {
    // --- Buffers ---
    /// Capacity of each pool buffer in bytes, header included.
    pub netbuf_size: usize,
    /// Number of buffers in the pool.
    pub netbuf_count: usize,

    // --- Protocol ---
    /// Accept version 0 (legacy) requests and translate group errors
    /// into top-level return codes for them.
    pub legacy_protocol: bool,
    /// Attach an `rsn` string to error responses.
    pub verbose_err_response: bool,
}

impl Default for SmpConfig {
    fn default() -> Self {
        Self {
            netbuf_size: 384,
            netbuf_count: 4,

            legacy_protocol: true,
            verbose_err_response: false,
        }
    }
}

impl SmpConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.netbuf_size <= HEADER_SIZE {
            return Err(ConfigError::BufferTooSmall(self.netbuf_size));
        }
        if self.netbuf_count == 0 {
            return Err(ConfigError::NoBuffers);
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}
