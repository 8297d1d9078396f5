use crate::error::{DesilenceError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunable pipeline parameters.
///
/// Defaults match the values that work well for typical lecture recordings.
/// A config file can override them; CLI flags override both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Minimum silence run length in milliseconds.
    pub min_silence_len: u64,

    /// Silence threshold as a dB offset relative to the chunk's own
    /// average loudness (negative: quieter than average).
    pub silence_thresh: f64,

    /// Margin in milliseconds added to both ends of each non-silent interval.
    pub margin: u64,

    /// Number of chunks the input is split into.
    pub n_parts: usize,

    /// Number of chunks processed concurrently per phase.
    pub pool_size: usize,

    /// Base name used for intermediate chunk files.
    pub prefix: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_silence_len: 300,
            silence_thresh: -16.0,
            margin: 100,
            n_parts: 10,
            pool_size: 1,
            prefix: "lecture".to_string(),
        }
    }
}

impl Params {
    /// Load parameters, taking defaults from the config file if one exists.
    pub fn load() -> Result<Self> {
        let mut params = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                params = toml::from_str(&contents).map_err(|e| {
                    DesilenceError::Config(format!(
                        "Failed to parse {}: {e}",
                        config_path.display()
                    ))
                })?;
            }
        }

        Ok(params)
    }

    /// Path to the user config file, if a config directory exists.
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("desilence").join("config.toml"))
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_parts == 0 {
            return Err(DesilenceError::Config(
                "Number of parts must be at least 1".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(DesilenceError::Config(
                "Pool size must be at least 1".to_string(),
            ));
        }
        if self.min_silence_len == 0 {
            return Err(DesilenceError::Config(
                "Minimum silence length must be positive".to_string(),
            ));
        }
        if self.prefix.is_empty() {
            return Err(DesilenceError::Config(
                "Chunk file prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
