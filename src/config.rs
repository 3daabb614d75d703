//! Scan configuration.
//!
//! Handles loading and validating `.photoscan.toml`. The file lives in the
//! source root by default (it is hidden, so it is never indexed) or is passed
//! explicitly with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! quality = 88                 # JPEG quality for thumbnails (1-100)
//!
//! thumbnails = [
//!     { size = 75, square = true },
//!     { size = 150, square = true },
//!     { size = 640 },
//!     { size = 800 },
//!     { size = 1024 },
//! ]
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Every thumbnail size is part of the cache's expected artifact set: removing
//! a size from the list makes the next scan reclaim its thumbnails.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::keys;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the source root.
pub const CONFIG_FILENAME: &str = ".photoscan.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// One thumbnail variant: bounding size, optionally padded to a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThumbnailSpec {
    pub size: u32,
    #[serde(default)]
    pub square: bool,
}

impl ThumbnailSpec {
    pub const fn new(size: u32, square: bool) -> Self {
        Self { size, square }
    }

    /// Cache file name of this variant for the photo at `relative`.
    pub fn artifact_name(&self, relative: &str) -> String {
        keys::thumbnail_name(relative, self.size, self.square)
    }
}

/// Scan configuration loaded from `.photoscan.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Thumbnail variants produced for every photo.
    pub thumbnails: Vec<ThumbnailSpec>,
    /// JPEG quality for thumbnails.
    pub quality: u32,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            thumbnails: vec![
                ThumbnailSpec::new(75, true),
                ThumbnailSpec::new(150, true),
                ThumbnailSpec::new(640, false),
                ThumbnailSpec::new(800, false),
                ThumbnailSpec::new(1024, false),
            ],
            quality: 88,
            processing: ProcessingConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails must not be empty".into(),
            ));
        }
        if self.thumbnails.iter().any(|t| t.size == 0) {
            return Err(ConfigError::Validation(
                "thumbnail sizes must be non-zero".into(),
            ));
        }
        let mut seen = HashSet::new();
        for spec in &self.thumbnails {
            if !seen.insert(spec) {
                return Err(ConfigError::Validation(format!(
                    "duplicate thumbnail {{ size = {}, square = {} }}",
                    spec.size, spec.square
                )));
            }
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        Ok(())
    }

    pub fn jpeg_quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel photo workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Load and validate a config file.
pub fn load_config_file(path: &Path) -> Result<ScanConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ScanConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load `.photoscan.toml` from the source root, or defaults when absent.
pub fn load_config(source_root: &Path) -> Result<ScanConfig, ConfigError> {
    let path = source_root.join(CONFIG_FILENAME);
    if !path.exists() {
        return Ok(ScanConfig::default());
    }
    load_config_file(&path)
}
