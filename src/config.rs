//! Pipeline configuration files
//!
//! Uses RON for human-readable `PipelineConfig` files.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::rasterizer::PipelineConfig;

/// Error type for config loading and saving
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Load a pipeline config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Save a pipeline config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn load_config_from_str(s: &str) -> Result<PipelineConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Config from `path` when given and readable, defaults otherwise
pub fn load_or_default(path: Option<&Path>) -> PipelineConfig {
    let Some(path) = path else {
        return PipelineConfig::default();
    };

    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded pipeline config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Failed to load config {}: {}, using defaults", path.display(), e);
            PipelineConfig::default()
        }
    }
}
