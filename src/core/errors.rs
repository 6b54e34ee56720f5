use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Why an export entry produced no stitched image.
///
/// The `Display` text is what ends up in the export manifest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no OCR region matched the entry text")]
    NoRegions,

    #[error("stitched image {width}x{height} exceeds the {limit}px limit")]
    TooLarge { width: u32, height: u32, limit: u32 },

    #[error("no page image available for any matched region")]
    NoCrops,

    #[error("failed to write stitched image: {0}")]
    Write(String),
}
