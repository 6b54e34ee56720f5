use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    /// Longest-matching-block recursion; stable, preferred for entry matching.
    #[default]
    Ratcliff,
    /// Minimal edit script via `similar`; faster on long pages.
    Myers,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiffConfig {
    pub algorithm: DiffAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// ASCII-only matching runs shorter than this are treated as coincidental.
    pub min_ascii_run: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { min_ascii_run: 2 }
    }
}

/// Box merging thresholds in pixels. OCR jitter scales with scan resolution,
/// so these are expected to be tuned per source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    pub horizontal_x_tolerance: f32,
    pub horizontal_gap_tolerance: f32,
    pub vertical_center_tolerance: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            horizontal_x_tolerance: 50.0,
            horizontal_gap_tolerance: 50.0,
            vertical_center_tolerance: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StitchConfig {
    pub padding: u32,
    pub margin: u32,
    pub max_dimension: u32,
    pub background: [u8; 3],
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            margin: 10,
            max_dimension: 65_500,
            background: [255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub image_dir: Option<PathBuf>,
    pub ocr_dir: Option<PathBuf>,
    pub page_offset: i64,
    pub text_path_left: Option<PathBuf>,
    pub text_path_right: Option<PathBuf>,
    pub regex_left: String,
    pub regex_right: String,
    /// Number of consecutive pages an entry is searched on, starting at its own.
    pub entry_page_span: u32,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            image_dir: None,
            ocr_dir: None,
            page_offset: 0,
            text_path_left: None,
            text_path_right: None,
            regex_left: r"^\*\*(.*?)\*\*".to_string(),
            regex_right: r"^([a-zA-Z]*?)".to_string(),
            entry_page_span: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignConfig {
    pub diff: DiffConfig,
    pub resolver: ResolverConfig,
    pub merge: MergeConfig,
    pub stitch: StitchConfig,
    pub session: SessionConfig,
    pub project: ProjectConfig,
}

impl AlignConfig {
    /// Loads a JSON config; sections and fields the file omits keep their defaults.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            config_path: config_path.to_path_buf(),
            source,
        })?;
        let config: AlignConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AlignConfig::load_from_path`], but a missing file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.as_ref().exists() => Self::load_from_path(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("merge.horizontal_x_tolerance", self.merge.horizontal_x_tolerance),
            ("merge.horizontal_gap_tolerance", self.merge.horizontal_gap_tolerance),
            ("merge.vertical_center_tolerance", self.merge.vertical_center_tolerance),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive number of pixels, got {value}"),
                });
            }
        }
        if self.stitch.max_dimension == 0 {
            return Err(ConfigError::Invalid {
                field: "stitch.max_dimension",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.project.entry_page_span == 0 {
            return Err(ConfigError::Invalid {
                field: "project.entry_page_span",
                message: "must cover at least the entry's own page".to_string(),
            });
        }
        Ok(())
    }
}
