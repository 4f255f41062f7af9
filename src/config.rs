use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::encoding::{Fallbacks, TextEncoding, UTF_8_SIG};
use crate::error::{ConversionError, Result};
use crate::render::FontOptions;

/// How much of the source one detection run sees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Detect every line on its own
    #[default]
    PerLine,
    /// Detect once over the entire file and decode all lines with the result
    WholeFile,
    /// Skip detection, decode with the fallback encoding
    Off,
}

/// Configuration for one conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File to convert
    #[serde(default)]
    pub source_path: Option<PathBuf>,

    /// Output file, `<source_path>.pdf` when unset
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    #[serde(default)]
    pub detection: DetectionMode,

    /// Encoding used when there is no detection result
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,

    /// Encoding used when detection explicitly finds nothing
    #[serde(default = "default_undetected_encoding")]
    pub undetected_encoding: String,

    /// Font directory searched before `./fonts` and system directories
    #[serde(default)]
    pub font_dir: Option<PathBuf>,

    /// Preferred font family name
    #[serde(default)]
    pub font_name: Option<String>,
}

fn default_fallback_encoding() -> String {
    "utf-8".to_string()
}
fn default_undetected_encoding() -> String {
    UTF_8_SIG.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: None,
            output_path: None,
            detection: DetectionMode::default(),
            fallback_encoding: default_fallback_encoding(),
            undetected_encoding: default_undetected_encoding(),
            font_dir: None,
            font_name: None,
        }
    }
}

impl Config {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConversionError::Config {
            reason: format!("invalid TOML: {}", e),
        })
    }

    /// Load configuration from file with validation
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| ConversionError::Config {
            reason: format!("cannot read '{}': {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate_encodings()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Full validation, a source path is required from here on
    pub fn validate(&self) -> Result<()> {
        if self.source_path.is_none() {
            return Err(ConversionError::Config {
                reason: "no source path given".to_string(),
            });
        }
        self.validate_encodings()
    }

    fn validate_encodings(&self) -> Result<()> {
        self.fallbacks().map(|_| ())
    }

    pub fn fallbacks(&self) -> Result<Fallbacks> {
        Ok(Fallbacks {
            default: TextEncoding::parse(&self.fallback_encoding)?,
            undetected: TextEncoding::parse(&self.undetected_encoding)?,
        })
    }

    pub fn font_options(&self) -> FontOptions {
        FontOptions {
            font_dir: self.font_dir.clone(),
            font_name: self.font_name.clone(),
        }
    }
}
