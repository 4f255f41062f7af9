//! Command line interface for the `morphos` binary.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, DetectionMode};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "morphos")]
#[command(about = "Convert a text file to PDF, one centered row per line")]
#[command(version)]
pub struct Cli {
    /// Source file to convert (may also come from the config file)
    pub source: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output PDF path [default: <SOURCE>.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run encoding detection per line, once over the whole file, or not at all
    #[arg(long, value_enum)]
    pub detection: Option<DetectionMode>,

    /// Encoding used when there is no detection result
    #[arg(long, value_name = "LABEL")]
    pub fallback_encoding: Option<String>,

    /// Encoding used when detection finds nothing
    #[arg(long, value_name = "LABEL")]
    pub undetected_encoding: Option<String>,

    /// Directory searched first for serif TrueType fonts
    #[arg(long, value_name = "DIR")]
    pub font_dir: Option<PathBuf>,

    /// Font family tried first, as `<NAME>-Regular.ttf`
    #[arg(long, value_name = "NAME")]
    pub font_name: Option<String>,

    /// Print the conversion report as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// Merge the optional config file with the flags, flags win
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(source) = &self.source {
            config.source_path = Some(source.clone());
        }
        if let Some(output) = &self.output {
            config.output_path = Some(output.clone());
        }
        if let Some(mode) = self.detection {
            config.detection = mode;
        }
        if let Some(label) = &self.fallback_encoding {
            config.fallback_encoding = label.clone();
        }
        if let Some(label) = &self.undetected_encoding {
            config.undetected_encoding = label.clone();
        }
        if let Some(dir) = &self.font_dir {
            config.font_dir = Some(dir.clone());
        }
        if let Some(name) = &self.font_name {
            config.font_name = Some(name.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
