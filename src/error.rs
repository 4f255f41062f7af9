use std::path::PathBuf;
use thiserror::Error;

/// Error types for a text to PDF conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The source file could not be opened
    #[error("Failed to open source '{path}': {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an already opened source failed
    #[error("Failed to read source '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Line bytes are invalid under the resolved encoding
    #[error("Line {line} is not valid {encoding}")]
    Decode { line: usize, encoding: String },

    /// An encoding label that neither WHATWG nor `utf-8-sig` knows
    #[error("Unknown encoding label '{label}'")]
    UnknownEncoding { label: String },

    /// Font loading error
    #[error("Font loading error for '{font_name}': {reason}")]
    FontLoading { font_name: String, reason: String },

    /// PDF generation failed
    #[error("PDF generation failed: {reason}")]
    PdfGeneration { reason: String },

    /// The rendered PDF could not be written
    #[error("Failed to write '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl ConversionError {
    /// Whether the failure came from the filesystem rather than the content
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ConversionError::SourceOpen { .. }
                | ConversionError::SourceRead { .. }
                | ConversionError::OutputWrite { .. }
        )
    }
}

/// Convenience Result type with ConversionError
pub type Result<T> = std::result::Result<T, ConversionError>;
