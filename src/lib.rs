//! morphos text to PDF converter
//!
//! Reads a file line by line, detects each line's character encoding, decodes
//! it and writes every line as a centered 200x10 mm row in Times 12pt to
//! `<source>.pdf`.
//!
//! ```no_run
//! use morphos::Converter;
//!
//! let mut converter = Converter::new("lorem_ipsum.docx");
//! let report = converter.convert_to_pdf()?;
//! println!("{} rows written to {}", report.rows, report.output.display());
//! # Ok::<(), morphos::ConversionError>(())
//! ```

pub mod cli;
pub mod config;
pub mod converter;
pub mod document;
pub mod encoding;
pub mod error;
pub mod render;

pub use config::{Config, DetectionMode};
pub use converter::{ConversionReport, ConversionState, Converter};
pub use document::TextDocument;
pub use error::{ConversionError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        config::{Config, DetectionMode},
        converter::{ConversionReport, ConversionState, Converter},
        document::{Row, TextDocument},
        encoding::{ChardetDetector, Detect, Detection, Fallbacks, TextEncoding},
        error::{ConversionError, Result},
        render::{FontOptions, PdfRenderer},
    };

    pub use tracing::{debug, error, info, warn};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
