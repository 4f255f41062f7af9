//! The converter: source file in, one PDF row per line out.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::{Config, DetectionMode};
use crate::document::TextDocument;
use crate::encoding::{ChardetDetector, Detect, Detection, Fallbacks, NoDetection, TextEncoding};
use crate::error::{ConversionError, Result};
use crate::render::{FontOptions, PdfRenderer};

/// Lifecycle of a converter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    Pending,
    Converted(PathBuf),
    Failed,
}

/// Summary of a finished conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub bytes: usize,
    /// Rows decoded per encoding name
    pub encodings: BTreeMap<String, usize>,
}

/// Converts one source file to `<source>.pdf`
pub struct Converter {
    source_path: PathBuf,
    output_path: Option<PathBuf>,
    detection: DetectionMode,
    fallbacks: Fallbacks,
    detector: Box<dyn Detect>,
    font_options: FontOptions,
    state: ConversionState,
}

impl Converter {
    /// Store the path; nothing is checked until the file is opened
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: None,
            detection: DetectionMode::PerLine,
            fallbacks: Fallbacks::default(),
            detector: Box::new(ChardetDetector),
            font_options: FontOptions::default(),
            state: ConversionState::Pending,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let source_path = config
            .source_path
            .clone()
            .ok_or_else(|| ConversionError::Config {
                reason: "no source path given".to_string(),
            })?;

        let mut converter = Self::new(source_path);
        converter.output_path = config.output_path.clone();
        converter.fallbacks = config.fallbacks()?;
        converter.font_options = config.font_options();
        converter.detection = config.detection;
        if config.detection == DetectionMode::Off {
            converter.detector = Box::new(NoDetection);
        }
        Ok(converter)
    }

    /// Replace the default chardetng based detector
    pub fn with_detector(mut self, detector: impl Detect + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_detection_mode(mut self, mode: DetectionMode) -> Self {
        self.detection = mode;
        if mode == DetectionMode::Off {
            self.detector = Box::new(NoDetection);
        }
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: Fallbacks) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_font_options(mut self, options: FontOptions) -> Self {
        self.font_options = options;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Configured output path, or the source path with `.pdf` appended
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let mut name = self.source_path.clone().into_os_string();
        name.push(".pdf");
        PathBuf::from(name)
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    /// Read, detect and decode every line into a new document
    ///
    /// The source is closed when this returns, whether it succeeded or not.
    pub fn build_document(&self) -> Result<TextDocument> {
        let file = File::open(&self.source_path).map_err(|e| ConversionError::SourceOpen {
            path: self.source_path.clone(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        let title = self
            .source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string());
        let mut doc = TextDocument::new(title);

        match self.detection {
            DetectionMode::WholeFile => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| self.read_error(e))?;

                let detection = self.detector.detect(&bytes);
                let encoding = self.resolve(&detection);
                info!("Whole-file detection: {} -> {}", detection, encoding);

                for (index, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
                    let text = decode_line(index + 1, raw, encoding)?;
                    doc.push_line(text, encoding.name());
                }
            }
            DetectionMode::PerLine | DetectionMode::Off => {
                let mut raw = Vec::new();
                let mut number = 0;
                loop {
                    raw.clear();
                    let read = reader
                        .read_until(b'\n', &mut raw)
                        .map_err(|e| self.read_error(e))?;
                    if read == 0 {
                        break;
                    }
                    number += 1;

                    let detection = self.detector.detect(&raw);
                    let encoding = self.resolve(&detection);
                    debug!(line = number, %detection, %encoding, "Detected line encoding");

                    let text = decode_line(number, &raw, encoding)?;
                    doc.push_line(text, encoding.name());
                }
            }
        }

        Ok(doc)
    }

    /// Build the document, render it and write the PDF
    pub fn convert_to_pdf(&mut self) -> Result<ConversionReport> {
        match self.try_convert() {
            Ok(report) => {
                self.state = ConversionState::Converted(report.output.clone());
                Ok(report)
            }
            Err(e) => {
                error!("Conversion of {} failed: {}", self.source_path.display(), e);
                self.state = ConversionState::Failed;
                Err(e)
            }
        }
    }

    fn try_convert(&self) -> Result<ConversionReport> {
        let output = self.output_path();
        info!(
            "Converting {} to {}",
            self.source_path.display(),
            output.display()
        );

        let document = self.build_document()?;

        let mut renderer = PdfRenderer::new(self.font_options.clone());
        let pdf_bytes = renderer.render(&document)?;

        fs::write(&output, &pdf_bytes).map_err(|e| ConversionError::OutputWrite {
            path: output.clone(),
            source: e,
        })?;

        let mut encodings = BTreeMap::new();
        for row in document.rows() {
            *encodings.entry(row.encoding.to_string()).or_insert(0) += 1;
        }

        info!(
            "Successfully converted {} rows to {} ({} bytes)",
            document.len(),
            output.display(),
            pdf_bytes.len()
        );

        Ok(ConversionReport {
            source: self.source_path.clone(),
            output,
            rows: document.len(),
            bytes: pdf_bytes.len(),
            encodings,
        })
    }

    fn resolve(&self, detection: &Detection) -> TextEncoding {
        let encoding = self.fallbacks.resolve(detection);
        match detection {
            Detection::Undetected => warn!("No encoding detected, falling back to {}", encoding),
            Detection::Unavailable => debug!("Detection off, decoding as {}", encoding),
            Detection::Detected { .. } => {}
        }
        encoding
    }

    fn read_error(&self, source: std::io::Error) -> ConversionError {
        ConversionError::SourceRead {
            path: self.source_path.clone(),
            source,
        }
    }
}

/// Strictly decode one raw line and drop its `\n` or `\r\n` terminator
fn decode_line(number: usize, raw: &[u8], encoding: TextEncoding) -> Result<String> {
    let decoded = encoding
        .decode(raw)
        .ok_or_else(|| ConversionError::Decode {
            line: number,
            encoding: encoding.name().to_string(),
        })?;
    let text: &str = &decoded;

    let trimmed = match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text,
    };
    Ok(trimmed.to_string())
}
