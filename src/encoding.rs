//! Character encoding detection, label resolution and strict decoding.
//!
//! Detection runs over a raw byte slice (one line, or the whole file) and may
//! come back empty. Resolution turns that result into a concrete
//! [`TextEncoding`] using a two-tier fallback, and decoding never replaces
//! malformed input: invalid bytes surface as `None` so the caller can fail.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

use crate::error::{ConversionError, Result};

/// Label for UTF-8 that tolerates and strips a leading byte-order mark
pub const UTF_8_SIG: &str = "utf-8-sig";

/// A concrete encoding used to decode line bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    strip_bom: bool,
}

impl TextEncoding {
    /// Plain encoding, a byte-order mark is decoded like any other character
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            strip_bom: false,
        }
    }

    /// Encoding that drops its own byte-order mark when one leads the input
    pub fn with_bom_removal(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            strip_bom: true,
        }
    }

    pub fn utf8() -> Self {
        Self::new(UTF_8)
    }

    pub fn utf8_sig() -> Self {
        Self::with_bom_removal(UTF_8)
    }

    /// Resolve a label such as `utf-8`, `latin1` or `utf-8-sig`
    pub fn for_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        if normalized == UTF_8_SIG {
            return Some(Self::utf8_sig());
        }
        Encoding::for_label(normalized.as_bytes()).map(Self::new)
    }

    /// Like [`TextEncoding::for_label`], failing with `UnknownEncoding`
    pub fn parse(label: &str) -> Result<Self> {
        Self::for_label(label).ok_or_else(|| ConversionError::UnknownEncoding {
            label: label.to_string(),
        })
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn name(&self) -> &'static str {
        if self.strip_bom && self.encoding == UTF_8 {
            UTF_8_SIG
        } else {
            self.encoding.name()
        }
    }

    /// Decode without replacement characters; `None` on malformed input
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let body = if self.strip_bom {
            match Encoding::for_bom(bytes) {
                Some((bom_encoding, bom_len)) if bom_encoding == self.encoding => &bytes[bom_len..],
                _ => bytes,
            }
        } else {
            bytes
        };

        self.encoding
            .decode_without_bom_handling_and_without_replacement(body)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of running a detector over some bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The detector named an encoding
    Detected {
        encoding: TextEncoding,
        confident: bool,
    },
    /// The detector ran and explicitly found no encoding
    Undetected,
    /// No detection result at all (detection disabled)
    Unavailable,
}

impl Detection {
    pub fn encoding(&self) -> Option<TextEncoding> {
        match self {
            Detection::Detected { encoding, .. } => Some(*encoding),
            _ => None,
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::Detected {
                encoding,
                confident,
            } => write!(f, "{} (confident: {})", encoding, confident),
            Detection::Undetected => write!(f, "none"),
            Detection::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Anything that can guess the encoding of a byte slice
pub trait Detect {
    fn detect(&self, bytes: &[u8]) -> Detection;
}

impl<F> Detect for F
where
    F: Fn(&[u8]) -> Detection,
{
    fn detect(&self, bytes: &[u8]) -> Detection {
        self(bytes)
    }
}

/// Default detector: BOM sniffing, UTF-8 validation, then chardetng
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl Detect for ChardetDetector {
    fn detect(&self, bytes: &[u8]) -> Detection {
        if bytes.is_empty() {
            return Detection::Undetected;
        }

        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            if encoding == UTF_8 || encoding == UTF_16LE || encoding == UTF_16BE {
                return Detection::Detected {
                    encoding: TextEncoding::with_bom_removal(encoding),
                    confident: true,
                };
            }
        }

        if std::str::from_utf8(bytes).is_ok() {
            return Detection::Detected {
                encoding: TextEncoding::utf8(),
                confident: true,
            };
        }

        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let (encoding, confident) = detector.guess_assess(None, false);
        if !confident {
            debug!("Low confidence guess {} for {} bytes", encoding.name(), bytes.len());
        }

        // chardetng always has a guess, so only empty input goes undetected
        Detection::Detected {
            encoding: TextEncoding::new(encoding),
            confident,
        }
    }
}

/// Detector used when detection is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetection;

impl Detect for NoDetection {
    fn detect(&self, _bytes: &[u8]) -> Detection {
        Detection::Unavailable
    }
}

/// The two fallback tiers applied when detection does not name an encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallbacks {
    /// Used when there is no detection result
    pub default: TextEncoding,
    /// Used when detection ran and explicitly found nothing
    pub undetected: TextEncoding,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            default: TextEncoding::utf8(),
            undetected: TextEncoding::utf8_sig(),
        }
    }
}

impl Fallbacks {
    pub fn resolve(&self, detection: &Detection) -> TextEncoding {
        match detection {
            Detection::Detected { encoding, .. } => *encoding,
            Detection::Undetected => self.undetected,
            Detection::Unavailable => self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn test_label_resolution() {
        assert_eq!(TextEncoding::for_label("utf-8"), Some(TextEncoding::utf8()));
        assert_eq!(TextEncoding::for_label("UTF_8_SIG"), Some(TextEncoding::utf8_sig()));
        assert_eq!(
            TextEncoding::for_label("latin1").map(|e| e.encoding()),
            Some(WINDOWS_1252)
        );
        assert!(TextEncoding::for_label("klingon-8").is_none());
        assert!(matches!(
            TextEncoding::parse("klingon-8"),
            Err(ConversionError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_names() {
        assert_eq!(TextEncoding::utf8().name(), "UTF-8");
        assert_eq!(TextEncoding::utf8_sig().name(), "utf-8-sig");
        assert_eq!(TextEncoding::new(WINDOWS_1252).to_string(), "windows-1252");
    }

    #[test]
    fn test_utf8_sig_strips_bom() {
        let bytes = b"\xEF\xBB\xBFHello";
        assert_eq!(TextEncoding::utf8_sig().decode(bytes).as_deref(), Some("Hello"));
        assert_eq!(
            TextEncoding::utf8().decode(bytes).as_deref(),
            Some("\u{FEFF}Hello")
        );
        // No BOM is fine too
        assert_eq!(TextEncoding::utf8_sig().decode(b"plain").as_deref(), Some("plain"));
    }

    #[test]
    fn test_strict_decoding() {
        assert!(TextEncoding::utf8().decode(b"caf\xE9").is_none());
        assert!(TextEncoding::utf8_sig().decode(b"\xFF\xFE").is_none());
        assert_eq!(
            TextEncoding::new(WINDOWS_1252).decode(b"caf\xE9").as_deref(),
            Some("café")
        );
    }

    #[test]
    fn test_detect_utf8_and_ascii() {
        let detector = ChardetDetector;
        assert_eq!(
            detector.detect(b"Hello\n").encoding(),
            Some(TextEncoding::utf8())
        );
        assert_eq!(
            detector.detect("Wörld\n".as_bytes()).encoding(),
            Some(TextEncoding::utf8())
        );
    }

    #[test]
    fn test_detect_bom() {
        let detection = ChardetDetector.detect(b"\xEF\xBB\xBFHello\n");
        assert_eq!(detection.encoding(), Some(TextEncoding::utf8_sig()));

        let detection = ChardetDetector.detect(b"\xFF\xFEH\x00i\x00");
        let encoding = detection.encoding().expect("utf-16 bom");
        assert_eq!(encoding.encoding(), UTF_16LE);
        assert_eq!(encoding.decode(b"\xFF\xFEH\x00i\x00").as_deref(), Some("Hi"));
    }

    #[test]
    fn test_detect_empty_is_undetected() {
        assert_eq!(ChardetDetector.detect(b""), Detection::Undetected);
    }

    #[test]
    fn test_detect_legacy_single_byte() {
        // Curly quotes and the euro sign only exist in the windows-125x range
        let line: &[u8] =
            b"\x93Das M\xE4dchen zahlt 5 \x80 f\xFCr den Kaffee und gr\xFC\xDFt den B\xE4cker.\x94\n";
        let detection = ChardetDetector.detect(line);
        let encoding = detection.encoding().expect("legacy encoding detected");
        assert_ne!(encoding.encoding(), UTF_8);
    }

    #[test]
    fn test_detect_keeps_unconfident_guess() {
        // Too few bytes for chardetng to be sure, but a guess is still made
        for line in [&b"\xE9"[..], b"\x81\x8D\x8F\x90", b"na\xEFve\n"] {
            match ChardetDetector.detect(line) {
                Detection::Detected { encoding, .. } => assert_ne!(encoding.encoding(), UTF_8),
                other => panic!("expected a guess for {:?}, got {}", line, other),
            }
        }
    }

    #[test]
    fn test_fallback_tiers() {
        let fallbacks = Fallbacks::default();
        assert_eq!(fallbacks.resolve(&Detection::Unavailable), TextEncoding::utf8());
        assert_eq!(fallbacks.resolve(&Detection::Undetected), TextEncoding::utf8_sig());

        let detected = Detection::Detected {
            encoding: TextEncoding::new(WINDOWS_1252),
            confident: true,
        };
        assert_eq!(fallbacks.resolve(&detected).encoding(), WINDOWS_1252);
    }

    #[test]
    fn test_closure_detector() {
        let always_latin1 = |_: &[u8]| Detection::Detected {
            encoding: TextEncoding::new(WINDOWS_1252),
            confident: false,
        };
        assert_eq!(
            always_latin1.detect(b"x").encoding().map(|e| e.encoding()),
            Some(WINDOWS_1252)
        );
        assert_eq!(NoDetection.detect(b"x"), Detection::Unavailable);
    }
}
