//! PDF serialization of a [`TextDocument`] with `genpdf`.
//!
//! The serif TrueType font is embedded, so rows keep their text when read
//! back. A Times-metric font (Liberation Serif, Times New Roman, Tinos) is
//! preferred; the crate ships DejaVu Serif under `fonts/` as the last resort.

use genpdf::{
    fonts::{self, FontData, FontFamily},
    render,
    style::Style,
    Context, Document, Element, Mm, Position, RenderResult, SimplePageDecorator, Size,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::document::{Align, Row, TextDocument};
use crate::error::{ConversionError, Result};

/// Page margins in millimetres
pub const PAGE_MARGINS: i32 = 10;

/// Family names tried with genpdf's `<name>-Regular.ttf` convention
const FAMILY_NAMES: &[&str] = &["LiberationSerif", "TimesNewRoman", "Tinos", "DejaVuSerif"];

/// Single files used for every style when no complete family is found
const SINGLE_FILES: &[&str] = &[
    "LiberationSerif-Regular.ttf",
    "Times New Roman.ttf",
    "times.ttf",
    "Tinos-Regular.ttf",
    "DejaVuSerif.ttf",
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-serif",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:\\Windows\\Fonts",
];

/// Where to look for the serif font
#[derive(Debug, Clone, Default)]
pub struct FontOptions {
    /// Searched before `./fonts` and the system directories
    pub font_dir: Option<PathBuf>,
    /// Family name tried first, in `<name>-Regular.ttf` form
    pub font_name: Option<String>,
}

impl FontOptions {
    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(dir) = &self.font_dir {
            dirs.push(dir.clone());
        }
        dirs.push(PathBuf::from("./fonts"));
        dirs.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));
        dirs
    }
}

/// Locate a serif font family following [`FontOptions`]
pub fn load_font_family(options: &FontOptions) -> Result<FontFamily<FontData>> {
    let mut names: Vec<&str> = Vec::new();
    if let Some(name) = options.font_name.as_deref() {
        names.push(name);
    }
    names.extend(FAMILY_NAMES);

    for dir in options.search_dirs() {
        if !dir.is_dir() {
            continue;
        }

        for name in &names {
            if let Ok(family) = fonts::from_files(&dir, name, None) {
                debug!("Loaded font family '{}' from {}", name, dir.display());
                return Ok(family);
            }
        }

        for file in SINGLE_FILES {
            let path = dir.join(file);
            if !path.is_file() {
                continue;
            }
            match single_file_family(&path) {
                Ok(family) => {
                    debug!("Loaded font file {}", path.display());
                    return Ok(family);
                }
                Err(e) => warn!("Skipping unusable font {}: {}", path.display(), e),
            }
        }
    }

    Err(ConversionError::FontLoading {
        font_name: options
            .font_name
            .clone()
            .unwrap_or_else(|| FAMILY_NAMES.join(", ")),
        reason: "no serif TrueType font found; set a font directory".to_string(),
    })
}

fn single_file_family(path: &Path) -> Result<FontFamily<FontData>> {
    let data = FontData::load(path, None).map_err(|e| ConversionError::FontLoading {
        font_name: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(FontFamily {
        regular: data.clone(),
        bold: data.clone(),
        italic: data.clone(),
        bold_italic: data,
    })
}

/// A fixed-size text cell, the unit every row is drawn as
struct TextCell {
    text: String,
    width: Mm,
    height: Mm,
    align: Align,
}

impl From<&Row> for TextCell {
    fn from(row: &Row) -> Self {
        Self {
            text: row.text.clone(),
            width: Mm::from(row.width),
            height: Mm::from(row.height),
            align: row.align,
        }
    }
}

impl Element for TextCell {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        style: Style,
    ) -> std::result::Result<RenderResult, genpdf::error::Error> {
        let mut result = RenderResult::default();
        let available = area.size();

        // Not enough room left on this page, the document starts a new one
        if available.height < self.height {
            result.has_more = true;
            return Ok(result);
        }

        // A4 leaves 190 mm between the margins, so the 200 mm cell is narrowed
        // to fit and rows center on the page rather than 5 mm right of it
        let width = if self.width < available.width {
            self.width
        } else {
            available.width
        };
        let zero = Mm::from(0.0);
        let text_width = style.str_width(&context.font_cache, &self.text);
        let free = if width > text_width {
            width - text_width
        } else {
            zero
        };
        let x = match self.align {
            Align::Left => zero,
            Align::Center => free / 2.0,
            Align::Right => free,
        };
        let line_height = style.line_height(&context.font_cache);
        let y = if self.height > line_height {
            (self.height - line_height) / 2.0
        } else {
            zero
        };

        if !self.text.is_empty()
            && !area.print_str(&context.font_cache, Position::new(x, y), style, &self.text)?
        {
            debug!("Row text clipped: {:?}", self.text);
        }

        result.size = Size::new(width, self.height);
        Ok(result)
    }
}

/// Renders documents to PDF bytes, loading fonts once
pub struct PdfRenderer {
    options: FontOptions,
    font_family: Option<FontFamily<FontData>>,
}

impl PdfRenderer {
    pub fn new(options: FontOptions) -> Self {
        Self {
            options,
            font_family: None,
        }
    }

    fn get_or_load_font(&mut self) -> Result<FontFamily<FontData>> {
        if let Some(family) = &self.font_family {
            return Ok(family.clone());
        }

        let family = load_font_family(&self.options)?;
        self.font_family = Some(family.clone());
        Ok(family)
    }

    /// Serialize the whole document; an empty document is one blank page
    pub fn render(&mut self, text_doc: &TextDocument) -> Result<Vec<u8>> {
        info!(
            "Rendering {} rows in {} {}pt",
            text_doc.len(),
            text_doc.font_family(),
            text_doc.font_size()
        );

        let font_family = self.get_or_load_font()?;

        let mut doc = Document::new(font_family);
        doc.set_title(text_doc.title());
        doc.set_minimal_conformance();
        doc.set_font_size(text_doc.font_size());

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(PAGE_MARGINS);
        doc.set_page_decorator(decorator);

        for row in text_doc.rows() {
            doc.push(TextCell::from(row));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| ConversionError::PdfGeneration {
                reason: e.to_string(),
            })?;

        debug!("Generated PDF with {} bytes", buffer.len());
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundled_fonts() -> FontOptions {
        FontOptions {
            font_dir: Some(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts"))),
            ..Default::default()
        }
    }

    fn extract(bytes: &[u8]) -> String {
        pdf_extract::extract_text_from_mem(bytes).expect("readable pdf")
    }

    #[test]
    fn test_search_dirs_order() {
        let options = FontOptions {
            font_dir: Some(PathBuf::from("/opt/fonts")),
            ..Default::default()
        };
        let dirs = options.search_dirs();
        assert_eq!(dirs[0], PathBuf::from("/opt/fonts"));
        assert_eq!(dirs[1], PathBuf::from("./fonts"));
    }

    #[test]
    fn test_bundled_font_loads() {
        assert!(load_font_family(&bundled_fonts()).is_ok());
    }

    #[test]
    fn test_unusable_font_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("DejaVuSerif.ttf"), b"not a font").unwrap();

        // The broken file is passed over and ./fonts supplies the family
        let options = FontOptions {
            font_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(load_font_family(&options).is_ok());
    }

    #[test]
    fn test_missing_font_name_falls_back() {
        let options = FontOptions {
            font_name: Some("NoSuchFamily".to_string()),
            ..bundled_fonts()
        };
        assert!(load_font_family(&options).is_ok());
    }

    #[test]
    fn test_render_rows() {
        let mut text_doc = TextDocument::new("rows");
        text_doc.push_line("Hello", "UTF-8");
        text_doc.push_line("Wörld", "UTF-8");

        let mut renderer = PdfRenderer::new(bundled_fonts());
        let bytes = renderer.render(&text_doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let text = extract(&bytes);
        assert!(text.contains("Hello"), "missing Hello in {:?}", text);
        assert!(text.contains("Wörld"), "missing Wörld in {:?}", text);
    }

    #[test]
    fn test_render_empty_document() {
        let mut renderer = PdfRenderer::new(bundled_fonts());
        let bytes = renderer.render(&TextDocument::new("empty")).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(extract(&bytes).trim().is_empty());
    }

    #[test]
    fn test_render_paginates_long_documents() {
        let mut short = TextDocument::new("short");
        short.push_line("only line", "UTF-8");
        let mut long = TextDocument::new("long");
        for i in 0..120 {
            long.push_line(format!("line {}", i), "UTF-8");
        }

        let mut renderer = PdfRenderer::new(bundled_fonts());
        let short_bytes = renderer.render(&short).unwrap();
        let long_bytes = renderer.render(&long).unwrap();
        assert!(long_bytes.len() > short_bytes.len());

        let text = extract(&long_bytes);
        assert!(text.contains("line 0"));
        assert!(text.contains("line 119"));
    }
}
