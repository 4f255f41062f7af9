//! In-memory output document: a font and one fixed-size row per input line.

use serde::Serialize;

/// Font family every document is set in
pub const FONT_FAMILY: &str = "Times";

/// Font size in points
pub const FONT_SIZE: u8 = 12;

/// Row cell width in millimetres
pub const CELL_WIDTH: f64 = 200.0;

/// Row cell height in millimetres
pub const CELL_HEIGHT: f64 = 10.0;

/// Horizontal alignment of a row's text inside its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One decoded line placed as a text cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub text: String,
    /// Name of the encoding the text was decoded with
    pub encoding: &'static str,
    pub width: f64,
    pub height: f64,
    pub align: Align,
    /// Move the cursor to the next line after this cell
    pub line_break: bool,
}

/// Page-based document accumulator, serialized once by the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDocument {
    title: String,
    font_family: &'static str,
    font_size: u8,
    rows: Vec<Row>,
}

impl TextDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            font_family: FONT_FAMILY,
            font_size: FONT_SIZE,
            rows: Vec::new(),
        }
    }

    /// Append a centered 200x10 cell followed by a line break
    pub fn push_line(&mut self, text: impl Into<String>, encoding: &'static str) {
        self.rows.push(Row {
            text: text.into(),
            encoding,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            align: Align::Center,
            line_break: true,
        });
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn font_family(&self) -> &'static str {
        self.font_family
    }

    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row texts in order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let doc = TextDocument::new("notes.txt");
        assert!(doc.is_empty());
        assert_eq!(doc.title(), "notes.txt");
        assert_eq!(doc.font_family(), "Times");
        assert_eq!(doc.font_size(), 12);
    }

    #[test]
    fn test_push_line_uses_fixed_cell() {
        let mut doc = TextDocument::new("notes.txt");
        doc.push_line("Hello", "UTF-8");
        doc.push_line("Wörld", "UTF-8");

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.lines().collect::<Vec<_>>(), vec!["Hello", "Wörld"]);

        for row in doc.rows() {
            assert_eq!(row.width, 200.0);
            assert_eq!(row.height, 10.0);
            assert_eq!(row.align, Align::Center);
            assert!(row.line_break);
        }
    }
}
