//! Office Open XML (`.docx`) text extraction.
//!
//! A `.docx` file is a ZIP package whose main part, `word/document.xml`, looks like:
//! ```xml
//! <w:document>
//!   <w:body>
//!     <w:p><w:r><w:t>Hello</w:t></w:r></w:p>
//!     <w:tbl>
//!       <w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr>
//!     </w:tbl>
//!   </w:body>
//! </w:document>
//! ```
//! Only the top-level paragraphs and tables of the body are read. Paragraphs nested in
//! text boxes or in tables inside table cells do not contribute text. Table rows are read
//! per grid column: a cell spanning several columns (`w:gridSpan`) appears once per column,
//! and a vertical merge continuation (`w:vMerge` without `restart`) repeats the cell above.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, error};

use super::{DocumentFormat, ExtractionError, TextExtractor};

const DOCUMENT_PART: &str = "word/document.xml";

const BODY: &[&str] = &["document", "body"];
const TABLE: &[&str] = &["document", "body", "tbl"];
const ROW: &[&str] = &["document", "body", "tbl", "tr"];
const CELL: &[&str] = &["document", "body", "tbl", "tr", "tc"];
const CELL_PROPERTIES: &[&str] = &["document", "body", "tbl", "tr", "tc", "tcPr"];

#[derive(Debug, thiserror::Error)]
enum DocxError {
    #[error("not a valid OOXML package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed word/document.xml: {0}")]
    Xml(String),
}

/// A table as rows of cell texts.
pub type Table = Vec<Vec<String>>;

/// The text-bearing structure of a document body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocxBody {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

impl DocxBody {
    /// Flatten into plain text: paragraphs first, one per line, then every table row
    /// with each cell followed by a space. The result is trimmed.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for paragraph in &self.paragraphs {
            text.push_str(paragraph);
            text.push('\n');
        }
        for table in &self.tables {
            for row in table {
                for cell in row {
                    text.push_str(cell);
                    text.push(' ');
                }
                text.push('\n');
            }
        }
        text.trim().to_string()
    }
}

/// Extracts paragraph and table text from `.docx` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let body = extract_structure(bytes).map_err(|e| {
            error!(error = %e, "Error extracting text from DOCX");
            ExtractionError::new(DocumentFormat::Docx, e)
        })?;
        debug!(
            paragraphs = body.paragraphs.len(),
            tables = body.tables.len(),
            "DOCX structure extracted"
        );
        Ok(body.to_text())
    }
}

fn extract_structure(bytes: &[u8]) -> Result<DocxBody, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    parse_body(&xml)
}

/// Paragraph currently collecting text, with its index in the element path.
struct OpenParagraph {
    depth: usize,
    text: String,
}

/// A `w:tc` being read: its paragraphs plus the merge properties from `w:tcPr`.
struct OpenCell {
    paragraphs: Vec<String>,
    grid_span: usize,
    continues_merge: bool,
}

impl Default for OpenCell {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            grid_span: 1,
            continues_merge: false,
        }
    }
}

#[derive(Default)]
struct BodyBuilder {
    body: DocxBody,
    table: Option<Table>,
    /// Cell texts of the row being read, one entry per grid column.
    row: Option<Vec<String>>,
    /// Grid-expanded texts of the previous row, for vertical merge continuations.
    row_above: Vec<String>,
    cell: Option<OpenCell>,
}

impl BodyBuilder {
    fn finish_paragraph(&mut self, path: &[String], text: String) {
        if is_at(path, BODY) {
            self.body.paragraphs.push(text);
        } else if let Some(cell) = self.cell.as_mut() {
            cell.paragraphs.push(text);
        }
    }

    fn start_table(&mut self) {
        self.table = Some(Vec::new());
        self.row_above.clear();
    }

    fn cell_property(&mut self, name: &str, val: Option<String>) {
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        match name {
            "gridSpan" => {
                cell.grid_span = val.and_then(|v| v.trim().parse().ok()).unwrap_or(1).max(1);
            }
            // A bare <w:vMerge/> continues the merge, as does val="continue".
            "vMerge" => cell.continues_merge = val.as_deref() != Some("restart"),
            _ => {}
        }
    }

    /// Append a cell once per grid column it spans. A vertical merge continuation
    /// repeats the text of the cell above it.
    fn finish_cell(&mut self, cell: OpenCell) {
        let Some(row) = self.row.as_mut() else {
            return;
        };
        let text = if cell.continues_merge {
            self.row_above.get(row.len()).cloned().unwrap_or_default()
        } else {
            cell.paragraphs.join("\n")
        };
        for _ in 0..cell.grid_span {
            row.push(text.clone());
        }
    }

    fn finish_row(&mut self, cells: Vec<String>) {
        if let Some(table) = self.table.as_mut() {
            self.row_above = cells.clone();
            table.push(cells);
        }
    }
}

/// Value of the `w:val` attribute, whatever the namespace prefix.
fn val_attribute(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"val")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn parse_body(xml: &str) -> Result<DocxBody, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut builder = BodyBuilder::default();
    let mut paragraph: Option<OpenParagraph> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "p" if paragraph.is_none() && opens_paragraph(&path) => {
                        paragraph = Some(OpenParagraph {
                            depth: path.len(),
                            text: String::new(),
                        });
                    }
                    "tbl" if is_at(&path, BODY) => builder.start_table(),
                    "tr" if is_at(&path, TABLE) => builder.row = Some(Vec::new()),
                    "tc" if is_at(&path, ROW) => builder.cell = Some(OpenCell::default()),
                    "gridSpan" | "vMerge" if is_at(&path, CELL_PROPERTIES) => {
                        builder.cell_property(&name, val_attribute(&e));
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "p" if paragraph.is_none() && opens_paragraph(&path) => {
                        builder.finish_paragraph(&path, String::new());
                    }
                    "tbl" if is_at(&path, BODY) => {
                        builder.row_above.clear();
                        builder.body.tables.push(Vec::new());
                    }
                    "tr" if is_at(&path, TABLE) => builder.finish_row(Vec::new()),
                    "tc" if is_at(&path, ROW) => builder.finish_cell(OpenCell::default()),
                    "gridSpan" | "vMerge" if is_at(&path, CELL_PROPERTIES) => {
                        builder.cell_property(&name, val_attribute(&e));
                    }
                    "tab" | "br" | "cr" => {
                        if let Some(open) = paragraph.as_mut() {
                            if in_run_of(&path, open.depth) {
                                open.text.push(if name == "tab" { '\t' } else { '\n' });
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(open) = paragraph.as_mut() {
                    if path.last().map(String::as_str) == Some("t")
                        && in_run_of(&path[..path.len() - 1], open.depth)
                    {
                        let text = t.unescape().map_err(|e| DocxError::Xml(e.to_string()))?;
                        open.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = path.pop().unwrap_or_default();
                match name.as_str() {
                    "p" => {
                        if paragraph.as_ref().is_some_and(|open| open.depth == path.len()) {
                            if let Some(open) = paragraph.take() {
                                builder.finish_paragraph(&path, open.text);
                            }
                        }
                    }
                    "tc" if is_at(&path, ROW) => {
                        let cell = builder.cell.take().unwrap_or_default();
                        builder.finish_cell(cell);
                    }
                    "tr" if is_at(&path, TABLE) => {
                        let cells = builder.row.take().unwrap_or_default();
                        builder.finish_row(cells);
                    }
                    "tbl" if is_at(&path, BODY) => {
                        if let Some(table) = builder.table.take() {
                            builder.body.tables.push(table);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DocxError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !path.is_empty() {
        return Err(DocxError::Xml(format!("unclosed element <{}>", path.join("/"))));
    }
    Ok(builder.body)
}

fn is_at(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

fn opens_paragraph(path: &[String]) -> bool {
    is_at(path, BODY) || is_at(path, CELL)
}

/// `path` ends in a run (`w:r`) that belongs directly to the paragraph at `depth`,
/// i.e. no other paragraph (text box content) sits in between.
fn in_run_of(path: &[String], depth: usize) -> bool {
    path.len() > depth + 1
        && path.last().map(String::as_str) == Some("r")
        && !path[depth + 1..].iter().any(|name| name == "p")
}
