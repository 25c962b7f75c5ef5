//! Document text extraction
//!
//! Each supported format gets one [`TextExtractor`]. Which extractor runs is decided
//! solely by the declared content type of the upload (see [`DocumentFormat::from_content_type`]);
//! file names and magic bytes are never consulted.

pub mod docx;
pub mod pdf;

use std::fmt;
use std::sync::Arc;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const LEGACY_WORD_MIME: &str = "application/msword";

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A document format with a dedicated extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Map a declared MIME type onto the extractor that handles it.
    ///
    /// Only the essence (`type/subtype`) is compared, case-insensitively. Legacy
    /// `application/msword` is routed to the DOCX extractor, which cannot read the
    /// binary `.doc` format; such uploads fail at extraction time.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime: mime::Mime = content_type.trim().parse().ok()?;
        match mime.essence_str().to_ascii_lowercase().as_str() {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME | LEGACY_WORD_MIME => Some(Self::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "PDF"),
            DocumentFormat::Docx => write!(f, "DOCX"),
        }
    }
}

/// True when the declared type is legacy binary Word rather than OOXML.
pub fn is_legacy_word(content_type: &str) -> bool {
    content_type
        .trim()
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().eq_ignore_ascii_case(LEGACY_WORD_MIME))
        .unwrap_or(false)
}

/// The parsing library could not read the document.
///
/// The display message is deliberately short and safe to hand to clients; the
/// library's own diagnostic stays reachable through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("Failed to extract text from {format}")]
pub struct ExtractionError {
    pub format: DocumentFormat,
    #[source]
    source: BoxError,
}

impl ExtractionError {
    pub fn new(format: DocumentFormat, source: impl Into<BoxError>) -> Self {
        Self {
            format,
            source: source.into(),
        }
    }
}

/// Converts the raw bytes of one document format into plain text.
///
/// Implementations are synchronous and CPU-bound; callers run them off the async
/// executor.
pub trait TextExtractor: Send + Sync {
    fn format(&self) -> DocumentFormat;

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// The extractor set used by the HTTP layer, one per [`DocumentFormat`].
#[derive(Clone)]
pub struct Extractors {
    pdf: Arc<dyn TextExtractor>,
    docx: Arc<dyn TextExtractor>,
}

impl Extractors {
    pub fn new(pdf: Arc<dyn TextExtractor>, docx: Arc<dyn TextExtractor>) -> Self {
        Self { pdf, docx }
    }

    pub fn for_format(&self, format: DocumentFormat) -> Arc<dyn TextExtractor> {
        match format {
            DocumentFormat::Pdf => Arc::clone(&self.pdf),
            DocumentFormat::Docx => Arc::clone(&self.docx),
        }
    }
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtractor::new()), Arc::new(DocxExtractor::new()))
    }
}

impl fmt::Debug for Extractors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractors")
            .field("pdf", &self.pdf.format())
            .field("docx", &self.docx.format())
            .finish()
    }
}

/// In-memory document builders for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Build a PDF with one page per entry, each drawing its string with a base-14 font.
    pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Wrap `body_xml` (the children of `w:body`) in a minimal OOXML package.
    pub fn docx_with_body(body_xml: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer
            .start_file("[Content_Types].xml", options)
            .unwrap();
        writer
            .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
    }

    pub fn table(rows: &[&[&str]]) -> String {
        let mut xml = String::from("<w:tbl><w:tblPr/>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in *row {
                xml.push_str("<w:tc><w:tcPr/>");
                xml.push_str(&paragraph(cell));
                xml.push_str("</w:tc>");
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }
}
