use lopdf::Document;
use tracing::{debug, error};

use super::{DocumentFormat, ExtractionError, TextExtractor};

#[derive(Debug, thiserror::Error)]
enum PdfError {
    #[error(transparent)]
    Parse(#[from] lopdf::Error),

    #[error("document is encrypted")]
    Encrypted,

    #[error("page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// Extracts the text layer of PDF documents with `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = extract_pages(bytes).map_err(|e| {
            error!(error = %e, "Error extracting text from PDF");
            ExtractionError::new(DocumentFormat::Pdf, e)
        })?;

        let mut text = String::new();
        for page in &pages {
            // lopdf already ends each page with a line break; keep one separator per page
            let page = page.strip_suffix('\n').unwrap_or(page);
            text.push_str(page.strip_suffix('\r').unwrap_or(page));
            text.push('\n');
        }
        debug!(pages = pages.len(), "PDF text extracted");

        Ok(text.trim().to_string())
    }
}

/// Text of every page, in document order.
///
/// A failure on any page fails the whole document.
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    let doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    // get_pages is keyed by page number, so iteration follows document order
    doc.get_pages()
        .keys()
        .map(|&page| {
            doc.extract_text(&[page])
                .map_err(|source| PdfError::Page { page, source })
        })
        .collect()
}
