use crate::error::{CoreError, CoreResult};
use lopdf::Document;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub pages: usize,
    pub skipped_pages: Vec<u32>,
}

/// Page-by-page text with whitespace collapsed, pages separated by a blank
/// line. Pages that fail to decode are skipped. Less than `min_chars` of
/// text overall is an error.
pub fn extract_text(bytes: &[u8], min_chars: usize) -> CoreResult<ExtractedText> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| CoreError::PdfExtraction(format!("could not open PDF: {}", e)))?;
    let pages = doc.get_pages();

    let mut texts = Vec::with_capacity(pages.len());
    let mut skipped_pages = Vec::new();
    for page in pages.keys() {
        match doc.extract_text(&[*page]) {
            Ok(raw) => {
                let text = collapse_whitespace(&raw);
                debug!(page = *page, chars = text.len(), "page extracted");
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            Err(e) => {
                warn!(page = *page, error = %e, "skipping unreadable page");
                skipped_pages.push(*page);
            }
        }
    }

    let text = texts.join("\n\n");
    let chars = text.chars().count();
    if chars < min_chars {
        return Err(CoreError::PdfExtraction(format!(
            "only {} characters of text found in {} pages; likely image-based PDF",
            chars,
            pages.len()
        )));
    }
    Ok(ExtractedText {
        text,
        pages: pages.len(),
        skipped_pages,
    })
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
