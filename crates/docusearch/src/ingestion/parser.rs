//! PDF text extraction, one entry per page

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Page;

/// Wall-clock limit for the whole-document fallback extractor
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns raw PDF bytes into page texts
///
/// Implementations must return pages in document order with 1-based numbers.
pub trait PdfExtractor: Send + Sync {
    /// Extract the text of every page
    fn extract_pages(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>>;
}

/// Extractor backed by `lopdf`, falling back to `pdf-extract`
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Page-by-page extraction straight from the content streams
    fn extract_with_lopdf(filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| {
            tracing::warn!("lopdf could not load {}: {}", filename, e);
            Error::invalid_document(filename, "Failed to load PDF")
        })?;

        if doc.is_encrypted() {
            return Err(Error::invalid_document(filename, "PDF is encrypted"));
        }

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            let text = match doc.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("No text on page {} of {}: {}", page_number, filename, e);
                    String::new()
                }
            };
            pages.push(Page::new(*page_number, text));
        }

        Ok(pages)
    }

    /// Whole-document extraction in a worker thread, split on form feeds
    fn extract_with_pdf_extract(filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        let text = match rx.recv_timeout(FALLBACK_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                text
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::error!("pdf-extract failed on {}: {}", filename, e);
                return Err(Error::invalid_document(filename, "Failed to extract text"));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!(
                    "PDF extraction of {} timed out after {}s",
                    filename,
                    FALLBACK_TIMEOUT.as_secs()
                );
                return Err(Error::invalid_document(filename, "Text extraction timed out"));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread for {} crashed", filename);
                return Err(Error::invalid_document(filename, "Text extraction failed"));
            }
        };

        Ok(split_form_feeds(&text))
    }
}

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        match Self::extract_with_lopdf(filename, data) {
            Ok(pages) if has_text(&pages) => return Ok(pages),
            Ok(_) => tracing::debug!("lopdf found no text in {}, trying pdf-extract", filename),
            Err(_) => tracing::debug!("Falling back to pdf-extract for {}", filename),
        }

        let pages = Self::extract_with_pdf_extract(filename, data)?;
        if !has_text(&pages) {
            return Err(Error::invalid_document(
                filename,
                "PDF has no extractable text (it may be scanned or image-only)",
            ));
        }

        Ok(pages)
    }
}

fn has_text(pages: &[Page]) -> bool {
    pages.iter().any(|p| !p.text.trim().is_empty())
}

/// Split whole-document text into pages at form feed characters
fn split_form_feeds(text: &str) -> Vec<Page> {
    text.split('\x0C')
        .enumerate()
        .map(|(i, page)| Page::new(i as u32 + 1, page))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_form_feeds_numbers_from_one() {
        let pages = split_form_feeds("first\x0Csecond\x0C\x0Cfourth");
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[0], Page::new(1, "first"));
        assert_eq!(pages[2], Page::new(3, ""));
        assert_eq!(pages[3].number, 4);
    }

    #[test]
    fn test_single_page_without_form_feed() {
        let pages = split_form_feeds("only page");
        assert_eq!(pages, vec![Page::new(1, "only page")]);
    }

    #[test]
    fn test_garbage_is_invalid_document() {
        let err = PdfTextExtractor::new()
            .extract_pages("broken.pdf", b"%PDF-1.4 this is not really a pdf")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { ref filename, .. } if filename == "broken.pdf"));

        // Library error text stays in the logs
        let message = err.public_message();
        let summary = message.strip_prefix("broken.pdf: ").unwrap();
        assert!(
            [
                "Failed to extract text",
                "Text extraction failed",
                "Text extraction timed out",
                "PDF has no extractable text (it may be scanned or image-only)",
            ]
            .contains(&summary),
            "unexpected public message: {}",
            message
        );
    }
}
