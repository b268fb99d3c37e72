//! Text extraction provider trait

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Text extracted from an uploaded file
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// The full document text
    pub text: String,
    /// Number of pages detected
    pub page_count: u32,
}

/// Trait for extracting text from uploaded document bytes
///
/// Raw parsing (PDF internals, OCR) lives behind this seam; the pipeline only
/// sees the extracted text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the text content of an uploaded file
    async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Extractor for plain-text payloads. Pages are delimited by form feeds,
/// matching how text dumps of paginated documents are commonly produced.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::validation(format!("'{}' is not valid UTF-8: {}", filename, e)))?
            .to_string();
        let page_count = text.matches('\u{c}').count() as u32 + 1;
        Ok(ExtractedText { text, page_count })
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}
