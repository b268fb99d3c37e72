//! Summary provider trait and the offline lead summarizer

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

/// Trait for producing a prose summary of a text passage
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Summarize `text`, which callers bound to `max_input_chars`
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Largest input the provider accepts in one call, in bytes
    fn max_input_chars(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Offline extractive summarizer: the leading sentences of the passage.
pub struct LeadSummarizer {
    max_input_chars: usize,
    max_sentences: usize,
}

impl LeadSummarizer {
    pub fn new(max_input_chars: usize, max_sentences: usize) -> Self {
        Self {
            max_input_chars,
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Default for LeadSummarizer {
    fn default() -> Self {
        Self::new(4000, 3)
    }
}

#[async_trait]
impl SummaryProvider for LeadSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let summary = text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(self.max_sentences)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(summary)
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn name(&self) -> &str {
        "lead-sentences"
    }
}
