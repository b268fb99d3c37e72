//! Structured document summaries
//!
//! A summary is five fixed sections extracted from the document text. A
//! section with no matching content is explicitly absent, never fabricated.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::SummaryConfig;
use crate::error::{Error, Result};
use crate::providers::SummaryProvider;

const MAX_SECTION_SENTENCES: usize = 5;
const MAX_METRIC_MATCHES: usize = 15;

/// Content of one summary section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionContent {
    Present(String),
    Absent,
}

impl SectionContent {
    fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Self::Absent
        } else {
            Self::Present(text)
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Five-section structured summary of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Leading substantive lines of the document
    pub overview: SectionContent,
    /// Sentences around financial keywords
    pub financial_performance: SectionContent,
    /// Explicit rating, grade, and score statements
    pub ratings: SectionContent,
    /// Percentage and currency figures
    pub key_metrics: SectionContent,
    /// Prose summary from the summary provider
    pub highlights: SectionContent,
}

/// Builds structured summaries using keyword extraction plus the summary
/// provider for the prose highlights.
pub struct SummaryBuilder {
    provider: Arc<dyn SummaryProvider>,
    config: SummaryConfig,
    financial: Regex,
    rating: Regex,
    percent: Regex,
    currency: Regex,
}

impl SummaryBuilder {
    pub fn new(provider: Arc<dyn SummaryProvider>, config: SummaryConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::config(format!("bad summary pattern: {}", e)))
        };
        Ok(Self {
            provider,
            config,
            financial: compile(r"(?i)\b(revenue|profit|income|earnings|sales|financial)\b")?,
            rating: compile(r"(?i)\b(?:rating|grade|score)\s*[:=]\s*[^\s,.;]+")?,
            percent: compile(r"\d+(?:\.\d+)?\s*%")?,
            currency: compile(r"[$€£]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|mn|bn))?")?,
        })
    }

    /// Build the five-section summary of `text`.
    pub async fn build(&self, text: &str) -> Result<DocumentSummary> {
        if text.trim().is_empty() {
            return Err(Error::empty_input("cannot summarize empty text"));
        }

        let highlights = self.summarize_grouped(text).await?;
        Ok(DocumentSummary {
            overview: SectionContent::from_text(self.overview(text)),
            financial_performance: SectionContent::from_text(self.financial_sentences(text)),
            ratings: SectionContent::from_text(self.rating_statements(text)),
            key_metrics: SectionContent::from_text(self.metrics(text)),
            highlights: SectionContent::from_text(highlights),
        })
    }

    /// Summarize text, splitting long documents into bounded groups and
    /// combining the per-group summaries.
    async fn summarize_grouped(&self, text: &str) -> Result<String> {
        let max_input = self
            .config
            .max_input_chars
            .min(self.provider.max_input_chars())
            .max(1);

        if text.len() <= max_input {
            return self
                .provider
                .summarize(text)
                .await
                .map_err(|e| Error::upstream(self.provider.name(), e.to_string()));
        }

        let groups = split_groups(text, max_input);
        let mut parts = Vec::new();
        for group in groups
            .iter()
            .filter(|g| !g.trim().is_empty())
            .take(self.config.max_groups)
        {
            let part = self
                .provider
                .summarize(group)
                .await
                .map_err(|e| Error::upstream(self.provider.name(), e.to_string()))?;
            if !part.trim().is_empty() {
                parts.push(part);
            }
        }
        tracing::debug!(
            groups = groups.len(),
            summarized = parts.len(),
            "combined grouped summaries"
        );
        Ok(parts.join(" "))
    }

    fn overview(&self, text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|l| l.len() > 20)
            .take(3)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn financial_sentences(&self, text: &str) -> String {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| self.financial.is_match(s))
            .take(MAX_SECTION_SENTENCES)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rating_statements(&self, text: &str) -> String {
        self.rating
            .find_iter(text)
            .map(|m| m.as_str())
            .take(MAX_SECTION_SENTENCES)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn metrics(&self, text: &str) -> String {
        let mut found: Vec<&str> = self
            .percent
            .find_iter(text)
            .chain(self.currency.find_iter(text))
            .map(|m| m.as_str())
            .take(MAX_METRIC_MATCHES)
            .collect();
        found.dedup();
        found.join(", ")
    }
}

/// Split text into consecutive groups of at most `max` bytes on char
/// boundaries
fn split_groups(text: &str, max: usize) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + max).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end <= start {
            break;
        }
        groups.push(&text[start..end]);
        start = end;
    }
    groups
}
