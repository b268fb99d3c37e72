//! Question answering provider trait and the offline lexical answerer

use std::collections::HashSet;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::providers::embedding::tokenize;

/// An answer candidate with the provider's own confidence estimate
#[derive(Debug, Clone)]
pub struct ScoredAnswer {
    /// Proposed answer text
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Trait for answering a question from a bounded context passage
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Answer `question` using only `context`
    async fn answer(&self, question: &str, context: &str) -> Result<ScoredAnswer>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "do", "does", "did", "what",
    "which", "who", "whom", "how", "when", "where", "why", "of", "in", "on", "for", "to", "from",
    "and", "or", "not", "with", "by", "at", "as", "it", "its", "this", "that", "there",
];

/// Offline extractive answerer.
///
/// Confidence is the fraction of the question's content terms (stopwords
/// removed) that appear in the context; the answer text is the context
/// sentence matching the most content terms. A context sharing no content
/// terms with the question scores zero.
pub struct LexicalAnswerer;

impl LexicalAnswerer {
    fn content_terms(question: &str) -> Vec<String> {
        tokenize(question)
            .into_iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .collect()
    }
}

#[async_trait]
impl AnswerProvider for LexicalAnswerer {
    async fn answer(&self, question: &str, context: &str) -> Result<ScoredAnswer> {
        let terms = Self::content_terms(question);
        if terms.is_empty() {
            return Ok(ScoredAnswer {
                text: String::new(),
                confidence: 0.0,
            });
        }

        let context_tokens: HashSet<String> = tokenize(context).into_iter().collect();
        let matched = terms.iter().filter(|t| context_tokens.contains(*t)).count();
        let confidence = matched as f32 / terms.len() as f32;

        // Best sentence: the one covering the most question content terms.
        let best_sentence = context
            .unicode_sentences()
            .map(|s| {
                let tokens: HashSet<String> = tokenize(s).into_iter().collect();
                let hits = terms.iter().filter(|t| tokens.contains(*t)).count();
                (hits, s)
            })
            .max_by_key(|(hits, _)| *hits)
            .map(|(_, s)| s.trim().to_string())
            .unwrap_or_default();

        Ok(ScoredAnswer {
            text: best_sentence,
            confidence,
        })
    }

    fn name(&self) -> &str {
        "lexical"
    }
}
