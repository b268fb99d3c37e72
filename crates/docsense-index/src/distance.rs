//! Similarity metrics for embedding comparison

use serde::{Deserialize, Serialize};

/// Distance metric used for nearest-neighbor ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity (higher is more similar)
    #[default]
    Cosine,
    /// Euclidean distance, reported as 1 / (1 + d) so higher is more similar
    Euclidean,
}

impl DistanceMetric {
    /// Similarity between two vectors of equal length, in a
    /// higher-is-more-similar orientation for both metrics.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => {
                let d = euclidean_distance(a, b);
                1.0 / (1.0 + d)
            }
        }
    }
}

/// Cosine similarity in [-1, 1]; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Euclidean (L2) distance
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
