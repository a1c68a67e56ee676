//! Embedding-based consensus heuristic
//!
//! Opt-in presentation helper: embeddings are computed elsewhere and passed in
//! as plain vectors. Two answers count as agreeing when their cosine
//! similarity reaches the threshold; the least similar sentence pairs are
//! reported as points of disagreement.

use serde::{Deserialize, Serialize};

/// Cosine similarity of two vectors
///
/// `None` when the vectors differ in length, are empty, or one has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}

/// Similarity of one sentence of agent A to one sentence of agent B
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentencePair {
    pub left: String,
    pub right: String,
    pub similarity: f64,
}

/// Thresholds of the consensus heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusCheck {
    /// Minimum similarity counted as consensus
    pub threshold: f64,
    /// Share of least similar pairs reported as disagreement
    pub disagreement_fraction: f64,
}

impl Default for ConsensusCheck {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            disagreement_fraction: 0.2,
        }
    }
}

impl ConsensusCheck {
    /// Whether two answer embeddings agree; unusable vectors never agree
    pub fn is_consensus(&self, a: &[f64], b: &[f64]) -> bool {
        cosine_similarity(a, b).is_some_and(|similarity| similarity >= self.threshold)
    }

    /// The least similar pairs, lowest first
    ///
    /// Returns at least one pair whenever `pairs` is non-empty.
    pub fn disagreements(&self, pairs: &[SentencePair]) -> Vec<SentencePair> {
        if pairs.is_empty() {
            return Vec::new();
        }

        let mut sorted = pairs.to_vec();
        sorted.sort_by(|x, y| x.similarity.total_cmp(&y.similarity));

        let fraction = self.disagreement_fraction.clamp(0.0, 1.0);
        let count = ((sorted.len() as f64 * fraction).floor() as usize).max(1);
        sorted.truncate(count);
        sorted
    }
}
