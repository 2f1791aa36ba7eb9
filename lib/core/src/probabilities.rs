use serde::{Deserialize, Serialize};

/// Tolerance used when checking that probabilities sum to one
pub const PROBABILITY_TOLERANCE: f32 = 1e-6;

/// Per-cluster probability distribution predicted for one user context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProbabilities {
    probs: Vec<f32>,
}

impl EmotionProbabilities {
    /// Wrap an already normalized distribution
    #[inline]
    #[must_use]
    pub fn new(probs: Vec<f32>) -> Self {
        Self { probs }
    }

    /// Numerically stable softmax over raw logits
    ///
    /// Accumulates in f64 so the f32 result sums to one within
    /// [`PROBABILITY_TOLERANCE`].
    pub fn from_logits(logits: &[f32]) -> Self {
        if logits.is_empty() {
            return Self { probs: Vec::new() };
        }
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let exps: Vec<f64> = logits.iter().map(|&z| (z as f64 - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Self {
            probs: exps.iter().map(|e| (e / total) as f32).collect(),
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.probs.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.probs
    }

    /// Probability mass assigned to `cluster`, if the cluster exists
    #[inline]
    pub fn get(&self, cluster: usize) -> Option<f32> {
        self.probs.get(cluster).copied()
    }

    /// Most likely cluster (first one on ties)
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in self.probs.iter().enumerate() {
            if best.map_or(true, |(_, bp)| p > bp) {
                best = Some((i, p));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn sum(&self) -> f32 {
        self.probs.iter().sum()
    }

    /// True when all entries are in [0, 1] and they sum to one
    pub fn is_valid(&self) -> bool {
        !self.probs.is_empty()
            && self.probs.iter().all(|p| (0.0..=1.0).contains(p))
            && (self.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }
}
