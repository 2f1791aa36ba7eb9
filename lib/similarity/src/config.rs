//! Scoring configuration
//!
//! Weights and limits for both stages. Defaults reproduce the production
//! scorer; any field may be overridden from a JSON config file.

use serde::{Deserialize, Serialize};
use whiff_core::{Error, Result};

/// Stage-1 selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Maximum number of diverse candidates
    pub top_k: usize,
    /// Candidates at or above this note similarity to an admitted item are skipped
    pub similarity_threshold: f32,
    /// Number of notes surfaced for preference elicitation
    pub surfaced_notes: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            similarity_threshold: 0.95,
            surfaced_notes: 15,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("selector.top_k must be positive".to_string()));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(Error::InvalidConfig(
                "selector.similarity_threshold must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stage-2 blending weights, explanation thresholds and output size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub emotion_weight: f32,
    pub note_weight: f32,
    /// Bonus for items that made the stage-1 selection
    pub top10_bonus: f32,
    /// Share of the note score taken from cosine similarity
    pub cosine_weight: f32,
    /// Share of the note score taken from the rating-weighted note sum
    pub weighted_sum_weight: f32,
    /// Fixed divisor bounding the rating-weighted note sum
    pub weighted_sum_divisor: f32,
    pub result_limit: usize,
    pub strong_threshold: f32,
    pub similar_threshold: f32,
    pub supporting_notes: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            emotion_weight: 0.7,
            note_weight: 0.25,
            top10_bonus: 0.05,
            cosine_weight: 0.7,
            weighted_sum_weight: 0.3,
            weighted_sum_divisor: 10.0,
            result_limit: 10,
            strong_threshold: 0.65,
            similar_threshold: 0.5,
            supporting_notes: 2,
        }
    }
}

impl RerankConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("emotion_weight", self.emotion_weight),
            ("note_weight", self.note_weight),
            ("top10_bonus", self.top10_bonus),
            ("cosine_weight", self.cosine_weight),
            ("weighted_sum_weight", self.weighted_sum_weight),
        ];
        for (name, weight) in weights {
            if !(weight >= 0.0) {
                return Err(Error::InvalidConfig(format!("rerank.{} must not be negative", name)));
            }
        }
        if !(self.weighted_sum_divisor > 0.0) {
            return Err(Error::InvalidConfig(
                "rerank.weighted_sum_divisor must be positive".to_string(),
            ));
        }
        if self.similar_threshold > self.strong_threshold {
            return Err(Error::InvalidConfig(
                "rerank.similar_threshold must not exceed rerank.strong_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SelectorConfig::default().validate().is_ok());
        assert!(RerankConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RerankConfig = serde_json::from_str(r#"{"result_limit": 5}"#).unwrap();
        assert_eq!(config.result_limit, 5);
        assert_eq!(config.emotion_weight, 0.7);
        assert_eq!(config.weighted_sum_divisor, 10.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = RerankConfig {
            note_weight: -0.1,
            ..RerankConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let config = RerankConfig {
            weighted_sum_divisor: 0.0,
            ..RerankConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_selector_threshold_bounds() {
        let config = SelectorConfig {
            similarity_threshold: 1.5,
            ..SelectorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
