//! Explainability for stage-2 results
//!
//! Each recommendation carries its score components, a human-readable match
//! strength and the item's dominant notes.

use crate::config::RerankConfig;
use crate::rerank::ScoredItem;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use whiff_core::{CatalogItem, ItemId, NoteVectorizer, Vector};

/// How well a recommendation matches, bucketed by final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrength {
    Strong,
    Similar,
    Broadened,
}

impl MatchStrength {
    /// Thresholds are exclusive: a score equal to a threshold falls below it
    pub fn from_score(final_score: f32, config: &RerankConfig) -> Self {
        if final_score > config.strong_threshold {
            MatchStrength::Strong
        } else if final_score > config.similar_threshold {
            MatchStrength::Similar
        } else {
            MatchStrength::Broadened
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            MatchStrength::Strong => "strong match on both emotion and notes",
            MatchStrength::Similar => "similar to your taste",
            MatchStrength::Broadened => "broadened recommendation",
        }
    }
}

/// Supporting notes of one item; two by default
pub type SupportingNotes = SmallVec<[String; 2]>;

/// A ranked, explained recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub brand: String,
    pub final_score: f32,
    pub emotion_score: f32,
    pub note_score: f32,
    pub strength: MatchStrength,
    pub explanation: String,
    pub supporting_notes: SupportingNotes,
}

impl Recommendation {
    pub fn from_scored(
        scored: &ScoredItem,
        item: &CatalogItem,
        note_vector: &Vector,
        vectorizer: &NoteVectorizer,
        config: &RerankConfig,
    ) -> Self {
        let strength = MatchStrength::from_score(scored.final_score, config);
        Self {
            item_id: scored.item_id.clone(),
            name: item.name.clone(),
            brand: item.brand.clone(),
            final_score: scored.final_score,
            emotion_score: scored.emotion_score,
            note_score: scored.note_score,
            strength,
            explanation: strength.message().to_string(),
            supporting_notes: supporting_notes(note_vector, vectorizer, config.supporting_notes),
        }
    }
}

/// The `limit` highest-count notes of an item, ties by vocabulary order
pub fn supporting_notes(note_vector: &Vector, vectorizer: &NoteVectorizer, limit: usize) -> SupportingNotes {
    note_vector
        .ranked_nonzero()
        .into_iter()
        .filter_map(|i| vectorizer.term(i).map(str::to_string))
        .take(limit)
        .collect()
}

/// Summary statistics for one stage-2 call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationStats {
    /// Number of catalog items scored
    pub candidates_count: usize,
    pub results_count: usize,
    pub avg_score: f32,
    pub best_score: f32,
    pub strong_matches: usize,
}

impl RecommendationStats {
    /// Compute stats from ranked recommendations
    pub fn compute(results: &[Recommendation], candidates_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                strong_matches: 0,
            };
        }

        let avg_score = results.iter().map(|r| r.final_score).sum::<f32>() / results.len() as f32;
        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score: results[0].final_score, // results are sorted
            strong_matches: results
                .iter()
                .filter(|r| r.strength == MatchStrength::Strong)
                .count(),
        }
    }
}
