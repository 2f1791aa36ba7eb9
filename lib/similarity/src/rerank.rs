//! Stage-2 reranking
//!
//! Blends the emotion score with a note score built from the user's note
//! ratings, ranks every catalog item and keeps the top results with
//! explanations.
//!
//! ```text
//! note_score  = cosine_weight * cos(item, user) + weighted_sum_weight * (Σ item[t] * rating[t] / divisor)
//! final_score = emotion_weight * emotion + note_weight * note_score + top10_bonus * is_top10
//! ```

use crate::config::RerankConfig;
use crate::explain::Recommendation;
use crate::ratings::NotePreference;
use crate::selector::Stage1Selection;
use ahash::AHashSet;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use whiff_core::{CatalogItem, Error, ItemId, NoteVectorizer, Result, Vector};

/// Per-item score components of one stage-2 call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// Position in the catalog
    pub index: usize,
    pub item_id: ItemId,
    pub emotion_score: f32,
    pub note_score: f32,
    pub is_top10: bool,
    pub final_score: f32,
    /// Number of distinct vocabulary notes the item has
    pub note_diversity: usize,
}

/// Rated vocabulary terms as `(index, rating)` pairs
///
/// Ratings for terms outside the vocabulary cannot touch any item vector and
/// are dropped here.
fn rated_terms(preference: &NotePreference, vectorizer: &NoteVectorizer) -> Vec<(usize, f32)> {
    preference
        .iter()
        .filter_map(|(term, rating)| vectorizer.index_of(term).map(|i| (i, rating.as_f32())))
        .collect()
}

/// Catalog positions of the stage-1 selection
fn top10_positions(catalog: &[CatalogItem], selection: &Stage1Selection) -> AHashSet<usize> {
    let mut positions = AHashSet::with_capacity(selection.selected.len());
    for selected in &selection.selected {
        match catalog.get(selected.index) {
            Some(item) if item.id == selected.item_id => {
                positions.insert(selected.index);
            }
            _ => positions.extend(
                catalog
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| item.id == selected.item_id)
                    .map(|(i, _)| i),
            ),
        }
    }
    positions
}

/// Scores and ranks catalog items against a note preference
#[derive(Debug, Clone, Default)]
pub struct Reranker {
    config: RerankConfig,
}

impl Reranker {
    /// Create a new reranker with the given weights
    pub fn new(config: RerankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    /// Preference vector over the vocabulary: `rating / 5` for rated terms, 0 elsewhere
    pub fn user_vector(&self, preference: &NotePreference, vectorizer: &NoteVectorizer) -> Vector {
        let mut user = Vector::zeros(vectorizer.dim());
        let slots = user.as_mut_slice();
        for (i, rating) in rated_terms(preference, vectorizer) {
            slots[i] = rating / 5.0;
        }
        user
    }

    /// Note score of one item
    ///
    /// `rated` are the `(index, rating)` pairs behind `user`. An empty
    /// preference yields a zero user vector and therefore a zero score.
    fn note_score(&self, item: &Vector, user: &Vector, rated: &[(usize, f32)]) -> f32 {
        let cosine = item.cosine_similarity(user);
        let weighted_sum: f32 = rated
            .iter()
            .map(|&(i, rating)| item.get(i).unwrap_or(0.0) * rating)
            .sum();
        self.config.cosine_weight * cosine
            + self.config.weighted_sum_weight * (weighted_sum / self.config.weighted_sum_divisor)
    }

    /// Blend the score components
    #[inline]
    #[must_use]
    pub fn final_score(&self, emotion_score: f32, note_score: f32, is_top10: bool) -> f32 {
        let bonus = if is_top10 { self.config.top10_bonus } else { 0.0 };
        self.config.emotion_weight * emotion_score + self.config.note_weight * note_score + bonus
    }

    /// Score every catalog item, in catalog order
    ///
    /// `note_vectors` and `emotion_scores` must hold one entry per catalog item.
    /// Membership in `selection` is decided by catalog position, so of two
    /// items sharing an id only the one stage 1 admitted gets the bonus. A
    /// selected entry whose position no longer holds its id (the catalog was
    /// reordered between calls) falls back to matching by id.
    pub fn score(
        &self,
        catalog: &[CatalogItem],
        note_vectors: &[Vector],
        emotion_scores: &[f32],
        selection: &Stage1Selection,
        preference: &NotePreference,
        vectorizer: &NoteVectorizer,
    ) -> Result<Vec<ScoredItem>> {
        for len in [note_vectors.len(), emotion_scores.len()] {
            if len != catalog.len() {
                return Err(Error::InvalidDimension {
                    expected: catalog.len(),
                    actual: len,
                });
            }
        }

        let rated = rated_terms(preference, vectorizer);
        let user = self.user_vector(preference, vectorizer);
        let top10 = top10_positions(catalog, selection);

        let scored = catalog
            .par_iter()
            .enumerate()
            .map(|(index, item)| {
                let vector = &note_vectors[index];
                let emotion_score = emotion_scores[index];
                let note_score = self.note_score(vector, &user, &rated);
                let is_top10 = top10.contains(&index);
                ScoredItem {
                    index,
                    item_id: item.id.clone(),
                    emotion_score,
                    note_score,
                    is_top10,
                    final_score: self.final_score(emotion_score, note_score, is_top10),
                    note_diversity: vector.count_nonzero(),
                }
            })
            .collect();
        Ok(scored)
    }

    /// Sort by final score then note diversity, both descending, and truncate
    ///
    /// The sort is stable, so full ties keep catalog order.
    pub fn rank(&self, mut scored: Vec<ScoredItem>) -> Vec<ScoredItem> {
        scored.sort_by(|a, b| {
            OrderedFloat(b.final_score)
                .cmp(&OrderedFloat(a.final_score))
                .then(b.note_diversity.cmp(&a.note_diversity))
        });
        scored.truncate(self.config.result_limit);
        scored
    }

    /// Score, rank and explain in one pass
    pub fn rerank(
        &self,
        catalog: &[CatalogItem],
        note_vectors: &[Vector],
        emotion_scores: &[f32],
        selection: &Stage1Selection,
        preference: &NotePreference,
        vectorizer: &NoteVectorizer,
    ) -> Result<Vec<Recommendation>> {
        let scored = self.score(catalog, note_vectors, emotion_scores, selection, preference, vectorizer)?;
        let ranked = self.rank(scored);

        tracing::debug!(
            catalog = catalog.len(),
            rated = preference.len(),
            results = ranked.len(),
            "stage 2 rerank"
        );

        Ok(ranked
            .iter()
            .map(|s| {
                Recommendation::from_scored(s, &catalog[s.index], &note_vectors[s.index], vectorizer, &self.config)
            })
            .collect())
    }
}
