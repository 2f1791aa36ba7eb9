//! Two-call recommendation service
//!
//! Stage 1 takes a user context and returns diverse candidates plus the notes
//! to ask about. Stage 2 takes the caller's note ratings and returns the final
//! ranked list. Nothing is kept between the two calls: the stage-1 result is
//! handed back by the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use whiff_core::{CatalogItem, EmotionProbabilities, Result, UserContext};
use whiff_similarity::{
    emotion_scores, NotePreference, RatingInput, Recommendation, RecommendationStats, RerankConfig,
    Reranker, SelectorConfig, Stage1Selection, Stage1Selector,
};
use whiff_storage::Artifacts;

/// Scoring configuration for both stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub selector: SelectorConfig,
    pub rerank: RerankConfig,
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<()> {
        self.selector.validate()?;
        self.rerank.validate()
    }
}

/// Output of [`Recommender::score_stage1`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage1Result {
    pub probabilities: EmotionProbabilities,
    pub predicted_cluster: usize,
    #[serde(flatten)]
    pub selection: Stage1Selection,
}

/// Output of [`Recommender::score_stage2_with_stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage2Result {
    pub recommendations: Vec<Recommendation>,
    pub stats: RecommendationStats,
}

/// Stateless scorer over shared, read-only artifacts
#[derive(Debug, Clone)]
pub struct Recommender {
    artifacts: Arc<Artifacts>,
    selector: Stage1Selector,
    reranker: Reranker,
}

impl Recommender {
    pub fn new(artifacts: Arc<Artifacts>, config: RecommenderConfig) -> Result<Self> {
        artifacts.validate()?;
        config.validate()?;
        Ok(Self {
            artifacts,
            selector: Stage1Selector::new(config.selector),
            reranker: Reranker::new(config.rerank),
        })
    }

    pub fn with_defaults(artifacts: Arc<Artifacts>) -> Result<Self> {
        Self::new(artifacts, RecommenderConfig::default())
    }

    pub fn artifacts(&self) -> &Arc<Artifacts> {
        &self.artifacts
    }

    /// Predict the emotion profile and pick diverse candidates
    ///
    /// The context is validated first, so an incomplete context fails even
    /// against an empty catalog. An empty catalog gives an empty selection.
    pub fn score_stage1(&self, context: &UserContext, catalog: &[CatalogItem]) -> Result<Stage1Result> {
        let probabilities = self.artifacts.predict(context)?;
        let predicted_cluster = probabilities.argmax().unwrap_or(0);

        let vectorizer = &self.artifacts.vectorizer;
        let note_vectors = vectorizer.transform_catalog(catalog);
        let selection = self
            .selector
            .select(&probabilities, catalog, &note_vectors, vectorizer)?;

        tracing::debug!(
            predicted_cluster,
            selected = selection.selected.len(),
            surfaced = selection.surfaced_notes.len(),
            "scored stage 1"
        );

        Ok(Stage1Result {
            probabilities,
            predicted_cluster,
            selection,
        })
    }

    /// Blend note ratings into the final ranking
    ///
    /// `catalog` must be the catalog stage 1 ran on. `ratings` maps surfaced
    /// notes to the caller's answers; an empty map skips the note preference.
    pub fn score_stage2(
        &self,
        catalog: &[CatalogItem],
        stage1: &Stage1Result,
        ratings: &HashMap<String, RatingInput>,
    ) -> Result<Vec<Recommendation>> {
        let vectorizer = &self.artifacts.vectorizer;
        let note_vectors = vectorizer.transform_catalog(catalog);
        let scores = emotion_scores(&stage1.probabilities, catalog)?;
        let preference = NotePreference::from_answers(&stage1.selection.surfaced_notes, ratings);

        self.reranker.rerank(
            catalog,
            &note_vectors,
            &scores,
            &stage1.selection,
            &preference,
            vectorizer,
        )
    }

    /// [`score_stage2`](Self::score_stage2) with summary statistics
    pub fn score_stage2_with_stats(
        &self,
        catalog: &[CatalogItem],
        stage1: &Stage1Result,
        ratings: &HashMap<String, RatingInput>,
    ) -> Result<Stage2Result> {
        let recommendations = self.score_stage2(catalog, stage1, ratings)?;
        let stats = RecommendationStats::compute(&recommendations, catalog.len());
        Ok(Stage2Result {
            recommendations,
            stats,
        })
    }
}
