//! # Whiff
//!
//! An emotion-and-note perfume recommender.
//!
//! Whiff classifies a user's stated context (gender, season, time of day,
//! desired impression, activity, weather) into one of six latent emotion
//! clusters, picks a diverse set of candidates from the catalog, asks the
//! user to rate the notes those candidates share, and reranks the whole
//! catalog with the ratings blended in.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! whiff train --dataset perfumes.json --artifacts whiff.bin
//! whiff recommend --artifacts whiff.bin --catalog perfumes.json --context me.json --ratings notes.json
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use whiff::prelude::*;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let records = load_training_records("perfumes.json").unwrap();
//! let (artifacts, report) = Artifacts::fit(&records, &TrainingConfig::default()).unwrap();
//! println!("{}", report.evaluation);
//!
//! let recommender = Recommender::with_defaults(Arc::new(artifacts)).unwrap();
//! let catalog = catalog_from_records(&records);
//! let context = UserContext::new("female", "spring", "day", "romantic", "date", "sunny");
//!
//! let stage1 = recommender.score_stage1(&context, &catalog).unwrap();
//! let ratings: HashMap<String, RatingInput> = stage1
//!     .selection
//!     .surfaced_notes
//!     .iter()
//!     .map(|note| (note.clone(), RatingInput::from(4)))
//!     .collect();
//! let results = recommender.score_stage2(&catalog, &stage1, &ratings).unwrap();
//! ```
//!
//! ## Crate Structure
//!
//! - `whiff-core` - Data model, note vectorizer, context encoder, errors
//! - `whiff-classifier` - Emotion classifier, training and evaluation
//! - `whiff-similarity` - Stage-1 selection and stage-2 reranking
//! - `whiff-storage` - Artifact bundle, persistence and dataset loading
//! - `whiff-api` - The two-call [`Recommender`] service

pub mod config;

// Re-export core types
pub use whiff_core::{
    CatalogItem, ContextEncoder, ContextField, EmotionProbabilities, Error, ItemId, NoteVectorizer,
    Result, UserContext, Vector,
};

// Re-export classifier
pub use whiff_classifier::{ClassificationReport, EmotionClassifier, Trainer, TrainingConfig, TrainingReport};

// Re-export scoring
pub use whiff_similarity::{
    MatchStrength, NotePreference, Rating, RatingInput, Recommendation, RecommendationStats,
    RerankConfig, SelectorConfig, Stage1Selection,
};

// Re-export storage
pub use whiff_storage::{
    catalog_from_records, load_catalog, load_json, load_training_records, ArtifactStore, Artifacts,
    TrainingRecord,
};

// Re-export API
pub use whiff_api::{Recommender, RecommenderConfig, Stage1Result, Stage2Result};

pub use config::WhiffConfig;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        catalog_from_records, load_catalog, load_training_records, ArtifactStore, Artifacts,
        CatalogItem, EmotionProbabilities, Error, ItemId, RatingInput, Recommendation, Recommender,
        RecommenderConfig, Result, Stage1Result, TrainingConfig, UserContext, WhiffConfig,
    };
}
