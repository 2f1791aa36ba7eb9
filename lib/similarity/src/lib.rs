//! # Whiff Similarity
//!
//! Two-stage scoring of catalog items against a user's predicted emotion
//! profile and note preferences.
//!
//! - **Stage 1**: soft-label emotion scores, a diverse candidate set with
//!   note-similarity de-duplication, and the notes to ask the user about
//! - **Stage 2**: note ratings blended into a final score, ranked and explained
//!
//! ## Example
//!
//! ```rust
//! use whiff_core::{CatalogItem, EmotionProbabilities, NoteVectorizer};
//! use whiff_similarity::{emotion_scores, NotePreference, Rating, Reranker, Stage1Selector};
//!
//! let catalog = vec![
//!     CatalogItem::new(1, "rose, vanilla", 0),
//!     CatalogItem::new(2, "oud, smoke", 1),
//! ];
//! let vectorizer = NoteVectorizer::fit_items(&catalog);
//! let vectors = vectorizer.transform_catalog(&catalog);
//! let probs = EmotionProbabilities::new(vec![0.6, 0.2, 0.05, 0.05, 0.05, 0.05]);
//!
//! let selection = Stage1Selector::default()
//!     .select(&probs, &catalog, &vectors, &vectorizer)
//!     .unwrap();
//! assert_eq!(selection.selected.len(), 2);
//!
//! let mut preference = NotePreference::new();
//! preference.insert("smoke", Rating::MAX);
//! let scores = emotion_scores(&probs, &catalog).unwrap();
//! let results = Reranker::default()
//!     .rerank(&catalog, &vectors, &scores, &selection, &preference, &vectorizer)
//!     .unwrap();
//! assert_eq!(results.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Emotion     │────>│  Stage-1     │────>│  Surfaced    │
//! │  probs       │     │  Selector    │     │  notes       │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!                             │                    │ ratings
//!                             │             ┌──────────────┐
//!                             └────────────>│  Reranker    │
//!                                           │  (catalog)   │
//!                                           └──────────────┘
//!                                                  │
//!                                           ┌──────────────┐
//!                                           │  Explain     │
//!                                           │  (results)   │
//!                                           └──────────────┘
//! ```

pub mod config;
pub mod explain;
pub mod ratings;
pub mod rerank;
pub mod selector;

pub use config::{RerankConfig, SelectorConfig};
pub use explain::{supporting_notes, MatchStrength, Recommendation, RecommendationStats, SupportingNotes};
pub use ratings::{NotePreference, Rating, RatingInput};
pub use rerank::{Reranker, ScoredItem};
pub use selector::{emotion_scores, SelectedItem, Stage1Selection, Stage1Selector};
