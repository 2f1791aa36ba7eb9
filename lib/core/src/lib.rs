//! # Whiff Core
//!
//! Core library for the Whiff perfume recommender.
//!
//! This crate provides the data model and the fitted feature transforms:
//!
//! - [`CatalogItem`] - A perfume with its notes and offline emotion cluster
//! - [`UserContext`] - The six categorical answers describing a user
//! - [`NoteVectorizer`] - Count vectors over a learned note vocabulary
//! - [`ContextEncoder`] - One-hot encoding of user contexts
//! - [`EmotionProbabilities`] - Per-cluster distribution predicted for a context
//! - [`Vector`] - Dense vector with cosine similarity
//!
//! ## Example
//!
//! ```rust
//! use whiff_core::{CatalogItem, NoteVectorizer};
//!
//! let catalog = vec![
//!     CatalogItem::new(1, "rose, vanilla", 0),
//!     CatalogItem::new(2, "oud, smoke", 1),
//! ];
//! let vectorizer = NoteVectorizer::fit_items(&catalog);
//! let vectors = vectorizer.transform_catalog(&catalog);
//!
//! assert_eq!(vectorizer.vocabulary(), &["oud", "rose", "smoke", "vanilla"]);
//! assert_eq!(vectors[0].cosine_similarity(&vectors[1]), 0.0);
//! ```

pub mod catalog;
pub mod context;
pub mod encoder;
pub mod error;
pub mod probabilities;
pub mod vector;
pub mod vectorizer;

pub use catalog::{CatalogItem, ItemId};
pub use context::{ContextField, UserContext, CONTEXT_FIELDS};
pub use encoder::ContextEncoder;
pub use error::{Error, Result};
pub use probabilities::{EmotionProbabilities, PROBABILITY_TOLERANCE};
pub use vector::Vector;
pub use vectorizer::{tokenize_notes, NoteVectorizer, MAX_NOTE_CHARS};
