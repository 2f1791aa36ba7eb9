//! # Whiff Storage
//!
//! Loading and saving of everything the recommender reads from disk:
//!
//! - [`Artifacts`] - the fitted vectorizer, encoder and classifier
//! - [`ArtifactStore`] - bincode persistence with atomic replacement
//! - [`TrainingRecord`] and JSON loaders for datasets and catalogs

pub mod artifacts;
pub mod dataset;
pub mod store;

pub use artifacts::{Artifacts, FORMAT_VERSION};
pub use dataset::{catalog_from_records, load_catalog, load_json, load_training_records, TrainingRecord};
pub use store::ArtifactStore;
