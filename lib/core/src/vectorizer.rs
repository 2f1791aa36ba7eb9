//! Note vectorizer
//!
//! Bag-of-notes count vectors over a vocabulary learned at fit time.
//! A note string is split on commas; each piece is trimmed and lowercased,
//! and pieces that are empty or at least [`MAX_NOTE_CHARS`] characters long
//! are dropped as malformed free text.

use crate::catalog::CatalogItem;
use crate::vector::Vector;
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Notes this long (in characters) or longer are discarded
pub const MAX_NOTE_CHARS: usize = 40;

/// Split note entries into normalized note terms
///
/// Entries may themselves contain commas, so `["rose, vanilla"]` and
/// `["rose", "vanilla"]` tokenize identically.
pub fn tokenize_notes<S: AsRef<str>>(notes: &[S]) -> Vec<String> {
    notes
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(|piece| piece.trim().to_lowercase())
        .filter(|term| !term.is_empty() && term.chars().count() < MAX_NOTE_CHARS)
        .collect()
}

/// Count vectorizer over note terms
///
/// The vocabulary is sorted, so a term's index is stable across runs and
/// across save/load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "VocabularyState", into = "VocabularyState")]
pub struct NoteVectorizer {
    vocabulary: Vec<String>,
    index: AHashMap<String, usize>,
}

impl PartialEq for NoteVectorizer {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary
    }
}

#[derive(Serialize, Deserialize)]
struct VocabularyState {
    vocabulary: Vec<String>,
}

impl From<VocabularyState> for NoteVectorizer {
    fn from(state: VocabularyState) -> Self {
        Self::from_vocabulary(state.vocabulary)
    }
}

impl From<NoteVectorizer> for VocabularyState {
    fn from(vectorizer: NoteVectorizer) -> Self {
        Self {
            vocabulary: vectorizer.vocabulary,
        }
    }
}

impl NoteVectorizer {
    /// Learn the vocabulary from a corpus of per-item note lists
    pub fn fit<I, S>(corpus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[String]>,
    {
        let terms: BTreeSet<String> = corpus
            .into_iter()
            .flat_map(|notes| tokenize_notes(notes.as_ref()))
            .collect();
        Self::from_vocabulary(terms.into_iter().collect())
    }

    /// Learn the vocabulary from catalog items
    pub fn fit_items(items: &[CatalogItem]) -> Self {
        Self::fit(items.iter().map(|item| item.notes.as_slice()))
    }

    /// Build a vectorizer from an explicit vocabulary
    ///
    /// The vocabulary is sorted and deduplicated.
    pub fn from_vocabulary(mut vocabulary: Vec<String>) -> Self {
        vocabulary.sort();
        vocabulary.dedup();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self { vocabulary, index }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    #[inline]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[inline]
    pub fn term(&self, index: usize) -> Option<&str> {
        self.vocabulary.get(index).map(String::as_str)
    }

    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Count vocabulary terms in a note list; unseen terms are ignored
    pub fn transform<S: AsRef<str>>(&self, notes: &[S]) -> Vector {
        let mut counts = Vector::zeros(self.dim());
        let slots = counts.as_mut_slice();
        for term in tokenize_notes(notes) {
            if let Some(&i) = self.index.get(&term) {
                slots[i] += 1.0;
            }
        }
        counts
    }

    /// Vectorize a comma-separated note string
    pub fn transform_str(&self, notes: &str) -> Vector {
        self.transform(&[notes])
    }

    #[inline]
    pub fn transform_item(&self, item: &CatalogItem) -> Vector {
        self.transform(&item.notes)
    }

    /// Vectorize a whole catalog, preserving item order
    ///
    /// Items whose notes are empty or entirely filtered out get an all-zero
    /// vector; they still take part in scoring.
    pub fn transform_catalog(&self, items: &[CatalogItem]) -> Vec<Vector> {
        let vectors: Vec<Vector> = items
            .par_iter()
            .map(|item| self.transform_item(item))
            .collect();

        let empty = vectors.iter().filter(|v| v.count_nonzero() == 0).count();
        if empty > 0 {
            tracing::warn!(
                items = empty,
                "catalog items without any recognized note; they score with a zero note vector"
            );
        }
        vectors
    }
}
