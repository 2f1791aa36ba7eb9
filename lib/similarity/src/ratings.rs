//! Note preference ratings
//!
//! Callers collect a 1–5 rating for each surfaced note. Input is forgiving:
//! out-of-range integers are clamped and anything that is not an integer
//! falls back to the neutral rating.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::num::IntErrorKind;
use whiff_core::context::normalize_category;

/// A note rating in `[1, 5]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(5);
    pub const NEUTRAL: Rating = Rating(3);

    /// Clamp any integer into `[1, 5]`
    pub fn clamped(value: i64) -> Self {
        Rating(value.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating::NEUTRAL
    }
}

/// A rating as submitted by the caller, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Integer(i64),
    Text(String),
    Other(serde_json::Value),
}

impl RatingInput {
    /// Resolve to a rating: clamp integers, parse integer strings, default the rest
    pub fn resolve(&self) -> Rating {
        match self {
            RatingInput::Integer(v) => Rating::clamped(*v),
            RatingInput::Text(s) => match s.trim().parse::<i64>() {
                Ok(v) => Rating::clamped(v),
                Err(e) => match e.kind() {
                    IntErrorKind::PosOverflow => Rating::MAX,
                    IntErrorKind::NegOverflow => Rating::MIN,
                    _ => Rating::NEUTRAL,
                },
            },
            // integers too large for i64
            RatingInput::Other(v) if v.is_u64() => Rating::MAX,
            RatingInput::Other(_) => Rating::NEUTRAL,
        }
    }
}

impl From<i64> for RatingInput {
    fn from(v: i64) -> Self {
        RatingInput::Integer(v)
    }
}

impl From<&str> for RatingInput {
    fn from(s: &str) -> Self {
        RatingInput::Text(s.to_string())
    }
}

/// Resolved ratings keyed by note term
///
/// Backed by a `BTreeMap` so iteration order, and with it every float sum
/// over the ratings, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePreference {
    ratings: BTreeMap<String, Rating>,
}

impl NotePreference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a preference from caller answers for the surfaced notes
    ///
    /// An empty answer map means elicitation was skipped and yields an empty
    /// preference. Otherwise every surfaced note gets a rating: the resolved
    /// answer when one was given, [`Rating::NEUTRAL`] when not. Answers for
    /// notes that were not surfaced are ignored.
    pub fn from_answers(surfaced: &[String], answers: &HashMap<String, RatingInput>) -> Self {
        let mut preference = Self::new();
        if answers.is_empty() {
            return preference;
        }

        let normalized: AHashMap<String, &RatingInput> = answers
            .iter()
            .map(|(term, input)| (normalize_category(term), input))
            .collect();

        for term in surfaced {
            let rating = normalized
                .get(term.as_str())
                .map_or(Rating::NEUTRAL, |input| input.resolve());
            preference.insert(term.clone(), rating);
        }

        let ignored = normalized
            .keys()
            .filter(|term| !surfaced.contains(term))
            .count();
        if ignored > 0 {
            tracing::debug!(ignored, "ratings for notes that were not surfaced were ignored");
        }
        preference
    }

    pub fn insert(&mut self, term: impl Into<String>, rating: Rating) {
        self.ratings.insert(term.into(), rating);
    }

    pub fn get(&self, term: &str) -> Option<Rating> {
        self.ratings.get(term).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rating)> {
        self.ratings.iter().map(|(term, rating)| (term.as_str(), *rating))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
