//! # Whiff API
//!
//! The recommendation service callers talk to. A [`Recommender`] wraps the
//! fitted artifacts behind an `Arc` and exposes the two-call contract:
//!
//! ```text
//! context ──> score_stage1 ──> { probabilities, selected, surfaced_notes }
//!                                                         │
//!                                         caller collects note ratings
//!                                                         │
//! ratings ──> score_stage2 ──> ranked recommendations with explanations
//! ```
//!
//! A single `Recommender` can be shared across threads; every call is
//! independent.

pub mod recommender;

pub use recommender::{Recommender, RecommenderConfig, Stage1Result, Stage2Result};
