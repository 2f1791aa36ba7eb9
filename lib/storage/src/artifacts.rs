//! Fitted artifact bundle
//!
//! The vectorizer, encoder and classifier are fitted together offline and
//! shared read-only by every request afterwards.

use crate::dataset::TrainingRecord;
use serde::{Deserialize, Serialize};
use whiff_classifier::{EmotionClassifier, Trainer, TrainingConfig, TrainingReport};
use whiff_core::{
    ContextEncoder, EmotionProbabilities, Error, NoteVectorizer, Result, UserContext, Vector,
};

/// Bumped whenever the serialized layout of [`Artifacts`] changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub format_version: u32,
    pub vectorizer: NoteVectorizer,
    pub encoder: ContextEncoder,
    pub classifier: EmotionClassifier,
}

impl Artifacts {
    pub fn new(vectorizer: NoteVectorizer, encoder: ContextEncoder, classifier: EmotionClassifier) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            vectorizer,
            encoder,
            classifier,
        }
    }

    /// Fit all three components on a labelled dataset
    ///
    /// The vocabulary comes from the record notes, the encoder categories
    /// from the record contexts, and the classifier is trained on the
    /// encoded contexts against `emotion_cluster`.
    pub fn fit(records: &[TrainingRecord], config: &TrainingConfig) -> Result<(Self, TrainingReport)> {
        if records.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        let trainer = Trainer::new(config.clone())?;

        let vectorizer = NoteVectorizer::fit(records.iter().map(|r| r.notes.as_slice()));
        let encoder = ContextEncoder::fit_contexts(records.iter().map(|r| &r.context))?;
        tracing::info!(
            vocabulary = vectorizer.dim(),
            context_dim = encoder.dim(),
            rows = records.len(),
            "fitted feature transforms"
        );

        let x = records
            .iter()
            .map(|r| encoder.transform(&r.context))
            .collect::<Result<Vec<Vector>>>()?;
        let y: Vec<usize> = records.iter().map(|r| r.emotion_cluster).collect();

        let (classifier, report) = trainer.fit(&x, &y)?;
        tracing::info!(
            macro_f1 = report.evaluation.macro_f1(),
            weighted_f1 = report.evaluation.weighted_f1(),
            "trained emotion classifier"
        );

        Ok((Self::new(vectorizer, encoder, classifier), report))
    }

    /// Check that the components fit together
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        self.classifier.validate()?;
        if self.encoder.dim() != self.classifier.input_dim() {
            return Err(Error::InvalidDimension {
                expected: self.classifier.input_dim(),
                actual: self.encoder.dim(),
            });
        }
        Ok(())
    }

    /// Emotion distribution for a user context
    pub fn predict(&self, context: &UserContext) -> Result<EmotionProbabilities> {
        let encoded = self.encoder.transform(context)?;
        self.classifier.predict_proba(&encoded)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use whiff_core::ItemId;

    pub(crate) fn records() -> Vec<TrainingRecord> {
        let rows = [
            ("rose, vanilla", "female", "spring", "day", "romantic", 0),
            ("rose, jasmine", "female", "summer", "day", "romantic", 0),
            ("oud, smoke", "male", "winter", "night", "bold", 1),
            ("oud, leather", "male", "autumn", "night", "bold", 1),
            ("citrus, bergamot", "unisex", "summer", "day", "fresh", 2),
            ("citrus, neroli", "unisex", "spring", "day", "fresh", 2),
        ];
        rows.iter()
            .cycle()
            .take(24)
            .enumerate()
            .map(|(i, (notes, gender, season, time, impression, cluster))| TrainingRecord {
                id: Some(ItemId::Integer(i as u64)),
                name: format!("item {}", i),
                brand: String::new(),
                notes: whiff_core::catalog::split_notes(notes),
                context: UserContext::new(*gender, *season, *time, *impression, "daily", "mild"),
                emotion_cluster: *cluster,
            })
            .collect()
    }

    pub(crate) fn small_config() -> TrainingConfig {
        TrainingConfig {
            hidden_units: 8,
            epochs: 3,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_fit_produces_consistent_bundle() {
        let (artifacts, report) = Artifacts::fit(&records(), &small_config()).unwrap();
        assert!(artifacts.validate().is_ok());
        assert_eq!(artifacts.format_version, FORMAT_VERSION);
        assert_eq!(artifacts.vectorizer.dim(), 9);
        assert_eq!(artifacts.classifier.num_classes(), 6);
        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.train_size + report.validation_size, 24);
    }

    #[test]
    fn test_predict_returns_distribution() {
        let (artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        let ctx = UserContext::new("Male", "Winter", "Night", "Bold", "daily", "mild");
        let probs = artifacts.predict(&ctx).unwrap();
        assert_eq!(probs.num_classes(), 6);
        assert!(probs.is_valid());
    }

    #[test]
    fn test_predict_rejects_incomplete_context() {
        let (artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        let ctx = UserContext {
            gender: Some("male".to_string()),
            ..UserContext::default()
        };
        assert!(matches!(artifacts.predict(&ctx), Err(Error::InvalidContext(_))));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (a, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        let (b, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        assert!(matches!(
            Artifacts::fit(&[], &small_config()),
            Err(Error::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_validate_detects_width_mismatch() {
        let (mut artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        let other: Vec<TrainingRecord> = records()
            .into_iter()
            .map(|mut r| {
                r.context.weather = Some(format!("{}-x", r.name));
                r
            })
            .collect();
        artifacts.encoder = ContextEncoder::fit_contexts(other.iter().map(|r| &r.context)).unwrap();
        assert!(matches!(artifacts.validate(), Err(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_validate_detects_broken_layer_chain() {
        let (artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        let first = artifacts.classifier.layers()[0].clone();
        // 14 one-hot inputs -> 8 units, twice: the second layer cannot take 8 inputs
        assert_eq!(first.input_dim(), 14);
        let layers = vec![first.clone(), first];
        let broken: EmotionClassifier = serde_json::from_value(serde_json::json!({
            "layers": serde_json::to_value(&layers).unwrap(),
            "dropout": 0.3
        }))
        .unwrap();
        let bundle = Artifacts::new(artifacts.vectorizer, artifacts.encoder, broken);
        assert!(matches!(bundle.validate(), Err(Error::InvalidDimension { .. })));
    }
}
