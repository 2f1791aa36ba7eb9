//! # Whiff Classifier
//!
//! Maps an encoded user context to a probability distribution over the
//! emotion clusters.
//!
//! ## Features
//!
//! - **Feedforward network**: two ReLU blocks of width 128 with dropout 0.3, softmax output, on `ndarray`
//! - **Class-weighted training**: inverse-frequency weights counter label imbalance
//! - **Reproducible**: one seeded RNG for split, init, shuffling and dropout
//! - **Evaluation**: per-class precision/recall/F1 plus macro and weighted averages
//!
//! ## Example
//!
//! ```rust
//! use whiff_classifier::{Trainer, TrainingConfig};
//! use whiff_core::Vector;
//!
//! let x: Vec<Vector> = (0..20)
//!     .map(|i| Vector::new(if i % 2 == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] }))
//!     .collect();
//! let y: Vec<usize> = (0..20).map(|i| i % 2).collect();
//!
//! let config = TrainingConfig { num_classes: 2, hidden_units: 8, epochs: 2, ..Default::default() };
//! let (model, report) = Trainer::new(config).unwrap().fit(&x, &y).unwrap();
//!
//! let probs = model.predict_proba(&x[0]).unwrap();
//! assert!(probs.is_valid());
//! println!("{}", report.evaluation);
//! ```

pub mod metrics;
pub mod network;
pub mod train;

pub use metrics::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use network::{DenseLayer, EmotionClassifier};
pub use train::{balanced_class_weights, train_validation_split, EpochStats, Trainer, TrainingConfig, TrainingReport};
