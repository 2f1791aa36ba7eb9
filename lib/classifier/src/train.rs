//! Offline training for the emotion classifier
//!
//! Mini-batch Adam over a class-weighted cross-entropy loss, computed a whole
//! batch at a time as `ndarray` matrix products. A single
//! seeded RNG drives the train/validation split, weight initialization,
//! shuffling and dropout masks, so two runs with the same config and data
//! produce identical models.

use crate::metrics::ClassificationReport;
use crate::network::{DenseLayer, EmotionClassifier};
use ndarray::{Array, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use whiff_core::{EmotionProbabilities, Error, Result, Vector};

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_classes: usize,
    pub hidden_units: usize,
    pub hidden_layers: usize,
    pub dropout: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Fraction of rows held out for evaluation
    pub validation_split: f32,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_classes: 6,
            hidden_units: 128,
            hidden_layers: 2,
            dropout: 0.3,
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if self.num_classes < 2 {
            return invalid("num_classes must be at least 2");
        }
        if self.hidden_layers > 0 && self.hidden_units == 0 {
            return invalid("hidden_units must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return invalid("epochs and batch_size must be positive");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate must be positive");
        }
        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return invalid("beta1 and beta2 must be in [0, 1)");
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return invalid("validation_split must be in [0, 1)");
        }
        Ok(())
    }
}

/// Loss and validation accuracy after one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    /// Mean class-weighted cross-entropy over the training rows
    pub loss: f32,
    pub validation_accuracy: f32,
}

/// Everything the training run measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub validation_size: usize,
    pub class_weights: Vec<f32>,
    pub epochs: Vec<EpochStats>,
    pub evaluation: ClassificationReport,
}

/// Balanced class weights: `n_samples / (n_present_classes * count[c])`
///
/// Classes absent from `labels` get weight 1.0; they never contribute to
/// the loss anyway.
pub fn balanced_class_weights(labels: &[usize], num_classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; num_classes];
    for &label in labels {
        if label < num_classes {
            counts[label] += 1;
        }
    }
    let present = counts.iter().filter(|&&c| c > 0).count();
    let total: usize = counts.iter().sum();
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                1.0
            } else {
                total as f32 / (present * count) as f32
            }
        })
        .collect()
}

/// Shuffle row indices and cut off `ceil(n * fraction)` of them for validation
///
/// At least one row always stays in the training part.
pub fn train_validation_split<R: Rng>(n: usize, fraction: f32, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    // tolerate float error in n * fraction (10 * 0.2 must stay 2)
    let wanted = (n as f32 * fraction - 1e-4).ceil().max(0.0) as usize;
    let validation_len = wanted.min(n.saturating_sub(1));
    let train = indices.split_off(validation_len);
    (train, indices)
}

/// Adam moment estimates, shaped like the network
struct Adam {
    first: Vec<DenseLayer>,
    second: Vec<DenseLayer>,
    step: i32,
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
}

impl Adam {
    fn new(model: &EmotionClassifier, config: &TrainingConfig) -> Self {
        Self {
            first: model.layers.iter().map(DenseLayer::zeros_like).collect(),
            second: model.layers.iter().map(DenseLayer::zeros_like).collect(),
            step: 0,
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
        }
    }

    fn apply(&mut self, model: &mut EmotionClassifier, grads: &[DenseLayer]) {
        self.step += 1;
        let step = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1.powi(self.step),
            correction2: 1.0 - self.beta2.powi(self.step),
        };
        for ((layer, grad), (m, v)) in model
            .layers
            .iter_mut()
            .zip(grads)
            .zip(self.first.iter_mut().zip(self.second.iter_mut()))
        {
            step.update(&mut layer.weights, &grad.weights, &mut m.weights, &mut v.weights);
            step.update(&mut layer.bias, &grad.bias, &mut m.bias, &mut v.bias);
        }
    }
}

struct AdamStep {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    correction1: f32,
    correction2: f32,
}

impl AdamStep {
    fn update<D: Dimension>(
        &self,
        params: &mut Array<f32, D>,
        grad: &Array<f32, D>,
        m: &mut Array<f32, D>,
        v: &mut Array<f32, D>,
    ) {
        Zip::from(params)
            .and(grad)
            .and(m)
            .and(v)
            .for_each(|p, &g, m, v| {
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                let m_hat = *m / self.correction1;
                let v_hat = *v / self.correction2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            });
    }
}

/// Trains [`EmotionClassifier`]s
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit a classifier on encoded contexts `x` with cluster labels `y`
    pub fn fit(&self, x: &[Vector], y: &[usize]) -> Result<(EmotionClassifier, TrainingReport)> {
        let config = &self.config;
        if x.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(Error::InvalidDimension {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let input_dim = x[0].dim();
        if let Some(bad) = x.iter().find(|row| row.dim() != input_dim) {
            return Err(Error::InvalidDimension {
                expected: input_dim,
                actual: bad.dim(),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= config.num_classes) {
            return Err(Error::InvalidLabel {
                label,
                num_classes: config.num_classes,
            });
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let (train_idx, mut validation_idx) =
            train_validation_split(x.len(), config.validation_split, &mut rng);
        if validation_idx.is_empty() {
            tracing::warn!(
                rows = x.len(),
                "no rows left for validation; evaluating on the training rows"
            );
            validation_idx = train_idx.clone();
        }

        let train_labels: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
        let class_weights = balanced_class_weights(&train_labels, config.num_classes);
        tracing::debug!(?class_weights, "balanced class weights");

        let mut model = EmotionClassifier::new(
            input_dim,
            config.hidden_units,
            config.hidden_layers,
            config.num_classes,
            config.dropout,
            &mut rng,
        );
        let mut adam = Adam::new(&model, config);
        let mut order = train_idx.clone();
        let mut epochs = Vec::with_capacity(config.epochs);

        for epoch in 1..=config.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0f32;

            for batch in order.chunks(config.batch_size) {
                let inputs = Array2::from_shape_fn((batch.len(), input_dim), |(r, c)| x[batch[r]][c]);
                let labels: Vec<usize> = batch.iter().map(|&i| y[i]).collect();
                let (batch_loss, grads) =
                    batch_gradients(&model, inputs, &labels, &class_weights, config.dropout, &mut rng);
                total_loss += batch_loss;
                adam.apply(&mut model, &grads);
            }

            let loss = total_loss / order.len() as f32;
            let validation_accuracy = accuracy(&model, x, y, &validation_idx)?;
            tracing::info!(epoch, loss, validation_accuracy, "epoch finished");
            epochs.push(EpochStats {
                epoch,
                loss,
                validation_accuracy,
            });
        }

        let y_true: Vec<usize> = validation_idx.iter().map(|&i| y[i]).collect();
        let y_pred = validation_idx
            .iter()
            .map(|&i| model.predict(&x[i]))
            .collect::<Result<Vec<_>>>()?;
        let evaluation = ClassificationReport::compute(&y_true, &y_pred);
        tracing::info!(
            macro_f1 = evaluation.macro_f1(),
            weighted_f1 = evaluation.weighted_f1(),
            "training finished"
        );

        let report = TrainingReport {
            train_size: train_idx.len(),
            validation_size: validation_idx.len(),
            class_weights,
            epochs,
            evaluation,
        };
        Ok((model, report))
    }
}

fn accuracy(model: &EmotionClassifier, x: &[Vector], y: &[usize], rows: &[usize]) -> Result<f32> {
    if rows.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0;
    for &i in rows {
        if model.predict(&x[i])? == y[i] {
            correct += 1;
        }
    }
    Ok(correct as f32 / rows.len() as f32)
}

/// Forward a batch with dropout and backpropagate the weighted cross-entropy
///
/// Returns the summed loss of the batch and per-layer gradients of the mean
/// loss. Each row of `inputs` is one sample; `labels` holds their classes.
fn batch_gradients<R: Rng>(
    model: &EmotionClassifier,
    inputs: Array2<f32>,
    labels: &[usize],
    class_weights: &[f32],
    dropout: f32,
    rng: &mut R,
) -> (f32, Vec<DenseLayer>) {
    let n_layers = model.layers.len();
    let keep = 1.0 - dropout;

    // activations[l] is the input of layer l; masks[l] is d(activation)/d(z) of hidden layer l
    let mut activations: Vec<Array2<f32>> = Vec::with_capacity(n_layers);
    let mut masks: Vec<Array2<f32>> = Vec::with_capacity(n_layers.saturating_sub(1));
    activations.push(inputs);
    let mut logits = Array2::zeros((0, 0));

    for (l, layer) in model.layers.iter().enumerate() {
        let z = layer.forward_batch(activations[l].view());
        if l + 1 == n_layers {
            logits = z;
            break;
        }
        let mask = z.mapv(|zj| {
            let dropped = dropout > 0.0 && rng.random::<f32>() < dropout;
            match (zj > 0.0, dropped) {
                (true, false) => 1.0 / keep,
                _ => 0.0,
            }
        });
        activations.push(&z * &mask);
        masks.push(mask);
    }

    let scale = 1.0 / labels.len() as f32;
    let mut loss = 0.0f32;
    let mut delta = Array2::<f32>::zeros(logits.raw_dim());
    for ((row, mut out), &label) in logits.rows().into_iter().zip(delta.rows_mut()).zip(labels) {
        let weight = class_weights[label];
        let probs = EmotionProbabilities::from_logits(&row.to_vec());
        loss -= weight * probs.get(label).unwrap_or(0.0).max(1e-7).ln();
        for (k, (d, &p)) in out.iter_mut().zip(probs.as_slice()).enumerate() {
            let target = if k == label { 1.0 } else { 0.0 };
            *d = weight * scale * (p - target);
        }
    }

    let mut grads: Vec<DenseLayer> = Vec::with_capacity(n_layers);
    for l in (0..n_layers).rev() {
        let layer = &model.layers[l];
        grads.push(DenseLayer {
            weights: delta.t().dot(&activations[l]),
            bias: delta.sum_axis(Axis(0)),
        });
        if l > 0 {
            delta = delta.dot(&layer.weights) * &masks[l - 1];
        }
    }
    grads.reverse();

    (loss, grads)
}
