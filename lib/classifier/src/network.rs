//! Feedforward emotion classifier
//!
//! `input -> [Dense(relu) -> Dropout] x hidden_layers -> Dense -> softmax`.
//! Dropout is only applied while training; inference is deterministic.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use whiff_core::{EmotionProbabilities, Error, Result, Vector};

/// Fully connected layer with weights shaped `(output, input)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub(crate) weights: Array2<f32>,
    pub(crate) bias: Array1<f32>,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero bias
    pub fn glorot_uniform<R: Rng>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (input_dim + output_dim).max(1) as f32).sqrt();
        Self {
            weights: Array2::from_shape_fn((output_dim, input_dim), |_| rng.random_range(-limit..limit)),
            bias: Array1::zeros(output_dim),
        }
    }

    /// Build a layer from explicit weights, rejecting a bias of the wrong length
    pub fn from_parts(weights: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weights.nrows() != bias.len() {
            return Err(Error::InvalidDimension {
                expected: weights.nrows(),
                actual: bias.len(),
            });
        }
        Ok(Self { weights, bias })
    }

    /// A layer of the same shape filled with zeros
    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            weights: Array2::zeros(self.weights.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Pre-activation output `W x + b`
    pub fn forward(&self, input: ArrayView1<f32>) -> Array1<f32> {
        self.weights.dot(&input) + &self.bias
    }

    /// Pre-activation output for a batch of row vectors, shaped `(rows, output)`
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights.t()) + &self.bias
    }
}

/// Trained emotion classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionClassifier {
    pub(crate) layers: Vec<DenseLayer>,
    /// Dropout rate used during training; recorded for reference only
    pub(crate) dropout: f32,
}

impl EmotionClassifier {
    /// Freshly initialized network
    pub fn new<R: Rng>(
        input_dim: usize,
        hidden_units: usize,
        hidden_layers: usize,
        num_classes: usize,
        dropout: f32,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden_layers + 1);
        let mut width = input_dim;
        for _ in 0..hidden_layers {
            layers.push(DenseLayer::glorot_uniform(width, hidden_units, rng));
            width = hidden_units;
        }
        layers.push(DenseLayer::glorot_uniform(width, num_classes, rng));
        Self { layers, dropout }
    }

    /// Assemble a classifier from already trained layers
    ///
    /// Adjacent layers must agree on their widths.
    pub fn from_layers(layers: Vec<DenseLayer>, dropout: f32) -> Result<Self> {
        let model = Self { layers, dropout };
        model.validate()?;
        Ok(model)
    }

    /// Check layer shapes; a deserialized model may not have been built by [`Self::new`]
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig("classifier needs at least one layer".to_string()));
        }
        for layer in &self.layers {
            if layer.weights.nrows() != layer.bias.len() {
                return Err(Error::InvalidDimension {
                    expected: layer.weights.nrows(),
                    actual: layer.bias.len(),
                });
            }
        }
        for pair in self.layers.windows(2) {
            if pair[0].output_dim() != pair[1].input_dim() {
                return Err(Error::InvalidDimension {
                    expected: pair[0].output_dim(),
                    actual: pair[1].input_dim(),
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_dim)
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_dim)
    }

    #[inline]
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    #[inline]
    pub fn dropout(&self) -> f32 {
        self.dropout
    }

    /// Raw output scores before softmax
    pub fn logits(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.validate()?;
        if input.len() != self.input_dim() {
            return Err(Error::InvalidDimension {
                expected: self.input_dim(),
                actual: input.len(),
            });
        }
        let last = self.layers.len() - 1;
        let mut activation = input.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(activation.view());
            if i < last {
                activation.mapv_inplace(|x| x.max(0.0));
            }
        }
        Ok(activation)
    }

    /// Probability distribution over emotion clusters
    pub fn predict_proba(&self, input: &Vector) -> Result<EmotionProbabilities> {
        let logits = self.logits(ArrayView1::from(input.as_slice()))?;
        Ok(EmotionProbabilities::from_logits(&logits.to_vec()))
    }

    /// Most likely cluster
    pub fn predict(&self, input: &Vector) -> Result<usize> {
        let probs = self.predict_proba(input)?;
        Ok(probs.argmax().unwrap_or(0))
    }
}
