use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer `a = σ(x · W + b)`.
///
/// `feed_from` caches the input and pre-activation of the most recent frame
/// so `backprop` can be called right after it. The caches are not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
    #[serde(skip)]
    input: Vec<f64>,
    #[serde(skip)]
    pre_neurons: Vec<f64>,
}

/// Gradient accumulator shaped like one `Layer`.
#[derive(Debug, Clone)]
pub struct LayerGrads {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl LayerGrads {
    pub fn zeros_like(layer: &Layer) -> LayerGrads {
        LayerGrads {
            weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            biases: vec![0.0; layer.biases.len()],
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights.scale(factor);
        self.biases.iter_mut().for_each(|b| *b *= factor);
    }

    pub fn sum_squares(&self) -> f64 {
        self.weights.sum_squares() + self.biases.iter().map(|b| b * b).sum::<f64>()
    }
}

impl Layer {
    pub fn new<R: Rng>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        gain: f64,
        rng: &mut R,
    ) -> Layer {
        Layer {
            size,
            weights: Matrix::xavier(input_size, size, gain, rng),
            biases: vec![0.0; size],
            activator: activation,
            input: Vec::new(),
            pre_neurons: Vec::new(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    fn pre_activation(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.left_mul(input);
        for (zi, b) in z.iter_mut().zip(&self.biases) {
            *zi += b;
        }
        z
    }

    /// Forward pass that keeps what `backprop` needs.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let z = self.pre_activation(input);
        let a = z.iter().map(|&x| self.activator.function(x)).collect();
        self.input = input.to_vec();
        self.pre_neurons = z;
        a
    }

    /// Forward pass without touching the caches (evaluation).
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.pre_activation(input)
            .into_iter()
            .map(|x| self.activator.function(x))
            .collect()
    }

    /// Accumulates this layer's gradients for the last `feed_from` frame and
    /// returns ∂L/∂input.
    ///
    /// `delta` is ∂L/∂a for this layer (error in activation space).
    pub fn backprop(&self, delta: &[f64], grads: &mut LayerGrads) -> Vec<f64> {
        // δ = error ⊙ σ'(z)
        let layer_delta: Vec<f64> = delta.iter()
            .zip(&self.pre_neurons)
            .map(|(d, &z)| d * self.activator.derivative(z))
            .collect();

        grads.weights.add_outer(&self.input, &layer_delta);
        for (g, d) in grads.biases.iter_mut().zip(&layer_delta) {
            *g += d;
        }

        self.weights.left_mul_transposed(&layer_delta)
    }

    /// Copy with every weight and bias passed through `f`.
    pub fn map_params<F>(&self, f: F) -> Layer
    where
        F: Fn(f64) -> f64,
    {
        Layer {
            size: self.size,
            weights: self.weights.map(&f),
            biases: self.biases.iter().map(|&b| f(b)).collect(),
            activator: self.activator,
            input: Vec::new(),
            pre_neurons: Vec::new(),
        }
    }

    pub fn max_abs_param(&self) -> f64 {
        self.biases.iter().fold(self.weights.max_abs(), |m, b| m.max(b.abs()))
    }
}
