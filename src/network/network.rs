use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::layers::dense::{Layer, LayerGrads};
use crate::network::spec::MaskNetSpec;

/// Frame-wise mask estimator: hidden ReLU layers followed by a sigmoid mask
/// the width of the input frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskNetwork {
    pub spec: MaskNetSpec,
    pub layers: Vec<Layer>,
}

impl MaskNetwork {
    pub fn new<R: Rng>(spec: MaskNetSpec, gain: f64, rng: &mut R) -> MaskNetwork {
        let layers = spec.layer_shapes()
            .into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, gain, rng))
            .collect();
        MaskNetwork { spec, layers }
    }

    /// Forward pass; stores activations in each layer for `backward`.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    /// Forward pass without caching.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Backpropagates ∂L/∂mask of the last `feed_from` frame into `grads`.
    pub fn backward(&self, mask_delta: &[f64], grads: &mut [LayerGrads]) {
        let mut delta = mask_delta.to_vec();
        for (layer, layer_grads) in self.layers.iter().zip(grads.iter_mut()).rev() {
            delta = layer.backprop(&delta, layer_grads);
        }
    }

    pub fn zero_grads(&self) -> Vec<LayerGrads> {
        self.layers.iter().map(LayerGrads::zeros_like).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small() -> MaskNetwork {
        let spec = MaskNetSpec { n_features: 4, n_layers: 1, state_size: 6 };
        MaskNetwork::new(spec, 1.0, &mut StdRng::seed_from_u64(2))
    }

    #[test]
    fn test_mask_is_bounded_and_matches_inference() {
        let mut net = small();
        let input = [0.3, 0.1, 0.9, 0.0];
        let mask = net.feed_from(&input);

        assert_eq!(mask.len(), 4);
        assert!(mask.iter().all(|m| (0.0..=1.0).contains(m)));
        assert_eq!(net.infer(&input), mask);
    }

    #[test]
    fn test_backward_fills_every_layer() {
        let mut net = small();
        let mut grads = net.zero_grads();
        net.feed_from(&[1.0, 1.0, 1.0, 1.0]);
        net.backward(&[1.0, 1.0, 1.0, 1.0], &mut grads);

        assert!(grads.last().unwrap().sum_squares() > 0.0);
        assert_eq!(grads.len(), net.layers.len());
    }
}
