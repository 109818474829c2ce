use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::config::RunConfig;

/// Shape of a mask network, stored with every checkpoint so a restore can
/// refuse weights that do not fit the requested run.
///
/// - `n_features`: bins per frame; both the input and the mask width
/// - `n_layers`: hidden layers between input and mask
/// - `state_size`: width of each hidden layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskNetSpec {
    pub n_features: usize,
    pub n_layers: usize,
    pub state_size: usize,
}

impl MaskNetSpec {
    pub fn from_config(config: &RunConfig) -> MaskNetSpec {
        MaskNetSpec {
            n_features: config.n_features,
            n_layers: config.n_layers,
            state_size: config.state_size,
        }
    }

    /// `(size, input_size, activation)` per layer, input to output.
    pub fn layer_shapes(&self) -> Vec<(usize, usize, ActivationFunction)> {
        let mut shapes = Vec::with_capacity(self.n_layers + 1);
        let mut input_size = self.n_features;
        for _ in 0..self.n_layers {
            shapes.push((self.state_size, input_size, ActivationFunction::ReLU));
            input_size = self.state_size;
        }
        shapes.push((self.n_features, input_size, ActivationFunction::Sigmoid));
        shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_shapes_chain_hidden_layers_into_mask() {
        let spec = MaskNetSpec { n_features: 5, n_layers: 2, state_size: 7 };
        let shapes = spec.layer_shapes();

        assert_eq!(shapes.len(), 3);
        assert_eq!((shapes[0].0, shapes[0].1), (7, 5));
        assert_eq!((shapes[1].0, shapes[1].1), (7, 7));
        assert_eq!((shapes[2].0, shapes[2].1), (5, 7));
        assert_eq!(shapes[2].2, ActivationFunction::Sigmoid);
    }
}
