use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::layers::dense::Layer;
use crate::network::network::MaskNetwork;
use crate::quant::quantizer::Quantizer;

/// Observed activation maxima of each hidden layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRanges {
    pub hidden_max: Vec<f64>,
}

impl ActivationRanges {
    /// Runs a random `perc` fraction of `frames` (at least one) through the
    /// network and records the largest absolute activation per hidden layer.
    pub fn calibrate<R: Rng>(
        network: &MaskNetwork,
        frames: &[&[f64]],
        perc: f64,
        rng: &mut R,
    ) -> ActivationRanges {
        let hidden = network.layers.len().saturating_sub(1);
        let mut hidden_max = vec![0.0_f64; hidden];
        if frames.is_empty() {
            return ActivationRanges { hidden_max };
        }

        let count = ((frames.len() as f64 * perc).ceil() as usize).clamp(1, frames.len());
        for frame in frames.choose_multiple(rng, count) {
            let mut current = frame.to_vec();
            for (i, layer) in network.layers[..hidden].iter().enumerate() {
                current = layer.forward(&current);
                let peak = current.iter().fold(0.0_f64, |m, a| m.max(a.abs()));
                hidden_max[i] = hidden_max[i].max(peak);
            }
        }
        ActivationRanges { hidden_max }
    }
}

/// A network whose weights are fake-quantized and whose hidden activations
/// are snapped to calibrated ranges. Used for quantization-aware evaluation.
#[derive(Debug, Clone)]
pub struct QuantizedNetwork {
    layers: Vec<Layer>,
    ranges: ActivationRanges,
    quantizer: Quantizer,
}

impl QuantizedNetwork {
    pub fn new(network: &MaskNetwork, ranges: ActivationRanges, quantizer: Quantizer) -> QuantizedNetwork {
        let layers = network.layers.iter()
            .map(|layer| {
                let max_abs = layer.max_abs_param();
                layer.map_params(|w| quantizer.symmetric(w, max_abs))
            })
            .collect();
        QuantizedNetwork { layers, ranges, quantizer }
    }

    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.forward(&current);
            // Hidden activations are ReLU outputs, so the unsigned grid covers them.
            if let Some(&max) = self.ranges.hidden_max.get(i) {
                current = current.iter().map(|&a| self.quantizer.unsigned(a, max)).collect();
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::MaskNetSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network() -> MaskNetwork {
        let spec = MaskNetSpec { n_features: 4, n_layers: 2, state_size: 8 };
        MaskNetwork::new(spec, 1.0, &mut StdRng::seed_from_u64(5))
    }

    fn frames() -> Vec<Vec<f64>> {
        (0..20).map(|i| vec![i as f64 / 20.0, 0.5, 1.0, 0.1]).collect()
    }

    #[test]
    fn test_calibration_covers_every_hidden_layer() {
        let net = network();
        let owned = frames();
        let views: Vec<&[f64]> = owned.iter().map(Vec::as_slice).collect();
        let ranges = ActivationRanges::calibrate(&net, &views, 0.1, &mut StdRng::seed_from_u64(0));

        assert_eq!(ranges.hidden_max.len(), 2);
        assert!(ranges.hidden_max.iter().all(|m| *m >= 0.0));
    }

    #[test]
    fn test_high_precision_quantization_tracks_full_precision() {
        let net = network();
        let owned = frames();
        let views: Vec<&[f64]> = owned.iter().map(Vec::as_slice).collect();
        let ranges = ActivationRanges::calibrate(&net, &views, 1.0, &mut StdRng::seed_from_u64(0));
        let quantized = QuantizedNetwork::new(&net, ranges, Quantizer::new(16));

        let exact = net.infer(&owned[3]);
        let approx = quantized.infer(&owned[3]);
        for (a, b) in exact.iter().zip(&approx) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }
}
