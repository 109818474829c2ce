use crate::{math::matrix::Matrix, layers::dense::{Layer, LayerGrads}};

const EPSILON: f64 = 1e-8;

/// First and second moment estimates for one layer.
#[derive(Debug, Clone)]
struct Moments {
    m: LayerGrads,
    v: LayerGrads,
}

/// Adam optimizer with bias-corrected moment estimates.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    step: i32,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, layers: &[Layer]) -> Adam {
        let moments = layers.iter()
            .map(|layer| Moments {
                m: LayerGrads::zeros_like(layer),
                v: LayerGrads::zeros_like(layer),
            })
            .collect();
        Adam { learning_rate, beta1, beta2, step: 0, moments }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Applies one update to every layer given its averaged gradients.
    pub fn step(&mut self, layers: &mut [Layer], grads: &[LayerGrads]) {
        self.step += 1;
        let bias1 = 1.0 - self.beta1.powi(self.step);
        let bias2 = 1.0 - self.beta2.powi(self.step);
        let (b1, b2, lr) = (self.beta1, self.beta2, self.learning_rate);

        let update = |param: &mut f64, g: f64, m: &mut f64, v: &mut f64| {
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *param -= lr * m_hat / (v_hat.sqrt() + EPSILON);
        };

        for ((layer, g), moments) in layers.iter_mut().zip(grads).zip(self.moments.iter_mut()) {
            for_each_entry(&mut layer.weights, &g.weights, &mut moments.m.weights, &mut moments.v.weights, update);
            for (((p, &gb), m), v) in layer.biases.iter_mut()
                .zip(&g.biases)
                .zip(moments.m.biases.iter_mut())
                .zip(moments.v.biases.iter_mut())
            {
                update(p, gb, m, v);
            }
        }
    }
}

fn for_each_entry<F>(params: &mut Matrix, grads: &Matrix, m: &mut Matrix, v: &mut Matrix, f: F)
where
    F: Fn(&mut f64, f64, &mut f64, &mut f64),
{
    for (((p_row, g_row), m_row), v_row) in params.data.iter_mut()
        .zip(&grads.data)
        .zip(m.data.iter_mut())
        .zip(v.data.iter_mut())
    {
        for (((p, &g), mi), vi) in p_row.iter_mut().zip(g_row).zip(m_row.iter_mut()).zip(v_row.iter_mut()) {
            f(p, g, mi, vi);
        }
    }
}

/// Rescales `grads` so their global L2 norm is at most `max_norm`.
/// Returns the norm before clipping. `max_norm <= 0` disables clipping.
pub fn clip_global_norm(grads: &mut [LayerGrads], max_norm: f64) -> f64 {
    let norm = grads.iter().map(LayerGrads::sum_squares).sum::<f64>().sqrt();
    if max_norm > 0.0 && norm > max_norm {
        let factor = max_norm / norm;
        grads.iter_mut().for_each(|g| g.scale(factor));
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer() -> Layer {
        let mut layer = Layer::new(1, 1, ActivationFunction::ReLU, 1.0, &mut StdRng::seed_from_u64(0));
        layer.weights = Matrix::from_data(vec![vec![1.0]]);
        layer
    }

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut layers = vec![layer()];
        let mut adam = Adam::new(0.1, 0.9, 0.999, &layers);
        let mut grads = vec![LayerGrads::zeros_like(&layers[0])];
        grads[0].weights.data[0][0] = 4.0;

        adam.step(&mut layers, &grads);

        // Bias correction makes the first update ≈ lr · sign(g).
        assert!((layers[0].weights.data[0][0] - 0.9).abs() < 1e-6);
        assert_eq!(layers[0].biases[0], 0.0);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_clip_global_norm() {
        let layers = vec![layer()];
        let mut grads = vec![LayerGrads::zeros_like(&layers[0])];
        grads[0].weights.data[0][0] = 3.0;
        grads[0].biases[0] = 4.0;

        let norm = clip_global_norm(&mut grads, 1.0);

        assert!((norm - 5.0).abs() < 1e-12);
        assert!((grads[0].sum_squares().sqrt() - 1.0).abs() < 1e-12);

        let before = grads[0].clone();
        clip_global_norm(&mut grads, 0.0);
        assert_eq!(grads[0].weights, before.weights);
    }
}
