/// Mean-squared error of a masked estimate against the clean source.
///
/// The network predicts a mask `m`; the estimate is `m ⊙ mixture`.
pub struct MaskedMseLoss;

impl MaskedMseLoss {
    /// Scalar loss: mean((m·x - s)²)
    pub fn loss(mask: &[f64], mixture: &[f64], clean: &[f64]) -> f64 {
        let n = mask.len().max(1) as f64;
        mask.iter().zip(mixture).zip(clean)
            .map(|((m, x), s)| (m * x - s).powi(2))
            .sum::<f64>() / n
    }

    /// Per-bin gradient with respect to the mask: (m·x - s)·x
    pub fn derivative(mask: &[f64], mixture: &[f64], clean: &[f64]) -> Vec<f64> {
        mask.iter().zip(mixture).zip(clean)
            .map(|((m, x), s)| (m * x - s) * x)
            .collect()
    }

    pub fn apply_mask(mask: &[f64], mixture: &[f64]) -> Vec<f64> {
        mask.iter().zip(mixture).map(|(m, x)| m * x).collect()
    }
}
