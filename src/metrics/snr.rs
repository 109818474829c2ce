/// Guards the ratio against silent frames.
const EPSILON: f64 = 1e-12;

/// Signal-to-noise ratio of an estimate in dB:
/// `10 · log10(Σ s² / Σ (s - ŝ)²)` over all frames of one utterance.
pub fn snr_db(clean: &[Vec<f64>], estimate: &[Vec<f64>]) -> f64 {
    let mut signal = 0.0;
    let mut error = 0.0;
    for (s_frame, e_frame) in clean.iter().zip(estimate) {
        for (s, e) in s_frame.iter().zip(e_frame) {
            signal += s * s;
            error += (s - e).powi(2);
        }
    }
    10.0 * ((signal + EPSILON) / (error + EPSILON)).log10()
}
