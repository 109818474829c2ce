use serde::{Deserialize, Serialize};

/// Uniform fake quantization to `bits` of precision.
///
/// Values are snapped to the nearest of the representable levels and
/// returned as `f64`, so a quantized network runs through the same
/// floating-point code as a full-precision one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantizer {
    bits: u32,
}

impl Quantizer {
    pub fn new(bits: u32) -> Quantizer {
        Quantizer { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Positive levels of a signed grid; zero is always representable.
    pub fn symmetric_levels(&self) -> f64 {
        ((1u64 << (self.bits - 1)) - 1) as f64
    }

    /// Non-zero levels of an unsigned grid.
    pub fn unsigned_levels(&self) -> f64 {
        ((1u64 << self.bits) - 1) as f64
    }

    /// Snaps `x` to a grid over `[-max_abs, max_abs]`, clamping outliers.
    pub fn symmetric(&self, x: f64, max_abs: f64) -> f64 {
        if max_abs <= 0.0 {
            return 0.0;
        }
        let step = max_abs / self.symmetric_levels();
        (x.clamp(-max_abs, max_abs) / step).round() * step
    }

    /// Snaps `x` to a grid over `[0, max]`, clamping outliers.
    pub fn unsigned(&self, x: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        let step = max / self.unsigned_levels();
        (x.clamp(0.0, max) / step).round() * step
    }
}
