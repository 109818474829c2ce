pub mod calibration;
pub mod quantizer;

pub use calibration::{ActivationRanges, QuantizedNetwork};
pub use quantizer::Quantizer;
