pub mod mse;

pub use mse::MaskedMseLoss;
