pub mod mask_net;

pub use mask_net::{MaskNet, MaskNetBuilder, MaskNetCheckpoint};
