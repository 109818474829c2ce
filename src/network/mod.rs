pub mod network;
pub mod spec;

pub use network::MaskNetwork;
pub use spec::MaskNetSpec;
