pub mod adam;

pub use adam::{clip_global_norm, Adam};
