pub mod glyphs;
pub mod plot;

pub use plot::{png_path, PngReporter, ResultReporter};
