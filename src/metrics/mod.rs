pub mod snr;

pub use snr::snr_db;
