//! Color filter array layouts and channel maps
//!
//! The quad-Bayer sensor repeats a 2x2 Bayer layout at block granularity
//! (each color occupies a 2x2 group of photosites). After 2x2 binning the
//! anchor mosaic is an ordinary Bayer mosaic, so the same layout is read at
//! pixel granularity there.

mod channel_map;
pub mod types;

pub use channel_map::channel_index_map;
pub use types::{CfaPattern, ColorChannel, Granularity};
