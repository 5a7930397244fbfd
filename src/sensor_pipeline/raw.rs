//! RAW anchor ingest
//!
//! Format-agnostic RAW decoding into a single-plane Bayer capture that can
//! be normalized into the anchor mosaic domain.

mod reader;
mod rawloader_reader;
pub mod types;

pub use reader::RawCaptureReader;
pub use rawloader_reader::RawLoaderReader;
pub use types::RawCapture;
