//! TIFF export of anchor mosaics and RGB renders
//!
//! 16-bit output with configurable compression, for inspecting what the
//! forward operator and the baselines produce.

mod writer;
mod standard_tiff_writer;
pub mod types;

pub use writer::TiffWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ExportConfig, ExportConfigBuilder, TiffCompression};
