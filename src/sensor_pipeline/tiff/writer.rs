use std::io::Write;

use ndarray::Array4;

use crate::sensor_pipeline::common::error::Result;
use crate::sensor_pipeline::tiff::types::ExportConfig;

/// Writes `[0, 1]` tensors of a single frame as 16-bit TIFF.
pub trait TiffWriter {
    /// `(1, 1, H, W)` mosaic as Gray16.
    fn write_mosaic(&self, mosaic: &Array4<f32>, output: &mut dyn Write, config: &ExportConfig) -> Result<()>;
    /// `(1, 3, H, W)` image as interleaved RGB16.
    fn write_rgb(&self, rgb: &Array4<f32>, output: &mut dyn Write, config: &ExportConfig) -> Result<()>;
}
