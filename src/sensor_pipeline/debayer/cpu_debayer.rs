use std::io::Cursor;

use anyhow::{Context, Result};
use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use ndarray::{Array3, Array4};
use tracing::info;

use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::common::tensor::with_batch_axis;
use crate::sensor_pipeline::raw::RawCapture;

/// Linear-interpolation demosaic on the CPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuDebayer;

fn bayer_cfa(pattern: CfaPattern) -> CFA {
    match pattern {
        CfaPattern::Rggb => CFA::RGGB,
        CfaPattern::Bggr => CFA::BGGR,
        CfaPattern::Grbg => CFA::GRBG,
        CfaPattern::Gbrg => CFA::GBRG,
    }
}

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    /// Demosaics `capture` into a `(1, 3, H, W)` linear RGB tensor in
    /// `[0, 1]` (black level removed, divided by the white-black range).
    /// No white balance or color matrix is applied.
    pub fn process(&self, capture: &RawCapture) -> Result<Array4<f32>> {
        let (width, height) = (capture.width, capture.height);
        anyhow::ensure!(
            capture.data.len() == width * height,
            "capture buffer holds {} samples for {width}x{height}",
            capture.data.len()
        );
        info!("Starting CPU debayering for capture {}x{}", width, height);

        let bayer_bytes: Vec<u8> = capture
            .data
            .iter()
            .flat_map(|&val| val.to_le_bytes())
            .collect();
        let mut output_buf = vec![0u8; width * height * 3 * 2];
        let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);

        bayer::run_demosaic(
            &mut Cursor::new(&bayer_bytes[..]),
            BayerDepth::Depth16LE,
            bayer_cfa(capture.pattern),
            Demosaic::Linear,
            &mut output_raster,
        )
        .map_err(|e| anyhow::anyhow!("{e:?}"))
        .with_context(|| format!("demosaic failed for {} capture", capture.pattern))?;

        let black = capture.black_level as f32;
        let range = (capture.white_level as f32 - black).max(1.0);
        let samples: Vec<f32> = output_buf
            .chunks_exact(2)
            .map(|b| ((u16::from_le_bytes([b[0], b[1]]) as f32 - black) / range).clamp(0.0, 1.0))
            .collect();

        // interleaved (H, W, 3) -> planar (1, 3, H, W)
        let interleaved = Array3::from_shape_vec((height, width, 3), samples)
            .context("demosaic output has unexpected size")?;
        Ok(with_batch_axis(
            interleaved.permuted_axes([2, 0, 1]).as_standard_layout().into_owned(),
        ))
    }
}
