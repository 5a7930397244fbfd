use ndarray::{Array1, Array4};

use crate::sensor_pipeline::cfa::{CfaPattern, ColorChannel, Granularity, channel_index_map};
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{require_even, validate_mosaic};

/// Bin layout for [`per_cfa_error_histogram`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramConfig {
    pub num_bins: usize,
    pub min_value: f32,
    pub max_value: f32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            num_bins: 64,
            min_value: -0.02,
            max_value: 0.02,
        }
    }
}

/// Residual counts per CFA color role.
#[derive(Debug, Clone, PartialEq)]
pub struct CfaHistograms {
    pub r: Array1<f32>,
    pub g: Array1<f32>,
    pub b: Array1<f32>,
}

impl CfaHistograms {
    pub fn get(&self, channel: ColorChannel) -> &Array1<f32> {
        match channel {
            ColorChannel::Red => &self.r,
            ColorChannel::Green => &self.g,
            ColorChannel::Blue => &self.b,
        }
    }
}

/// Splits a `(B, 1, H, W)` residual mosaic by pixel-parity CFA role and bins
/// each role into a fixed-width histogram. Values outside the range are
/// dropped; the upper edge lands in the last bin.
pub fn per_cfa_error_histogram(
    residual_mosaic: &Array4<f32>,
    pattern: CfaPattern,
    config: &HistogramConfig,
) -> Result<CfaHistograms> {
    validate_mosaic("residual_mosaic", residual_mosaic)?;
    let (_, _, height, width) = residual_mosaic.dim();
    require_even("residual_mosaic", height, width)?;
    if config.num_bins == 0 || !(config.max_value > config.min_value) {
        return Err(SensorError::InvalidConfig(format!(
            "histogram needs at least one bin over a non-empty range, got {} bins over [{}, {}]",
            config.num_bins, config.min_value, config.max_value
        )));
    }

    let channel_map = channel_index_map(height, width, pattern, Granularity::Pixel);
    let mut counts = [
        Array1::<f32>::zeros(config.num_bins),
        Array1::<f32>::zeros(config.num_bins),
        Array1::<f32>::zeros(config.num_bins),
    ];
    let span = config.max_value - config.min_value;

    for ((_, _, y, x), &value) in residual_mosaic.indexed_iter() {
        if !(config.min_value..=config.max_value).contains(&value) {
            continue;
        }
        let position = (value - config.min_value) / span * config.num_bins as f32;
        let bin = (position as usize).min(config.num_bins - 1);
        counts[channel_map[[y, x]]][bin] += 1.0;
    }

    let [r, g, b] = counts;
    Ok(CfaHistograms { r, g, b })
}
