use ndarray::Array4;

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{mean, spatial_gradients};

/// Tunables for [`gain_regularization`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRegularizationConfig {
    pub smoothness_weight: f32,
    pub min_gain: f32,
    pub max_gain: f32,
}

impl Default for GainRegularizationConfig {
    fn default() -> Self {
        Self {
            smoothness_weight: 1.0,
            min_gain: 0.5,
            max_gain: 2.0,
        }
    }
}

/// Total penalty and its two components, kept apart for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRegularization {
    pub total: f32,
    pub smoothness: f32,
    pub range: f32,
}

/// Smoothness (mean |dx| + mean |dy|) plus a one-sided hinge outside
/// `[min_gain, max_gain]` for a `(B, C, H, W)` gain map.
pub fn gain_regularization(
    gain_map: &Array4<f32>,
    config: &GainRegularizationConfig,
) -> Result<GainRegularization> {
    if config.min_gain > config.max_gain {
        return Err(SensorError::InvalidConfig(format!(
            "min_gain {} exceeds max_gain {}",
            config.min_gain, config.max_gain
        )));
    }

    let (dx, dy) = spatial_gradients(gain_map);
    let smoothness = mean("gain map horizontal gradients", &dx.mapv(f32::abs))?
        + mean("gain map vertical gradients", &dy.mapv(f32::abs))?;

    let (lo, hi) = (config.min_gain, config.max_gain);
    let hinge = gain_map.mapv(|g| (lo - g).max(0.0) + (g - hi).max(0.0));
    let range = mean("gain map", &hinge)?;

    Ok(GainRegularization {
        total: config.smoothness_weight * smoothness + range,
        smoothness,
        range,
    })
}
