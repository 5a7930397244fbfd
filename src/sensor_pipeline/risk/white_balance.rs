use ndarray::{Array2, Array4, Axis};
use tracing::warn;

use crate::sensor_pipeline::cfa::{CfaPattern, ColorChannel, Granularity, channel_index_map};
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{require_even, validate_mosaic};

pub const DEFAULT_WB_TOLERANCE: f32 = 0.05;

/// Outcome of comparing an estimated neutral against a target.
#[derive(Debug, Clone)]
pub struct WhiteBalanceCheck {
    pub within_tolerance: bool,
    /// `(B, 3)` green-normalized neutral estimated from the mosaic.
    pub estimated: Array2<f32>,
    /// `(B, 3)` absolute difference against the green-normalized target.
    pub deviation: Array2<f32>,
}

/// AsShotNeutral-style ratios `(B, 3)`: the reciprocal of each color's mean
/// photosite value, normalized so green is 1.
pub fn estimate_white_balance_neutral(
    mosaic: &Array4<f32>,
    pattern: CfaPattern,
    eps: f32,
) -> Result<Array2<f32>> {
    validate_mosaic("mosaic", mosaic)?;
    let (batch, _, height, width) = mosaic.dim();
    require_even("mosaic", height, width)?;

    let channel_map = channel_index_map(height, width, pattern, Granularity::Pixel);
    let mut sums = Array2::<f64>::zeros((batch, 3));
    let mut counts = [0usize; 3];
    for &c in channel_map.iter() {
        counts[c] += 1;
    }
    for (n, sample) in mosaic.index_axis(Axis(1), 0).outer_iter().enumerate() {
        for (&value, &c) in sample.iter().zip(channel_map.iter()) {
            sums[[n, c]] += value as f64;
        }
    }

    let mut neutral = Array2::<f32>::zeros((batch, 3));
    for n in 0..batch {
        for channel in ColorChannel::ALL {
            let c = channel.index();
            let mean = sums[[n, c]] / counts[c].max(1) as f64;
            neutral[[n, c]] = (1.0 / (mean + eps as f64)) as f32;
        }
        let green = neutral[[n, ColorChannel::Green.index()]];
        neutral.row_mut(n).mapv_inplace(|v| v / green);
    }
    Ok(neutral)
}

/// Compares the estimated neutral against `target_neutral` (renormalized to
/// green = 1) element-wise within `tolerance`.
pub fn white_balance_consistency(
    mosaic: &Array4<f32>,
    target_neutral: &[f32; 3],
    pattern: CfaPattern,
    tolerance: f32,
) -> Result<WhiteBalanceCheck> {
    let green = target_neutral[ColorChannel::Green.index()];
    if green == 0.0 || !green.is_finite() {
        return Err(SensorError::InvalidConfig(format!(
            "target neutral green component must be finite and non-zero, got {green}"
        )));
    }
    let target = target_neutral.map(|v| v / green);

    let estimated = estimate_white_balance_neutral(mosaic, pattern, 1e-6)?;
    let mut deviation = estimated.clone();
    for mut row in deviation.rows_mut() {
        for (value, &t) in row.iter_mut().zip(target.iter()) {
            *value = (*value - t).abs();
        }
    }
    let within_tolerance = deviation.iter().all(|&d| d <= tolerance);
    if !within_tolerance {
        warn!(
            ?target,
            estimated = ?estimated.rows().into_iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
            tolerance,
            "white balance deviates from target neutral"
        );
    }

    Ok(WhiteBalanceCheck {
        within_tolerance,
        estimated,
        deviation,
    })
}
