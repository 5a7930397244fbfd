use ndarray::{Array1, Array4, Axis};
use tracing::debug;

use super::types::{BaselineGain, BaselineOutput, GlobalGainConfig};
use super::{anchor_ratio, validate_pair};
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::require_same_shape;
use crate::sensor_pipeline::forward::quad_bayer_forward;

/// Baseline A: global de-LTM gain alignment.
///
/// Linearizes `proraw_rgb48` with `inverse_tone_curve`, projects it into the
/// anchor domain, and takes the `gain_percentile` quantile of the per-pixel
/// anchor/simulated ratio as one gain per batch element. The clamped gain is
/// applied to the linear frame, which is then re-projected.
pub fn global_gain_baseline(
    proraw_rgb48: &Array4<f32>,
    anchor_mosaic: &Array4<f32>,
    inverse_tone_curve: &dyn Fn(f32) -> f32,
    config: &GlobalGainConfig,
) -> Result<BaselineOutput> {
    validate_pair(proraw_rgb48, anchor_mosaic)?;
    config.validate()?;

    let linear_rgb = proraw_rgb48.mapv(inverse_tone_curve);
    let simulated = quad_bayer_forward(&linear_rgb, config.pattern, &config.channel_scale)?;
    require_same_shape(&simulated, anchor_mosaic)?;

    let ratios = anchor_ratio(anchor_mosaic, &simulated, config.eps);
    let mut gains = Array1::<f32>::zeros(ratios.dim().0);
    for (gain, sample) in gains.iter_mut().zip(ratios.outer_iter()) {
        let mut values: Vec<f32> = sample.iter().copied().collect();
        let raw_gain = quantile(&mut values, config.gain_percentile)?;
        *gain = config.gain_range.clamp(raw_gain);
    }
    debug!(gains = ?gains.to_vec(), "global gain estimated");

    let mut corrected = linear_rgb;
    for (mut sample, &gain) in corrected.axis_iter_mut(Axis(0)).zip(gains.iter()) {
        sample.mapv_inplace(|v| (v * gain).max(0.0));
    }
    let mosaic = quad_bayer_forward(&corrected, config.pattern, &config.channel_scale)?;

    Ok(BaselineOutput {
        rgb48: corrected,
        mosaic,
        gain: BaselineGain::Global(gains),
    })
}

/// Quantile with linear interpolation between order statistics.
pub(crate) fn quantile(values: &mut [f32], q: f32) -> Result<f32> {
    if values.is_empty() {
        return Err(SensorError::EmptyAggregation("gain percentile".into()));
    }
    values.sort_by(f32::total_cmp);
    let position = q * (values.len() - 1) as f32;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let frac = position - lower as f32;
    Ok(values[lower] + (values[upper] - values[lower]) * frac)
}
