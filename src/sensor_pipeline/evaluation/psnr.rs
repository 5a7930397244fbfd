use ndarray::Array4;

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::require_same_shape;

/// Mean squared error, accumulated in f64.
pub fn mse(pred: &Array4<f32>, target: &Array4<f32>) -> Result<f64> {
    require_same_shape(target, pred)?;
    if pred.is_empty() {
        return Err(SensorError::EmptyAggregation("mse of empty tensors".to_string()));
    }
    let sum: f64 = pred
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| {
            let d = (p - t) as f64;
            d * d
        })
        .sum();
    Ok(sum / pred.len() as f64)
}

/// `10 * log10(max_val^2 / mse)`; an exact match gives `+inf`.
pub fn psnr(pred: &Array4<f32>, target: &Array4<f32>, max_val: f32) -> Result<f32> {
    let mse = mse(pred, target)?;
    if mse == 0.0 {
        return Ok(f32::INFINITY);
    }
    let peak = max_val as f64;
    Ok((10.0 * (peak * peak / mse).log10()) as f32)
}
