//! Input stacking and output composition around the gain-field network.

use ndarray::{Array4, Axis, Zip, concatenate};

use super::resample::upsample_bilinear;
use super::types::GainRange;
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::require_same_shape;

/// Ratio between the ProRAW48 grid and the network's gain head.
pub const GAIN_FIELD_SCALE: usize = 4;

/// The two network heads: a low-resolution gain and a full-resolution detail.
#[derive(Debug, Clone)]
pub struct GainFieldPrediction {
    /// `(B, 3, H / 4, W / 4)`
    pub gain: Array4<f32>,
    /// `(B, 3, H, W)`
    pub detail: Array4<f32>,
}

fn require_rgb(name: &str, tensor: &Array4<f32>) -> Result<()> {
    if tensor.dim().1 != 3 {
        return Err(SensorError::Shape(format!(
            "{name} must have shape (B, 3, H, W), got {:?}",
            tensor.shape()
        )));
    }
    Ok(())
}

/// `max(0, input * up(clamp(gain)) + detail)`.
pub fn compose_linear_prediction(
    input_rgb48: &Array4<f32>,
    prediction: &GainFieldPrediction,
    gain_range: &GainRange,
) -> Result<Array4<f32>> {
    require_rgb("input_rgb48", input_rgb48)?;
    require_rgb("gain", &prediction.gain)?;
    require_same_shape(input_rgb48, &prediction.detail)?;
    gain_range.validate()?;

    let (batch, _, height, width) = input_rgb48.dim();
    let (gain_batch, _, gain_h, gain_w) = prediction.gain.dim();
    if gain_batch != batch
        || gain_h * GAIN_FIELD_SCALE != height
        || gain_w * GAIN_FIELD_SCALE != width
    {
        return Err(SensorError::Shape(format!(
            "gain must be (B, 3, H/{GAIN_FIELD_SCALE}, W/{GAIN_FIELD_SCALE}) for input {:?}, got {:?}",
            input_rgb48.shape(),
            prediction.gain.shape()
        )));
    }

    let gain = prediction.gain.mapv(|g| gain_range.clamp(g));
    let gain_up = upsample_bilinear(&gain, height, width);
    Ok(Zip::from(input_rgb48)
        .and(&gain_up)
        .and(&prediction.detail)
        .map_collect(|&x, &g, &r| (x * g + r).max(0.0)))
}

/// Bilinear upsample of the RAW12 guidance RGB onto the ProRAW48 grid.
pub fn upsample_guidance(
    raw12_rgb: &Array4<f32>,
    target_size: (usize, usize),
) -> Result<Array4<f32>> {
    require_rgb("raw12_rgb", raw12_rgb)?;
    Ok(upsample_bilinear(raw12_rgb, target_size.0, target_size.1))
}

/// Stacks ProRAW48 and upsampled guidance into the `(B, 6, H, W)` model input.
pub fn build_model_inputs(pro_raw48: &Array4<f32>, raw12_rgb: &Array4<f32>) -> Result<Array4<f32>> {
    require_rgb("pro_raw48", pro_raw48)?;
    require_rgb("raw12_rgb", raw12_rgb)?;

    let (batch, _, height, width) = pro_raw48.dim();
    let (guide_batch, _, guide_h, guide_w) = raw12_rgb.dim();
    if batch != guide_batch {
        return Err(SensorError::Shape(format!(
            "batch size mismatch between pro_raw48 ({batch}) and raw12_rgb ({guide_batch})"
        )));
    }
    // ratios compared exactly: h/gh == w/gw <=> h*gw == w*gh
    if guide_h == 0 || guide_w == 0 || height * guide_w != width * guide_h || height < guide_h {
        return Err(SensorError::Shape(format!(
            "raw12 guidance {guide_h}x{guide_w} must scale uniformly to {height}x{width}"
        )));
    }

    let guidance = upsample_guidance(raw12_rgb, (height, width))?;
    concatenate(Axis(1), &[pro_raw48.view(), guidance.view()])
        .map_err(|e| SensorError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_compose_applies_gain_and_detail() {
        let input = Array4::<f32>::ones((1, 3, 8, 8));
        let prediction = GainFieldPrediction {
            gain: Array4::from_elem((1, 3, 2, 2), 0.5),
            detail: Array4::from_elem((1, 3, 8, 8), 0.25),
        };

        let output = compose_linear_prediction(&input, &prediction, &GainRange::default()).unwrap();

        assert!(output.iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_compose_clamps_gain_and_output() {
        let input = Array4::<f32>::ones((1, 3, 4, 4));
        let prediction = GainFieldPrediction {
            gain: Array4::from_elem((1, 3, 1, 1), 100.0),
            detail: Array4::from_elem((1, 3, 4, 4), -10.0),
        };

        let output = compose_linear_prediction(&input, &prediction, &GainRange::default()).unwrap();
        assert!(output.iter().all(|&v| v == 0.0));

        let prediction = GainFieldPrediction {
            detail: Array4::zeros((1, 3, 4, 4)),
            ..prediction
        };
        let output = compose_linear_prediction(&input, &prediction, &GainRange::default()).unwrap();
        assert!(output.iter().all(|&v| (v - 4.0).abs() < 1e-6));
    }

    #[test]
    fn test_compose_rejects_wrong_gain_resolution() {
        let input = Array4::<f32>::ones((1, 3, 8, 8));
        let prediction = GainFieldPrediction {
            gain: Array4::ones((1, 3, 4, 4)),
            detail: Array4::zeros((1, 3, 8, 8)),
        };
        assert!(matches!(
            compose_linear_prediction(&input, &prediction, &GainRange::default()),
            Err(SensorError::Shape(_))
        ));
    }

    #[test]
    fn test_compose_rejects_detail_mismatch() {
        let input = Array4::<f32>::ones((1, 3, 8, 8));
        let prediction = GainFieldPrediction {
            gain: Array4::ones((1, 3, 2, 2)),
            detail: Array4::zeros((1, 3, 8, 4)),
        };
        assert!(matches!(
            compose_linear_prediction(&input, &prediction, &GainRange::default()),
            Err(SensorError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn test_upsample_guidance_keeps_mean() {
        let raw = Array4::from_shape_fn((1, 3, 2, 2), |(_, c, y, x)| (c * 4 + y * 2 + x) as f32);
        let up = upsample_guidance(&raw, (4, 6)).unwrap();

        assert_eq!(up.shape(), &[1, 3, 4, 6]);
        assert!((up.mean().unwrap() - raw.mean().unwrap()).abs() < 1e-3);
    }

    #[test]
    fn test_model_inputs_stack_input_and_guidance() {
        let pro_raw48 = Array4::<f32>::ones((1, 3, 4, 4));
        let mut raw12 = Array4::<f32>::zeros((1, 3, 2, 2));
        raw12.slice_mut(s![.., .., 1, 1]).fill(2.0);

        let stacked = build_model_inputs(&pro_raw48, &raw12).unwrap();

        assert_eq!(stacked.shape(), &[1, 6, 4, 4]);
        assert_eq!(stacked.slice(s![.., ..3, .., ..]), pro_raw48);
        let guidance = upsample_bilinear(&raw12, 4, 4);
        assert_eq!(stacked.slice(s![.., 3.., .., ..]), guidance);
        assert!((guidance[[0, 0, 3, 3]] - 2.0).abs() < 1e-6);
        assert_eq!(guidance[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_model_inputs_reject_non_uniform_scale() {
        let pro_raw48 = Array4::<f32>::ones((1, 3, 8, 8));
        let raw12 = Array4::<f32>::ones((1, 3, 2, 4));
        assert!(matches!(
            build_model_inputs(&pro_raw48, &raw12),
            Err(SensorError::Shape(_))
        ));

        let larger = Array4::<f32>::ones((1, 3, 16, 16));
        assert!(matches!(
            build_model_inputs(&pro_raw48, &larger),
            Err(SensorError::Shape(_))
        ));
    }
}
