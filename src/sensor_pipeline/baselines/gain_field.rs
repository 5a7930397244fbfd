use ndarray::{Array4, Axis, Zip, concatenate};
use tracing::debug;

use super::resample::{box_smooth, upsample_bilinear};
use super::types::{BaselineGain, BaselineOutput, GainFieldConfig};
use super::{anchor_ratio, validate_pair};
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::require_same_shape;
use crate::sensor_pipeline::forward::quad_bayer_forward;

/// Baseline B: spatial gain field with no detail term.
///
/// The clamped anchor/simulated ratio is upsampled to full resolution,
/// box-smoothed, and applied identically to all three channels. With the
/// default zero-padded smoothing, border gains fall below the band.
pub fn gain_field_baseline(
    proraw_rgb48: &Array4<f32>,
    anchor_mosaic: &Array4<f32>,
    config: &GainFieldConfig,
) -> Result<BaselineOutput> {
    validate_pair(proraw_rgb48, anchor_mosaic)?;
    config.validate()?;

    let simulated = quad_bayer_forward(proraw_rgb48, config.pattern, &config.channel_scale)?;
    require_same_shape(&simulated, anchor_mosaic)?;

    let range = config.gain_range;
    let gain_anchor = anchor_ratio(anchor_mosaic, &simulated, config.eps).mapv(|g| range.clamp(g));

    let (_, _, height, width) = proraw_rgb48.dim();
    let field = box_smooth(
        &upsample_bilinear(&gain_anchor, height, width),
        config.smoothing_kernel,
        config.border_normalization,
    );
    let field = concatenate(Axis(1), &[field.view(), field.view(), field.view()])
        .map_err(|e| SensorError::Shape(e.to_string()))?;
    debug!(
        min = field.iter().copied().fold(f32::INFINITY, f32::min),
        max = field.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        "gain field estimated"
    );

    let corrected = Zip::from(proraw_rgb48)
        .and(&field)
        .map_collect(|&v, &g| (v * g).max(0.0));
    let mosaic = quad_bayer_forward(&corrected, config.pattern, &config.channel_scale)?;

    Ok(BaselineOutput {
        rgb48: corrected,
        mosaic,
        gain: BaselineGain::Field(field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_pipeline::baselines::resample::BoxNormalization;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn field(output: &BaselineOutput) -> &Array4<f32> {
        match &output.gain {
            BaselineGain::Field(f) => f,
            other => panic!("expected a gain field, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_mismatch_gives_flat_field() {
        let proraw = Array4::<f32>::from_elem((1, 3, 8, 8), 0.5);
        let anchor = Array4::<f32>::from_elem((1, 1, 4, 4), 1.0);
        let config = GainFieldConfig::builder()
            .border_normalization(BoxNormalization::InBounds)
            .build();

        let output = gain_field_baseline(&proraw, &anchor, &config).unwrap();

        assert_eq!(field(&output).shape(), &[1, 3, 8, 8]);
        assert!(field(&output).iter().all(|&g| (g - 2.0).abs() < 1e-5));
        assert!(output.rgb48.iter().all(|&v| (v - 1.0).abs() < 1e-5));
        assert!(output.mosaic.iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_default_smoothing_darkens_borders() {
        let proraw = Array4::<f32>::from_elem((1, 3, 8, 8), 0.5);
        let anchor = Array4::<f32>::from_elem((1, 1, 4, 4), 1.0);

        let output = gain_field_baseline(&proraw, &anchor, &GainFieldConfig::default()).unwrap();
        let field = field(&output);

        // 7x7 window: 16 of 49 taps in bounds at the corner, 28 at (0, 3)
        assert!((field[[0, 0, 0, 0]] - 2.0 * 16.0 / 49.0).abs() < 1e-5);
        assert!((field[[0, 2, 7, 7]] - 2.0 * 16.0 / 49.0).abs() < 1e-5);
        assert!((field[[0, 1, 0, 3]] - 2.0 * 28.0 / 49.0).abs() < 1e-5);
        assert!((output.rgb48[[0, 0, 0, 0]] - 0.5 * 2.0 * 16.0 / 49.0).abs() < 1e-5);
    }

    #[test]
    fn test_field_stays_in_gain_band() {
        let mut rng = StdRng::seed_from_u64(3);
        let proraw = Array4::from_shape_fn((2, 3, 8, 12), |_| rng.random::<f32>() + 0.05);
        let anchor = Array4::from_shape_fn((2, 1, 4, 6), |_| rng.random::<f32>() * 10.0);
        let config = GainFieldConfig::builder()
            .smoothing_kernel(3)
            .border_normalization(BoxNormalization::InBounds)
            .build();

        let output = gain_field_baseline(&proraw, &anchor, &config).unwrap();
        let range = config.gain_range;

        assert!(
            field(&output)
                .iter()
                .all(|&g| g >= range.min_gain - 1e-5 && g <= range.max_gain + 1e-5)
        );
        assert!(output.rgb48.iter().all(|&v| v >= 0.0));
        assert_eq!(output.mosaic.shape(), anchor.shape());
    }

    #[test]
    fn test_channels_share_one_field() {
        let proraw = Array4::<f32>::from_elem((1, 3, 4, 4), 0.5);
        let anchor = ndarray::array![[[[0.25f32, 1.0], [0.5, 2.0]]]];
        let config = GainFieldConfig::builder().smoothing_kernel(1).build();

        let output = gain_field_baseline(&proraw, &anchor, &config).unwrap();
        let field = field(&output);

        for c in 1..3 {
            assert_eq!(field.index_axis(Axis(1), c), field.index_axis(Axis(1), 0));
        }
    }

    #[test]
    fn test_rejects_even_smoothing_kernel() {
        let proraw = Array4::<f32>::zeros((1, 3, 4, 4));
        let anchor = Array4::<f32>::zeros((1, 1, 2, 2));
        let config = GainFieldConfig::builder().smoothing_kernel(4).build();

        assert!(matches!(
            gain_field_baseline(&proraw, &anchor, &config),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_gain_band() {
        let proraw = Array4::<f32>::zeros((1, 3, 4, 4));
        let anchor = Array4::<f32>::zeros((1, 1, 2, 2));
        let config = GainFieldConfig::builder().gain_range(2.0, 1.0).build();

        assert!(matches!(
            gain_field_baseline(&proraw, &anchor, &config),
            Err(SensorError::InvalidConfig(_))
        ));
    }
}
