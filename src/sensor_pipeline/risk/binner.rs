use ndarray::{Array3, Array4, s};

use crate::sensor_pipeline::cfa::{CfaPattern, ColorChannel};
use crate::sensor_pipeline::common::error::Result;
use crate::sensor_pipeline::common::tensor::validate_rgb48;
use crate::sensor_pipeline::forward::{ChannelScale, quad_bayer_forward};

/// Largest absolute difference between [`quad_bayer_forward`] and a
/// reference binner built from strided quadrant slices.
///
/// The reference never consults the channel map or the pattern's layout
/// table: each color's binned plane is the mean of its four stride-2
/// quadrants, and the anchor pixel at `(i, j)` takes the plane its own
/// Bayer table assigns to `(i & 1, j & 1)`.
pub fn quad_binner_residual(
    rgb48: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
) -> Result<f32> {
    validate_rgb48("rgb48", rgb48)?;
    let mosaiced = quad_bayer_forward(rgb48, pattern, scale)?;
    let manual = reference_binning(rgb48, pattern, scale);

    Ok(mosaiced
        .iter()
        .zip(manual.iter())
        .map(|(&a, &b)| (a - b).abs())
        .fold(0.0, f32::max))
}

/// Plane index (0 = R, 1 = G, 2 = B) per anchor parity, written out per
/// pattern.
fn quadrant_planes(pattern: CfaPattern) -> [[usize; 2]; 2] {
    match pattern {
        CfaPattern::Rggb => [[0, 1], [1, 2]],
        CfaPattern::Bggr => [[2, 1], [1, 0]],
        CfaPattern::Grbg => [[1, 0], [2, 1]],
        CfaPattern::Gbrg => [[1, 2], [0, 1]],
    }
}

fn reference_binning(rgb48: &Array4<f32>, pattern: CfaPattern, scale: &ChannelScale) -> Array4<f32> {
    let (batch, _, height, width) = rgb48.dim();
    let (half_h, half_w) = (height / 2, width / 2);

    let mut binned: Vec<Array3<f32>> = Vec::with_capacity(3);
    for channel in ColorChannel::ALL {
        let c = channel.index();
        let mut plane = Array3::<f32>::zeros((batch, half_h, half_w));
        for (dy, dx) in [(0usize, 0usize), (0, 1), (1, 0), (1, 1)] {
            plane += &rgb48.slice(s![.., c, dy..;2, dx..;2]);
        }
        plane *= 0.25 * scale.get(c);
        binned.push(plane);
    }

    let planes = quadrant_planes(pattern);
    Array4::from_shape_fn((batch, 1, half_h, half_w), |(n, _, i, j)| {
        binned[planes[i & 1][j & 1]][[n, i, j]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_pipeline::common::error::SensorError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_matches_manual_rggb() {
        let rgb = Array4::from_shape_fn((1, 3, 4, 4), |(_, c, y, x)| (c + y * 4 + x + 1) as f32);
        let scale = ChannelScale([1.0, 2.0, 0.5]);

        let residual = quad_binner_residual(&rgb, CfaPattern::Rggb, &scale).unwrap();
        assert!(residual.abs() < 1e-5);
    }

    #[test]
    fn test_reference_places_colors_by_hand_table() {
        // constant R = 1, G = 2, B = 3 so each anchor pixel names its color
        let rgb = Array4::from_shape_fn((1, 3, 4, 4), |(_, c, _, _)| (c + 1) as f32);
        let expected = [
            (CfaPattern::Rggb, [1.0, 2.0, 2.0, 3.0]),
            (CfaPattern::Bggr, [3.0, 2.0, 2.0, 1.0]),
            (CfaPattern::Grbg, [2.0, 1.0, 3.0, 2.0]),
            (CfaPattern::Gbrg, [2.0, 3.0, 1.0, 2.0]),
        ];
        for (pattern, values) in expected {
            let manual = reference_binning(&rgb, pattern, &ChannelScale::identity());
            let got: Vec<f32> = manual.iter().copied().collect();
            assert_eq!(got, values, "{pattern}");
            let forward = quad_bayer_forward(&rgb, pattern, &ChannelScale::identity()).unwrap();
            assert_eq!(forward.iter().copied().collect::<Vec<_>>(), values, "{pattern}");
        }
    }

    #[test]
    fn test_all_patterns_agree_on_random_input() {
        let mut rng = StdRng::seed_from_u64(5);
        let rgb = Array4::from_shape_fn((2, 3, 8, 12), |_| rng.random::<f32>());
        let scale = ChannelScale([0.9, 1.1, 1.3]);

        for pattern in CfaPattern::ALL {
            let residual = quad_binner_residual(&rgb, pattern, &scale).unwrap();
            assert!(residual < 1e-5, "{pattern}: residual {residual}");
        }
    }

    #[test]
    fn test_rejects_odd_input() {
        let rgb = Array4::<f32>::zeros((1, 3, 4, 5));
        assert!(matches!(
            quad_binner_residual(&rgb, CfaPattern::Rggb, &ChannelScale::identity()),
            Err(SensorError::Shape(_))
        ));
    }
}
