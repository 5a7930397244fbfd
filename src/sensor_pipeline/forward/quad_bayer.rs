use ndarray::{Array3, Array4};

use crate::sensor_pipeline::cfa::{CfaPattern, Granularity, channel_index_map};
use crate::sensor_pipeline::common::error::Result;
use crate::sensor_pipeline::common::tensor::{validate_mosaic, validate_rgb48};
use crate::sensor_pipeline::forward::types::ChannelScale;

/// Mosaics and bins a `(B, 3, H, W)` linear RGB tensor into the
/// `(B, 1, H/2, W/2)` RAW anchor domain.
///
/// Steps: scale each channel, keep the one channel each photosite samples
/// (block-granular CFA map), then average every non-overlapping 2x2 block of
/// same-color photosites into one RAW sample. Every step is linear, so the
/// operator has an exact adjoint, see [`quad_bayer_adjoint`].
pub fn quad_bayer_forward(
    rgb48: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
) -> Result<Array4<f32>> {
    validate_rgb48("rgb48", rgb48)?;
    let (batch, _, height, width) = rgb48.dim();

    let channel_map = channel_index_map(height, width, pattern, Granularity::Block);
    let sampled = Array3::from_shape_fn((batch, height, width), |(n, y, x)| {
        let c = channel_map[[y, x]];
        rgb48[[n, c, y, x]] * scale.get(c)
    });

    Ok(Array4::from_shape_fn(
        (batch, 1, height / 2, width / 2),
        |(n, _, i, j)| {
            let (y, x) = (2 * i, 2 * j);
            (sampled[[n, y, x]]
                + sampled[[n, y, x + 1]]
                + sampled[[n, y + 1, x]]
                + sampled[[n, y + 1, x + 1]])
                * 0.25
        },
    ))
}

/// Transpose of [`quad_bayer_forward`]: spreads a `(B, 1, h, w)` mosaic-space
/// gradient back onto the `(B, 3, 2h, 2w)` RGB photosites that produced it.
pub fn quad_bayer_adjoint(
    grad_mosaic: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
) -> Result<Array4<f32>> {
    validate_mosaic("grad_mosaic", grad_mosaic)?;
    let (batch, _, half_h, half_w) = grad_mosaic.dim();
    let (height, width) = (half_h * 2, half_w * 2);

    let channel_map = channel_index_map(height, width, pattern, Granularity::Block);
    Ok(Array4::from_shape_fn((batch, 3, height, width), |(n, c, y, x)| {
        if channel_map[[y, x]] == c {
            0.25 * scale.get(c) * grad_mosaic[[n, 0, y / 2, x / 2]]
        } else {
            0.0
        }
    }))
}
