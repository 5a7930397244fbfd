use ndarray::Array4;

use crate::sensor_pipeline::common::error::Result;
use crate::sensor_pipeline::common::render::GlobalRender;
use crate::sensor_pipeline::common::tensor::{mean_abs_diff, require_same_shape, spatial_gradients};

/// Edge fidelity after a global-only render: mean |dx_pred - dx_ref| plus
/// mean |dy_pred - dy_ref|. Blind to global exposure offsets.
pub fn gradient_detail_loss(
    pred_rgb48: &Array4<f32>,
    reference_rgb48: &Array4<f32>,
    render: &GlobalRender<'_>,
) -> Result<f32> {
    require_same_shape(reference_rgb48, pred_rgb48)?;

    let pred = render.apply(pred_rgb48)?;
    let reference = render.apply(reference_rgb48)?;

    let (pred_dx, pred_dy) = spatial_gradients(&pred);
    let (ref_dx, ref_dy) = spatial_gradients(&reference);

    Ok(mean_abs_diff("horizontal gradients", &pred_dx, &ref_dx)?
        + mean_abs_diff("vertical gradients", &pred_dy, &ref_dy)?)
}
