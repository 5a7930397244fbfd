use ndarray::{Array4, Zip};

use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{mean, require_same_shape};
use crate::sensor_pipeline::forward::{ChannelScale, quad_bayer_adjoint, quad_bayer_forward};

pub const DEFAULT_CHARBONNIER_EPS: f32 = 1e-3;

/// `mean(sqrt((pred - target)^2 + eps^2))`.
pub fn charbonnier_loss(pred: &Array4<f32>, target: &Array4<f32>, eps: f32) -> Result<f32> {
    require_same_shape(target, pred)?;
    let eps_sq = eps * eps;
    let per_element = Zip::from(pred)
        .and(target)
        .map_collect(|&p, &t| ((p - t) * (p - t) + eps_sq).sqrt());
    mean("charbonnier loss over an empty tensor", &per_element)
}

/// Charbonnier loss between the projected prediction and the RAW anchor.
pub fn anchor_charbonnier_loss(
    pred_rgb48: &Array4<f32>,
    target_mosaic: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
    eps: f32,
) -> Result<f32> {
    let predicted = project_against(pred_rgb48, target_mosaic, pattern, scale)?;
    charbonnier_loss(&predicted, target_mosaic, eps)
}

/// Anchor loss together with its gradient w.r.t. the RGB48 prediction.
#[derive(Debug, Clone)]
pub struct AnchorLoss {
    pub loss: f32,
    pub grad_rgb48: Array4<f32>,
}

/// [`anchor_charbonnier_loss`] plus `d loss / d pred_rgb48`, pulled back
/// through the adjoint of the forward operator.
pub fn anchor_charbonnier_loss_with_grad(
    pred_rgb48: &Array4<f32>,
    target_mosaic: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
    eps: f32,
) -> Result<AnchorLoss> {
    let predicted = project_against(pred_rgb48, target_mosaic, pattern, scale)?;
    let loss = charbonnier_loss(&predicted, target_mosaic, eps)?;

    let count = predicted.len() as f32;
    let eps_sq = eps * eps;
    let grad_mosaic = Zip::from(&predicted)
        .and(target_mosaic)
        .map_collect(|&p, &t| {
            let r = p - t;
            r / (r * r + eps_sq).sqrt() / count
        });
    let grad_rgb48 = quad_bayer_adjoint(&grad_mosaic, pattern, scale)?;

    Ok(AnchorLoss { loss, grad_rgb48 })
}

fn project_against(
    pred_rgb48: &Array4<f32>,
    target_mosaic: &Array4<f32>,
    pattern: CfaPattern,
    scale: &ChannelScale,
) -> Result<Array4<f32>> {
    let predicted = quad_bayer_forward(pred_rgb48, pattern, scale)?;
    if predicted.shape() != target_mosaic.shape() {
        return Err(SensorError::domain(predicted.shape(), target_mosaic.shape()));
    }
    Ok(predicted)
}
