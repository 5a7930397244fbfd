//! Baseline paths for risk mitigation
//!
//! Baseline A rescales the tone-mapped input into the RAW anchor exposure
//! with one robust percentile gain per frame, after a global inverse tone
//! curve. No spatial variation, fully deterministic.
//!
//! Baseline B estimates a smooth spatial gain field from the anchor mismatch
//! and multiplies it into the input, with no residual/detail term. It shows
//! how much of the error gain alone can explain.
//!
//! Both are built on the forward operator and double as comparison floors
//! the learned model has to beat. The composition step that turns the
//! network's gain/detail heads into a linear prediction lives here too.

mod composition;
mod gain_field;
mod global_gain;
pub mod resample;
pub mod types;

use ndarray::{Array4, Zip};

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{validate_mosaic, validate_rgb48};

pub use composition::{
    GAIN_FIELD_SCALE,
    GainFieldPrediction,
    build_model_inputs,
    compose_linear_prediction,
    upsample_guidance,
};
pub use gain_field::gain_field_baseline;
pub use global_gain::global_gain_baseline;
pub use resample::BoxNormalization;
pub use types::{
    BaselineGain,
    BaselineOutput,
    GainFieldConfig,
    GainFieldConfigBuilder,
    GainRange,
    GlobalGainConfig,
    GlobalGainConfigBuilder,
};

/// Checks a ProRAW48 / anchor pair before either baseline runs.
pub(crate) fn validate_pair(proraw_rgb48: &Array4<f32>, anchor_mosaic: &Array4<f32>) -> Result<()> {
    validate_rgb48("proraw_rgb48", proraw_rgb48)?;
    validate_mosaic("anchor_mosaic", anchor_mosaic)?;
    if proraw_rgb48.dim().0 != anchor_mosaic.dim().0 {
        return Err(SensorError::Shape(format!(
            "batch size mismatch between proraw_rgb48 ({}) and anchor_mosaic ({})",
            proraw_rgb48.dim().0,
            anchor_mosaic.dim().0
        )));
    }
    Ok(())
}

/// Element-wise `anchor / max(simulated, eps)`.
pub(crate) fn anchor_ratio(
    anchor_mosaic: &Array4<f32>,
    simulated: &Array4<f32>,
    eps: f32,
) -> Array4<f32> {
    Zip::from(anchor_mosaic)
        .and(simulated)
        .map_collect(|&anchor, &sim| anchor / sim.max(eps))
}
