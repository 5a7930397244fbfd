//! Training losses
//!
//! Anchor fidelity goes through the forward operator; the edge loss and the
//! gain regulariser work on full-resolution tensors directly.

mod anchor;
mod gain;
mod gradient;

pub use anchor::{
    AnchorLoss,
    DEFAULT_CHARBONNIER_EPS,
    anchor_charbonnier_loss,
    anchor_charbonnier_loss_with_grad,
    charbonnier_loss,
};
pub use gain::{GainRegularization, GainRegularizationConfig, gain_regularization};
pub use gradient::gradient_detail_loss;
