//! Evaluation metrics
//!
//! Anchor-space fidelity (PSNR/SSIM on the mosaiced RAW), edge consistency
//! after a global render, and per-CFA residual histograms that make
//! color-channel drift visible.

mod gradient;
mod histogram;
mod psnr;
mod ssim;

pub use gradient::{GradientConsistency, gradient_consistency_metrics};
pub use histogram::{CfaHistograms, HistogramConfig, per_cfa_error_histogram};
pub use psnr::{mse, psnr};
pub use ssim::{SsimConfig, ssim};
