//! Risk-mitigation guards
//!
//! Cheap checks run next to training and ingest: a small circular shift
//! search against the anchor, an independent reference for the quad binner,
//! and an AsShotNeutral-style white-balance estimate.

mod binner;
mod misalignment;
mod white_balance;

pub use binner::quad_binner_residual;
pub use misalignment::{AlignmentReport, MisalignmentConfig, detect_misalignment};
pub use white_balance::{
    DEFAULT_WB_TOLERANCE,
    WhiteBalanceCheck,
    estimate_white_balance_neutral,
    white_balance_consistency,
};
