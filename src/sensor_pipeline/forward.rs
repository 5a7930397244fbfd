//! Quad-Bayer forward operator
//!
//! The single source of truth for what the RAW sensor records given a
//! full-resolution linear RGB scene. Losses, baselines, risk checks and
//! analysis all call [`quad_bayer_forward`]; none of them re-derive it.

mod quad_bayer;
pub mod types;

pub use quad_bayer::{quad_bayer_adjoint, quad_bayer_forward};
pub use types::ChannelScale;
