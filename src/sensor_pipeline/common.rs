//! Common utilities module
//!
//! Error taxonomy, shape validation and the small array helpers shared by
//! every stage that projects through the forward operator.

pub mod error;
pub mod render;
pub mod tensor;

pub use error::{Result, SensorError};
pub use render::{Ccm, GlobalRender, linear_curve};
