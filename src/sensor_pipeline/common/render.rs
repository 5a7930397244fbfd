//! Global-only rendering (color matrix + tone curve) used by the edge losses,
//! edge metrics and analysis renders.

use ndarray::{Array2, Array4};

use crate::sensor_pipeline::common::error::{Result, SensorError};

/// 3x3 color-correction matrix, row-major: `out[i] = sum_j m[i][j] * in[j]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ccm(pub [[f32; 3]; 3]);

impl Default for Ccm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ccm {
    pub fn identity() -> Self {
        Ccm([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn diagonal(r: f32, g: f32, b: f32) -> Self {
        Ccm([[r, 0.0, 0.0], [0.0, g, 0.0], [0.0, 0.0, b]])
    }

    pub fn from_array2(matrix: &Array2<f32>) -> Result<Self> {
        if matrix.dim() != (3, 3) {
            return Err(SensorError::InvalidConfig(format!(
                "ccm must have shape (3, 3), got {:?}",
                matrix.shape()
            )));
        }
        let mut m = [[0.0f32; 3]; 3];
        for ((i, j), &v) in matrix.indexed_iter() {
            m[i][j] = v;
        }
        Ok(Ccm(m))
    }

    pub fn from_slice(values: &[f32]) -> Result<Self> {
        if values.len() != 9 {
            return Err(SensorError::InvalidConfig(format!(
                "ccm needs 9 row-major values, got {}",
                values.len()
            )));
        }
        let mut m = [[0.0f32; 3]; 3];
        for (idx, &v) in values.iter().enumerate() {
            m[idx / 3][idx % 3] = v;
        }
        Ok(Ccm(m))
    }
}

/// Identity tone curve.
pub fn linear_curve(value: f32) -> f32 {
    value
}

/// A fixed global render: CCM over the channel axis followed by an
/// elementwise, monotonic tone curve.
#[derive(Clone, Copy)]
pub struct GlobalRender<'a> {
    pub ccm: Ccm,
    pub tone_curve: &'a dyn Fn(f32) -> f32,
}

impl Default for GlobalRender<'static> {
    fn default() -> Self {
        Self {
            ccm: Ccm::identity(),
            tone_curve: &linear_curve,
        }
    }
}

impl std::fmt::Debug for GlobalRender<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalRender")
            .field("ccm", &self.ccm)
            .finish_non_exhaustive()
    }
}

impl<'a> GlobalRender<'a> {
    pub fn new(ccm: Ccm, tone_curve: &'a dyn Fn(f32) -> f32) -> Self {
        Self { ccm, tone_curve }
    }

    pub fn with_ccm(ccm: Ccm) -> GlobalRender<'static> {
        GlobalRender {
            ccm,
            ..GlobalRender::default()
        }
    }

    /// Renders an RGB tensor `(B, 3, H, W)`; odd spatial sizes are allowed.
    pub fn apply(&self, rgb: &Array4<f32>) -> Result<Array4<f32>> {
        let (batch, channels, height, width) = rgb.dim();
        if channels != 3 {
            return Err(SensorError::Shape(format!(
                "render input must have 3 channels, got {channels}"
            )));
        }
        let m = &self.ccm.0;
        let curve = self.tone_curve;
        Ok(Array4::from_shape_fn(
            (batch, 3, height, width),
            |(n, c, y, x)| {
                let mixed = m[c][0] * rgb[[n, 0, y, x]]
                    + m[c][1] * rgb[[n, 1, y, x]]
                    + m[c][2] * rgb[[n, 2, y, x]];
                curve(mixed)
            },
        ))
    }

    /// Render for display: same as [`GlobalRender::apply`], clamped at zero.
    pub fn apply_display(&self, rgb: &Array4<f32>) -> Result<Array4<f32>> {
        Ok(self.apply(rgb)?.mapv(|v| v.max(0.0)))
    }
}
