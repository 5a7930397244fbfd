use ndarray::{Array4, ArrayView4, s};

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::render::GlobalRender;
use crate::sensor_pipeline::common::tensor::{mean, require_same_shape, spatial_gradients};

const COSINE_EPS: f64 = 1e-8;
const MAGNITUDE_EPS: f32 = 1e-12;

/// Edge agreement between a prediction and its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientConsistency {
    /// Cosine similarity of the horizontal gradient fields.
    pub corr_x: f32,
    /// Cosine similarity of the vertical gradient fields.
    pub corr_y: f32,
    /// Mean absolute difference of gradient magnitudes; grows with halos.
    pub halo_l1: f32,
}

impl GradientConsistency {
    pub fn entries(&self) -> [(&'static str, f32); 3] {
        [
            ("corr_x", self.corr_x),
            ("corr_y", self.corr_y),
            ("halo_l1", self.halo_l1),
        ]
    }
}

/// Gradient correlation and halo indicator after the same global render the
/// edge loss uses. Magnitudes pair `dx` and `dy` on the `(H-1, W-1)` grid
/// where both forward differences exist.
pub fn gradient_consistency_metrics(
    pred_rgb: &Array4<f32>,
    reference_rgb: &Array4<f32>,
    render: &GlobalRender<'_>,
) -> Result<GradientConsistency> {
    require_same_shape(reference_rgb, pred_rgb)?;
    let (_, _, height, width) = pred_rgb.dim();
    if height < 2 || width < 2 {
        return Err(SensorError::Shape(format!(
            "gradient metrics need at least 2x2 pixels, got {height}x{width}"
        )));
    }

    let pred = render.apply(pred_rgb)?;
    let reference = render.apply(reference_rgb)?;
    let (pred_dx, pred_dy) = spatial_gradients(&pred);
    let (ref_dx, ref_dy) = spatial_gradients(&reference);

    let corr_x = cosine_similarity(pred_dx.view(), ref_dx.view());
    let corr_y = cosine_similarity(pred_dy.view(), ref_dy.view());

    let pred_mag = magnitude(&pred_dx, &pred_dy);
    let ref_mag = magnitude(&ref_dx, &ref_dy);
    let halo_l1 = mean("gradient magnitudes", &(&pred_mag - &ref_mag).mapv(f32::abs))?;

    Ok(GradientConsistency {
        corr_x,
        corr_y,
        halo_l1,
    })
}

fn magnitude(dx: &Array4<f32>, dy: &Array4<f32>) -> Array4<f32> {
    let dx = dx.slice(s![.., .., ..-1, ..]);
    let dy = dy.slice(s![.., .., .., ..-1]);
    let mut out = dx.mapv(|v| v * v);
    out.zip_mut_with(&dy, |m, &v| *m = (*m + v * v + MAGNITUDE_EPS).sqrt());
    out
}

fn cosine_similarity(a: ArrayView4<f32>, b: ArrayView4<f32>) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt() + COSINE_EPS)) as f32
}
