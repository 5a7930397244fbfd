use ndarray::{Array1, Array2, Array4, ArrayView2, Axis, Zip};

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::{mean, require_same_shape};

/// Window and dynamic range for [`ssim`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsimConfig {
    pub max_val: f32,
    pub window_size: usize,
    pub sigma: f32,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            max_val: 1.0,
            window_size: 11,
            sigma: 1.5,
        }
    }
}

impl SsimConfig {
    fn validate(&self) -> Result<()> {
        if !(self.max_val > 0.0) || !self.max_val.is_finite() {
            return Err(SensorError::InvalidConfig(format!(
                "ssim max_val must be positive and finite, got {}",
                self.max_val
            )));
        }
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(SensorError::InvalidConfig(format!(
                "ssim window size must be odd, got {}",
                self.window_size
            )));
        }
        if !(self.sigma > 0.0) {
            return Err(SensorError::InvalidConfig(format!(
                "ssim sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Gaussian-windowed structural similarity, averaged over every pixel,
/// channel and batch element. Each channel is filtered on its own with
/// zero padding so the SSIM map keeps the input size.
pub fn ssim(pred: &Array4<f32>, target: &Array4<f32>, config: &SsimConfig) -> Result<f32> {
    require_same_shape(target, pred)?;
    config.validate()?;

    let kernel = gaussian_kernel(config.window_size, config.sigma);
    let c1 = (0.01 * config.max_val).powi(2);
    let c2 = (0.03 * config.max_val).powi(2);

    let (batch, channels, height, width) = pred.dim();
    let mut ssim_map = Array4::<f32>::zeros((batch, channels, height, width));

    for n in 0..batch {
        for c in 0..channels {
            let p = pred.index_axis(Axis(0), n).index_axis(Axis(0), c).to_owned();
            let t = target.index_axis(Axis(0), n).index_axis(Axis(0), c).to_owned();

            let mu_p = filter(p.view(), &kernel);
            let mu_t = filter(t.view(), &kernel);
            let e_pp = filter((&p * &p).view(), &kernel);
            let e_tt = filter((&t * &t).view(), &kernel);
            let e_pt = filter((&p * &t).view(), &kernel);

            let mut out = ssim_map.index_axis_mut(Axis(0), n);
            let mut out = out.index_axis_mut(Axis(0), c);
            Zip::from(&mut out)
                .and(&mu_p)
                .and(&mu_t)
                .and(&e_pp)
                .and(&e_tt)
                .and(&e_pt)
                .for_each(|o, &mp, &mt, &pp, &tt, &pt| {
                    let mu_pt = mp * mt;
                    let var_p = pp - mp * mp;
                    let var_t = tt - mt * mt;
                    let cov = pt - mu_pt;
                    *o = ((2.0 * mu_pt + c1) * (2.0 * cov + c2))
                        / ((mp * mp + mt * mt + c1) * (var_p + var_t + c2));
                });
        }
    }

    mean("ssim map", &ssim_map)
}

fn gaussian_kernel(size: usize, sigma: f32) -> Array1<f32> {
    let half = (size / 2) as f32;
    let weights = Array1::from_shape_fn(size, |i| {
        let d = i as f32 - half;
        (-(d * d) / (2.0 * sigma * sigma)).exp()
    });
    let total = weights.sum();
    weights / total
}

/// Separable same-size convolution with zero padding.
fn filter(plane: ArrayView2<f32>, kernel: &Array1<f32>) -> Array2<f32> {
    let (height, width) = plane.dim();
    let radius = (kernel.len() / 2) as isize;
    let tap = |k: usize| k as isize - radius;

    let horizontal = Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .filter_map(|(k, &w)| {
                let xx = x as isize + tap(k);
                (0..width as isize).contains(&xx).then(|| w * plane[[y, xx as usize]])
            })
            .sum::<f32>()
    });

    Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .filter_map(|(k, &w)| {
                let yy = y as isize + tap(k);
                (0..height as isize).contains(&yy).then(|| w * horizontal[[yy as usize, x]])
            })
            .sum::<f32>()
    })
}
