use ndarray::Array4;
use serde::Serialize;
use tracing::{debug, warn};

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::tensor::require_same_shape;
use crate::sensor_pipeline::evaluation::psnr;

#[derive(Debug, Clone, Copy)]
pub struct MisalignmentConfig {
    /// Search radius in anchor pixels along each axis.
    pub max_shift: usize,
    /// Minimum unshifted PSNR (dB) for the pair to count as aligned.
    pub psnr_threshold: f32,
}

impl Default for MisalignmentConfig {
    fn default() -> Self {
        Self {
            max_shift: 2,
            psnr_threshold: 35.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentReport {
    /// `(dy, dx)` roll applied to the simulated mosaic that best matches.
    pub best_shift: (isize, isize),
    pub best_psnr: f32,
    pub reference_psnr: f32,
    pub is_aligned: bool,
}

/// Circular shift over the two spatial axes: `out[y][x] = in[y - dy][x - dx]`.
fn roll_spatial(input: &Array4<f32>, dy: isize, dx: isize) -> Array4<f32> {
    let (_, _, height, width) = input.dim();
    let (h, w) = (height as isize, width as isize);
    Array4::from_shape_fn(input.raw_dim(), |(n, c, y, x)| {
        let sy = (y as isize - dy).rem_euclid(h) as usize;
        let sx = (x as isize - dx).rem_euclid(w) as usize;
        input[[n, c, sy, sx]]
    })
}

/// Searches circular shifts within `max_shift` for the best PSNR against the
/// anchor. The pair is aligned only if no shift beats the unshifted one and
/// the unshifted PSNR clears the threshold.
pub fn detect_misalignment(
    anchor_mosaic: &Array4<f32>,
    simulated_mosaic: &Array4<f32>,
    config: &MisalignmentConfig,
) -> Result<AlignmentReport> {
    require_same_shape(anchor_mosaic, simulated_mosaic)?;

    let (_, _, height, width) = anchor_mosaic.dim();
    let radius = isize::try_from(config.max_shift)
        .ok()
        .filter(|_| config.max_shift <= height.max(width))
        .ok_or_else(|| {
            SensorError::InvalidConfig(format!(
                "max_shift {} exceeds the {height}x{width} mosaic",
                config.max_shift
            ))
        })?;
    let mut best_psnr = f32::NEG_INFINITY;
    let mut best_shift = (0, 0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let shifted = roll_spatial(simulated_mosaic, dy, dx);
            let score = psnr(&shifted, anchor_mosaic, 1.0)?;
            if score > best_psnr {
                best_psnr = score;
                best_shift = (dy, dx);
            }
        }
    }

    let reference_psnr = psnr(simulated_mosaic, anchor_mosaic, 1.0)?;
    let is_aligned = best_shift == (0, 0) && reference_psnr >= config.psnr_threshold;
    debug!(?best_shift, best_psnr, reference_psnr, "misalignment search");
    if !is_aligned {
        warn!(
            ?best_shift,
            reference_psnr,
            threshold = config.psnr_threshold,
            "simulated mosaic is not aligned with the anchor"
        );
    }

    Ok(AlignmentReport {
        best_shift,
        best_psnr,
        reference_psnr,
        is_aligned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_pipeline::common::error::SensorError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_mosaic(seed: u64) -> Array4<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array4::from_shape_fn((1, 1, 6, 6), |_| rng.random::<f32>())
    }

    #[test]
    fn test_roll_wraps_around() {
        let input = Array4::from_shape_fn((1, 1, 3, 1), |(_, _, y, _)| y as f32);
        let rolled = roll_spatial(&input, 1, 0);
        let values: Vec<f32> = rolled.iter().copied().collect();
        assert_eq!(values, vec![2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_aligned_pair() {
        let anchor = random_mosaic(11);
        let config = MisalignmentConfig {
            psnr_threshold: 50.0,
            ..Default::default()
        };

        let report = detect_misalignment(&anchor, &anchor.clone(), &config).unwrap();

        assert!(report.is_aligned);
        assert_eq!(report.best_shift, (0, 0));
        assert!(report.reference_psnr.is_infinite());
    }

    #[test]
    fn test_shifted_pair_finds_inverse_roll() {
        let anchor = random_mosaic(11);
        let simulated = roll_spatial(&anchor, 1, 0);
        let config = MisalignmentConfig {
            psnr_threshold: 50.0,
            ..Default::default()
        };

        let report = detect_misalignment(&anchor, &simulated, &config).unwrap();

        assert!(!report.is_aligned);
        assert_eq!(report.best_shift, (-1, 0));
        assert!(report.best_psnr > report.reference_psnr);
    }

    #[test]
    fn test_low_psnr_is_not_aligned() {
        let anchor = Array4::<f32>::zeros((1, 1, 4, 4));
        let simulated = Array4::<f32>::from_elem((1, 1, 4, 4), 0.5);

        let report =
            detect_misalignment(&anchor, &simulated, &MisalignmentConfig::default()).unwrap();

        // every shift scores the same, so the first candidate wins
        assert_eq!(report.best_shift, (-2, -2));
        assert!(!report.is_aligned);
    }

    #[test]
    fn test_shift_larger_than_mosaic_is_rejected() {
        let anchor = random_mosaic(2);
        for max_shift in [7, usize::MAX] {
            let config = MisalignmentConfig {
                max_shift,
                ..Default::default()
            };
            assert!(matches!(
                detect_misalignment(&anchor, &anchor, &config),
                Err(SensorError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let anchor = Array4::<f32>::zeros((1, 1, 4, 4));
        let simulated = Array4::<f32>::zeros((1, 1, 4, 6));
        assert!(matches!(
            detect_misalignment(&anchor, &simulated, &MisalignmentConfig::default()),
            Err(SensorError::DomainMismatch { .. })
        ));
    }
}
