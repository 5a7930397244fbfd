//! Shape checks and array helpers over NCHW `Array4<f32>` tensors.

use ndarray::{Array3, Array4, ArrayBase, Axis, Data, Dimension, s};

use crate::sensor_pipeline::common::error::{Result, SensorError};

/// Requires `(B, 3, H, W)` with even `H` and `W`.
pub fn validate_rgb48(name: &str, rgb: &Array4<f32>) -> Result<()> {
    let (_, channels, height, width) = rgb.dim();
    if channels != 3 {
        return Err(SensorError::Shape(format!(
            "{name} must have shape (B, 3, H, W), got {:?}",
            rgb.shape()
        )));
    }
    require_even(name, height, width)
}

/// Requires `(B, 1, h, w)`.
pub fn validate_mosaic(name: &str, mosaic: &Array4<f32>) -> Result<()> {
    if mosaic.dim().1 != 1 {
        return Err(SensorError::Shape(format!(
            "{name} must have shape (B, 1, H, W), got {:?}",
            mosaic.shape()
        )));
    }
    Ok(())
}

pub fn require_even(name: &str, height: usize, width: usize) -> Result<()> {
    if height % 2 != 0 || width % 2 != 0 {
        return Err(SensorError::Shape(format!(
            "{name} height and width must be even for 2x2 binning, got {height}x{width}"
        )));
    }
    Ok(())
}

pub fn require_same_shape<S1, S2, D>(
    expected: &ArrayBase<S1, D>,
    actual: &ArrayBase<S2, D>,
) -> Result<()>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if expected.shape() != actual.shape() {
        return Err(SensorError::domain(expected.shape(), actual.shape()));
    }
    Ok(())
}

/// Lifts a single `(C, H, W)` image into a batch of one.
pub fn with_batch_axis(image: Array3<f32>) -> Array4<f32> {
    image.insert_axis(Axis(0))
}

/// Mean of any array, failing on an empty one rather than returning NaN.
pub fn mean<S, D>(what: &str, values: &ArrayBase<S, D>) -> Result<f32>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    if values.is_empty() {
        return Err(SensorError::EmptyAggregation(what.to_string()));
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Ok((sum / values.len() as f64) as f32)
}

/// Forward differences: horizontal `(B, C, H, W-1)` and vertical `(B, C, H-1, W)`.
/// A zero-length axis yields empty differences along it.
pub fn spatial_gradients(x: &Array4<f32>) -> (Array4<f32>, Array4<f32>) {
    let (batch, channels, height, width) = x.dim();
    let dx = if width == 0 {
        Array4::zeros((batch, channels, height, 0))
    } else {
        &x.slice(s![.., .., .., 1..]) - &x.slice(s![.., .., .., ..-1])
    };
    let dy = if height == 0 {
        Array4::zeros((batch, channels, 0, width))
    } else {
        &x.slice(s![.., .., 1.., ..]) - &x.slice(s![.., .., ..-1, ..])
    };
    (dx, dy)
}

/// Mean absolute difference of two equally shaped arrays.
pub fn mean_abs_diff(what: &str, a: &Array4<f32>, b: &Array4<f32>) -> Result<f32> {
    require_same_shape(a, b)?;
    mean(what, &(a - b).mapv(f32::abs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_gradients_shapes_and_values() {
        let x = Array4::from_shape_fn((1, 1, 3, 4), |(_, _, y, x)| (y * 10 + x) as f32);
        let (dx, dy) = spatial_gradients(&x);
        assert_eq!(dx.shape(), &[1, 1, 3, 3]);
        assert_eq!(dy.shape(), &[1, 1, 2, 4]);
        assert!(dx.iter().all(|&v| v == 1.0));
        assert!(dy.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_gradients_of_zero_size_are_empty() {
        let x = Array4::<f32>::zeros((1, 2, 0, 0));
        let (dx, dy) = spatial_gradients(&x);
        assert_eq!(dx.shape(), &[1, 2, 0, 0]);
        assert_eq!(dy.shape(), &[1, 2, 0, 0]);

        let (dx, dy) = spatial_gradients(&Array4::<f32>::zeros((1, 1, 0, 3)));
        assert_eq!(dx.shape(), &[1, 1, 0, 2]);
        assert_eq!(dy.shape(), &[1, 1, 0, 3]);
    }

    #[test]
    fn test_mean_of_empty_is_an_error() {
        let empty = Array4::<f32>::zeros((1, 1, 0, 4));
        assert!(matches!(
            mean("empty", &empty),
            Err(SensorError::EmptyAggregation(_))
        ));
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let rgb = Array4::<f32>::zeros((1, 3, 4, 5));
        assert!(matches!(validate_rgb48("rgb48", &rgb), Err(SensorError::Shape(_))));
        let two_channel = Array4::<f32>::zeros((1, 2, 4, 4));
        assert!(matches!(
            validate_rgb48("rgb48", &two_channel),
            Err(SensorError::Shape(_))
        ));
    }
}
