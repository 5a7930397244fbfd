//! Resampling helpers shared by the gain-field paths.

use ndarray::{Array2, Array4, ArrayView2};

/// Bilinear resize of every `(H, W)` plane to `(out_h, out_w)` with
/// half-pixel centers (no corner alignment), edge-clamped.
pub fn upsample_bilinear(input: &Array4<f32>, out_h: usize, out_w: usize) -> Array4<f32> {
    let (batch, channels, _, _) = input.dim();
    let mut output = Array4::<f32>::zeros((batch, channels, out_h, out_w));
    for (mut out_n, in_n) in output.outer_iter_mut().zip(input.outer_iter()) {
        for (mut out_c, in_c) in out_n.outer_iter_mut().zip(in_n.outer_iter()) {
            out_c.assign(&resize_plane(in_c, out_h, out_w));
        }
    }
    output
}

fn source_taps(dst: usize, in_len: usize, out_len: usize) -> (usize, usize, f32) {
    let scale = in_len as f32 / out_len as f32;
    let src = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
    let lo = (src.floor() as usize).min(in_len - 1);
    let hi = (lo + 1).min(in_len - 1);
    (lo, hi, src - lo as f32)
}

fn resize_plane(plane: ArrayView2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (in_h, in_w) = plane.dim();
    if in_h == 0 || in_w == 0 {
        return Array2::zeros((out_h, out_w));
    }
    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let (y0, y1, fy) = source_taps(y, in_h, out_h);
        let (x0, x1, fx) = source_taps(x, in_w, out_w);
        let top = plane[[y0, x0]] * (1.0 - fx) + plane[[y0, x1]] * fx;
        let bottom = plane[[y1, x0]] * (1.0 - fx) + plane[[y1, x1]] * fx;
        top * (1.0 - fy) + bottom * fy
    })
}

/// Divisor used by [`box_smooth`] at the borders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoxNormalization {
    /// Zero padding divided by `kernel * kernel`; borders darken.
    #[default]
    ZeroPadded,
    /// Divide by the number of taps that fall inside the plane.
    InBounds,
}

/// Same-size `kernel x kernel` box average with symmetric padding of
/// `kernel / 2`.
pub fn box_smooth(input: &Array4<f32>, kernel: usize, normalization: BoxNormalization) -> Array4<f32> {
    if kernel <= 1 {
        return input.clone();
    }
    let radius = kernel / 2;
    let mut output = Array4::<f32>::zeros(input.raw_dim());
    for (mut out_n, in_n) in output.outer_iter_mut().zip(input.outer_iter()) {
        for (mut out_c, in_c) in out_n.outer_iter_mut().zip(in_n.outer_iter()) {
            out_c.assign(&box_plane(in_c, radius, normalization));
        }
    }
    output
}

fn box_plane(plane: ArrayView2<f32>, radius: usize, normalization: BoxNormalization) -> Array2<f32> {
    let (height, width) = plane.dim();
    let full_window = ((2 * radius + 1) * (2 * radius + 1)) as f64;

    // summed-area table, one row/column of zeros in front
    let mut integral = Array2::<f64>::zeros((height + 1, width + 1));
    for y in 0..height {
        for x in 0..width {
            integral[[y + 1, x + 1]] = plane[[y, x]] as f64 + integral[[y, x + 1]]
                + integral[[y + 1, x]]
                - integral[[y, x]];
        }
    }

    Array2::from_shape_fn((height, width), |(y, x)| {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        let x0 = x.saturating_sub(radius);
        let x1 = (x + radius + 1).min(width);
        let sum = integral[[y1, x1]] - integral[[y0, x1]] - integral[[y1, x0]] + integral[[y0, x0]];
        let taps = match normalization {
            BoxNormalization::ZeroPadded => full_window,
            BoxNormalization::InBounds => ((y1 - y0) * (x1 - x0)) as f64,
        };
        (sum / taps) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_bilinear_half_pixel_centers() {
        let input = Array4::from_shape_fn((1, 1, 1, 2), |(_, _, _, x)| x as f32);
        let up = upsample_bilinear(&input, 1, 4);
        let row: Vec<f32> = up.iter().copied().collect();
        assert_eq!(row, vec![0.0, 0.25, 0.75, 1.0]);
    }

    #[test]
    fn test_bilinear_keeps_constants() {
        let input = Array4::<f32>::from_elem((2, 3, 3, 5), 1.75);
        let up = upsample_bilinear(&input, 6, 10);
        assert_eq!(up.shape(), &[2, 3, 6, 10]);
        assert!(up.iter().all(|&v| (v - 1.75).abs() < 1e-6));
    }

    #[test]
    fn test_box_smooth_zero_pads_borders() {
        let input = Array4::<f32>::from_elem((1, 1, 5, 5), 2.0);
        let smoothed = box_smooth(&input, 3, BoxNormalization::ZeroPadded);
        assert!((smoothed[[0, 0, 2, 2]] - 2.0).abs() < 1e-6);
        // corner: 4 of 9 taps in bounds
        assert!((smoothed[[0, 0, 0, 0]] - 8.0 / 9.0).abs() < 1e-6);
        // edge: 6 of 9 taps in bounds
        assert!((smoothed[[0, 0, 0, 2]] - 12.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_box_smooth_in_bounds_keeps_constants() {
        let input = Array4::<f32>::from_elem((1, 1, 5, 5), 2.0);
        let smoothed = box_smooth(&input, 3, BoxNormalization::InBounds);
        assert!(smoothed.iter().all(|&v| (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn test_box_smooth_averages_neighbourhood() {
        let mut input = Array4::<f32>::zeros((1, 1, 3, 3));
        input[[0, 0, 1, 1]] = 9.0;
        let smoothed = box_smooth(&input, 3, BoxNormalization::ZeroPadded);
        assert!((smoothed[[0, 0, 1, 1]] - 1.0).abs() < 1e-6);
        assert!((smoothed[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);

        let in_bounds = box_smooth(&input, 3, BoxNormalization::InBounds);
        // corner sees a 2x2 window
        assert!((in_bounds[[0, 0, 0, 0]] - 2.25).abs() < 1e-6);
    }
}
