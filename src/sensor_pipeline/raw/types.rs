//! Decoded RAW capture

use ndarray::Array4;

use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::common::error::{Result, SensorError};

/// Bit width of the `u16` sample container.
const U16_BITS: u32 = 16;

/// Single-plane Bayer capture as read off the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    pub width: usize,
    pub height: usize,
    /// Row-major photosite values
    pub data: Vec<u16>,
    /// Layout of the top-left 2x2 photosites
    pub pattern: CfaPattern,
    pub black_level: u16,
    pub white_level: u16,
    /// As-shot white-balance multipliers `[r, g, b, e]`; NaN when unknown.
    pub wb_coeffs: [f32; 4],
}

impl RawCapture {
    /// Bits needed for the white level, e.g. 4095 gives 12.
    pub fn bits_per_sample(&self) -> u32 {
        if self.white_level == 0 {
            U16_BITS
        } else {
            U16_BITS - self.white_level.leading_zeros()
        }
    }

    /// Largest even `(height, width)` that fits the capture.
    pub fn even_dims(&self) -> (usize, usize) {
        (self.height & !1, self.width & !1)
    }

    /// `(1, 1, H, W)` mosaic in `[0, 1]`: black level subtracted, divided by
    /// the white-black range, cropped at the bottom/right to even size so the
    /// top-left Bayer phase is kept.
    pub fn to_anchor_mosaic(&self) -> Result<Array4<f32>> {
        if self.data.len() != self.width * self.height {
            return Err(SensorError::InvalidDimensions(self.width, self.height));
        }
        let (height, width) = self.even_dims();
        if height == 0 || width == 0 {
            return Err(SensorError::InvalidDimensions(self.width, self.height));
        }

        let black = self.black_level as f32;
        let range = (self.white_level as f32 - black).max(1.0);
        let stride = self.width;
        Ok(Array4::from_shape_fn((1, 1, height, width), |(_, _, y, x)| {
            ((self.data[y * stride + x] as f32 - black) / range).clamp(0.0, 1.0)
        }))
    }

    /// AsShotNeutral from the white-balance multipliers: their reciprocals,
    /// normalized so green is 1. `None` when the multipliers are unusable.
    pub fn as_shot_neutral(&self) -> Option<[f32; 3]> {
        let [r, g, b, _] = self.wb_coeffs;
        if [r, g, b].iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return None;
        }
        Some([g / r, 1.0, g / b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(width: usize, height: usize) -> RawCapture {
        RawCapture {
            width,
            height,
            data: (0..width * height).map(|i| (i % 4096) as u16).collect(),
            pattern: CfaPattern::Rggb,
            black_level: 0,
            white_level: 4095,
            wb_coeffs: [2.0, 1.0, 1.6, f32::NAN],
        }
    }

    #[test]
    fn test_bits_per_sample_from_white_level() {
        assert_eq!(capture(2, 2).bits_per_sample(), 12);
        let mut c = capture(2, 2);
        c.white_level = 16383;
        assert_eq!(c.bits_per_sample(), 14);
        c.white_level = 0;
        assert_eq!(c.bits_per_sample(), 16);
    }

    #[test]
    fn test_anchor_mosaic_normalizes_and_crops() {
        let mut c = capture(5, 3);
        c.black_level = 1;
        c.white_level = 9;
        c.data[7] = 12;
        let mosaic = c.to_anchor_mosaic().unwrap();

        assert_eq!(mosaic.shape(), &[1, 1, 2, 4]);
        // data[0] = 0 sits below black
        assert_eq!(mosaic[[0, 0, 0, 0]], 0.0);
        assert!((mosaic[[0, 0, 0, 3]] - 0.25).abs() < 1e-6);
        // second row starts at data[5]
        assert!((mosaic[[0, 0, 1, 0]] - 0.5).abs() < 1e-6);
        assert!((mosaic[[0, 0, 1, 3]] - 0.875).abs() < 1e-6);
        // data[7] = 12 sits above white
        assert_eq!(mosaic[[0, 0, 1, 2]], 1.0);
    }

    #[test]
    fn test_anchor_mosaic_rejects_bad_buffers() {
        let mut c = capture(4, 4);
        c.data.pop();
        assert!(matches!(
            c.to_anchor_mosaic(),
            Err(SensorError::InvalidDimensions(4, 4))
        ));
        assert!(matches!(
            capture(1, 4).to_anchor_mosaic(),
            Err(SensorError::InvalidDimensions(1, 4))
        ));
    }

    #[test]
    fn test_as_shot_neutral() {
        let neutral = capture(2, 2).as_shot_neutral().unwrap();
        assert_eq!(neutral, [0.5, 1.0, 0.625]);

        let mut c = capture(2, 2);
        c.wb_coeffs = [f32::NAN; 4];
        assert_eq!(c.as_shot_neutral(), None);
        c.wb_coeffs = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(c.as_shot_neutral(), None);
    }
}
