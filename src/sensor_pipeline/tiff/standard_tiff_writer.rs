use std::io::{Cursor, Write};

use ndarray::{Array4, Axis};
use tiff::encoder::colortype::{ColorType, Gray16, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::tiff::types::{ExportConfig, TiffCompression};
use crate::sensor_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn quantize(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

fn single_frame(name: &str, tensor: &Array4<f32>, channels: usize) -> Result<(usize, usize)> {
    let (batch, c, height, width) = tensor.dim();
    if batch != 1 || c != channels {
        return Err(SensorError::Shape(format!(
            "{name} export expects shape (1, {channels}, H, W), got {:?}",
            tensor.shape()
        )));
    }
    if width == 0 || height == 0 {
        return Err(SensorError::InvalidDimensions(width, height));
    }
    Ok((width, height))
}

impl StandardTiffWriter {
    fn encode<C>(
        &self,
        width: usize,
        height: usize,
        samples: &[u16],
        output: &mut dyn Write,
        config: &ExportConfig,
    ) -> Result<()>
    where
        C: ColorType<Inner = u16>,
    {
        debug!("Encoding TIFF image: {}x{}", width, height);

        let compression = match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| SensorError::EncodeError(e.to_string()))?
            .with_compression(compression);
        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        encoder
            .write_image::<C>(width as u32, height as u32, samples)
            .map_err(|e| SensorError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

impl TiffWriter for StandardTiffWriter {
    fn write_mosaic(&self, mosaic: &Array4<f32>, output: &mut dyn Write, config: &ExportConfig) -> Result<()> {
        let (width, height) = single_frame("mosaic", mosaic, 1)?;
        let samples: Vec<u16> = mosaic.iter().map(|&v| quantize(v)).collect();
        self.encode::<Gray16>(width, height, &samples, output, config)
    }

    fn write_rgb(&self, rgb: &Array4<f32>, output: &mut dyn Write, config: &ExportConfig) -> Result<()> {
        let (width, height) = single_frame("rgb", rgb, 3)?;
        // (1, 3, H, W) -> interleaved H, W, 3
        let interleaved = rgb.index_axis(Axis(0), 0).permuted_axes([1, 2, 0]);
        let samples: Vec<u16> = interleaved.iter().map(|&v| quantize(v)).collect();
        self.encode::<RGB16>(width, height, &samples, output, config)
    }
}
