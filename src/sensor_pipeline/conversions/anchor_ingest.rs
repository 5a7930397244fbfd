use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::sensor_pipeline::{
    common::error::{Result, SensorError},
    conversions::types::{AnchorFrame, PipelineConfig},
    debayer::CpuDebayer,
    raw::{RawCapture, RawCaptureReader, RawLoaderReader},
    risk::white_balance_consistency,
    tiff::{StandardTiffWriter, TiffWriter},
};

pub struct AnchorIngestPipeline<R: RawCaptureReader, W: TiffWriter> {
    reader: R,
    writer: W,
    debayer: CpuDebayer,
    config: PipelineConfig,
}

impl AnchorIngestPipeline<RawLoaderReader, StandardTiffWriter> {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_custom(RawLoaderReader, StandardTiffWriter, config)
    }
}

impl<R: RawCaptureReader, W: TiffWriter> AnchorIngestPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Self {
        Self {
            reader,
            writer,
            debayer: CpuDebayer::new(),
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        // one full 2x2 Bayer tile at least
        if width < 2 || height < 2 {
            return Err(SensorError::InvalidDimensions(width, height));
        }
        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(SensorError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    fn decode(&self, input_data: &[u8]) -> Result<(RawCapture, AnchorFrame)> {
        let capture = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)?
        };

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = capture.width,
                height = capture.height
            ).entered();
            self.validate_dimensions(capture.width, capture.height)?;
        }

        let mosaic = {
            let _span = tracing::info_span!("normalize_mosaic").entered();
            capture.to_anchor_mosaic()?
        };

        let as_shot_neutral = capture.as_shot_neutral();
        let white_balance = match as_shot_neutral {
            Some(neutral) => {
                let _span = tracing::info_span!("white_balance_check").entered();
                Some(white_balance_consistency(
                    &mosaic,
                    &neutral,
                    capture.pattern,
                    self.config.wb_tolerance,
                )?)
            }
            None => None,
        };

        let frame = AnchorFrame {
            mosaic,
            pattern: capture.pattern,
            width: capture.width,
            height: capture.height,
            as_shot_neutral,
            white_balance,
        };
        Ok((capture, frame))
    }

    /// Decodes a RAW capture into the anchor domain without writing anything.
    #[instrument(skip(self, input_data), fields(input_size = input_data.len()))]
    pub fn ingest(&self, input_data: &[u8]) -> Result<AnchorFrame> {
        let (_, frame) = self.decode(input_data)?;
        Ok(frame)
    }

    /// Ingests a capture and writes the anchor mosaic, or the demosaiced
    /// guidance RGB when `debayer` is set, as 16-bit TIFF.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<AnchorFrame> {
        info!("Starting RAW to anchor conversion");

        let (capture, frame) = self.decode(input_data)?;

        if self.config.debayer {
            let rgb = {
                let _span = tracing::info_span!("debayer").entered();
                self.debayer
                    .process(&capture)
                    .map_err(|e| SensorError::DecodeError(format!("{e:#}")))?
            };
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_rgb(&rgb, output, &self.config.export)?;
        } else {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_mosaic(&frame.mosaic, output, &self.config.export)?;
        }

        info!(
            width = frame.width,
            height = frame.height,
            pattern = %frame.pattern,
            wb_ok = frame.white_balance.as_ref().map(|c| c.within_tolerance),
            "Conversion complete"
        );
        Ok(frame)
    }

    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<AnchorFrame> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                SensorError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                SensorError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.convert(&input_data, &mut output_file)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }
}
