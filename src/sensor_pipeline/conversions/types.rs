//! Ingest configuration and output types

use ndarray::Array4;

use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::risk::{DEFAULT_WB_TOLERANCE, WhiteBalanceCheck};
use crate::sensor_pipeline::tiff::{ExportConfig, TiffCompression};

/// Configuration for RAW anchor ingest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// TIFF settings for the exported mosaic or guidance image
    pub export: ExportConfig,
    /// Whether to validate capture dimensions before normalizing
    pub validate_dimensions: bool,
    /// Largest accepted width or height when validating
    pub max_dimension: Option<usize>,
    /// Allowed per-channel deviation from the as-shot neutral
    pub wb_tolerance: f32,
    /// Export the demosaiced RGB guidance instead of the mosaic
    pub debayer: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            export: ExportConfig::default(),
            validate_dimensions: true,
            max_dimension: None,
            wb_tolerance: DEFAULT_WB_TOLERANCE,
            debayer: false,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
    wb_tolerance: Option<f32>,
    debayer: Option<bool>,
}

impl PipelineConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn wb_tolerance(mut self, tolerance: f32) -> Self {
        self.wb_tolerance = Some(tolerance);
        self
    }

    pub fn debayer(mut self, enable: bool) -> Self {
        self.debayer = Some(enable);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            export: ExportConfig {
                compression: self.compression.unwrap_or(default.export.compression),
                predictor: self.predictor.unwrap_or(default.export.predictor),
            },
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
            wb_tolerance: self.wb_tolerance.unwrap_or(default.wb_tolerance),
            debayer: self.debayer.unwrap_or(default.debayer),
        }
    }
}

/// A capture normalized into the anchor domain.
#[derive(Debug, Clone)]
pub struct AnchorFrame {
    /// `(1, 1, H, W)` mosaic in `[0, 1]`
    pub mosaic: Array4<f32>,
    pub pattern: CfaPattern,
    /// Sensor dimensions before the even crop
    pub width: usize,
    pub height: usize,
    pub as_shot_neutral: Option<[f32; 3]>,
    /// Present when the capture carried usable white-balance multipliers.
    pub white_balance: Option<WhiteBalanceCheck>,
}
