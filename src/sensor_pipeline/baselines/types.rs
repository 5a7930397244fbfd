//! Baseline configuration and output types

use ndarray::{Array1, Array4};

use super::resample::BoxNormalization;
use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::forward::ChannelScale;

/// Clamp band for any gain consumed as a correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRange {
    pub min_gain: f32,
    pub max_gain: f32,
}

impl Default for GainRange {
    fn default() -> Self {
        Self {
            min_gain: 0.25,
            max_gain: 4.0,
        }
    }
}

impl GainRange {
    pub fn new(min_gain: f32, max_gain: f32) -> Result<Self> {
        let range = Self { min_gain, max_gain };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_gain <= self.max_gain) {
            return Err(SensorError::InvalidConfig(format!(
                "min_gain {} must not exceed max_gain {}",
                self.min_gain, self.max_gain
            )));
        }
        Ok(())
    }

    pub fn clamp(&self, gain: f32) -> f32 {
        gain.clamp(self.min_gain, self.max_gain)
    }
}

/// Gain estimated by a baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineGain {
    /// One scalar per batch element (Baseline A).
    Global(Array1<f32>),
    /// Full-resolution `(B, 3, H, W)` field (Baseline B).
    Field(Array4<f32>),
}

/// Result of a baseline correction.
#[derive(Debug, Clone)]
pub struct BaselineOutput {
    /// Corrected linear RGB48, non-negative.
    pub rgb48: Array4<f32>,
    /// `rgb48` projected back into the RAW anchor domain.
    pub mosaic: Array4<f32>,
    pub gain: BaselineGain,
}

/// Configuration for Baseline A (global gain)
#[derive(Debug, Clone, Copy)]
pub struct GlobalGainConfig {
    pub pattern: CfaPattern,
    pub channel_scale: ChannelScale,
    /// Quantile of the anchor/simulated ratio used as the gain, in `[0, 1]`.
    pub gain_percentile: f32,
    pub gain_range: GainRange,
    /// Floor for the simulated mosaic in the ratio denominator.
    pub eps: f32,
}

impl Default for GlobalGainConfig {
    fn default() -> Self {
        Self {
            pattern: CfaPattern::Rggb,
            channel_scale: ChannelScale::identity(),
            gain_percentile: 0.5,
            gain_range: GainRange::default(),
            eps: 1e-6,
        }
    }
}

impl GlobalGainConfig {
    pub fn builder() -> GlobalGainConfigBuilder {
        GlobalGainConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gain_percentile) {
            return Err(SensorError::InvalidConfig(format!(
                "gain_percentile must lie in [0, 1], got {}",
                self.gain_percentile
            )));
        }
        self.gain_range.validate()
    }
}

/// Builder for GlobalGainConfig
#[derive(Default)]
pub struct GlobalGainConfigBuilder {
    pattern: Option<CfaPattern>,
    channel_scale: Option<ChannelScale>,
    gain_percentile: Option<f32>,
    gain_range: Option<GainRange>,
    eps: Option<f32>,
}

impl GlobalGainConfigBuilder {
    pub fn pattern(mut self, pattern: CfaPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn channel_scale(mut self, scale: ChannelScale) -> Self {
        self.channel_scale = Some(scale);
        self
    }

    pub fn gain_percentile(mut self, percentile: f32) -> Self {
        self.gain_percentile = Some(percentile);
        self
    }

    pub fn gain_range(mut self, min_gain: f32, max_gain: f32) -> Self {
        self.gain_range = Some(GainRange { min_gain, max_gain });
        self
    }

    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = Some(eps);
        self
    }

    pub fn build(self) -> GlobalGainConfig {
        let default = GlobalGainConfig::default();
        GlobalGainConfig {
            pattern: self.pattern.unwrap_or(default.pattern),
            channel_scale: self.channel_scale.unwrap_or(default.channel_scale),
            gain_percentile: self.gain_percentile.unwrap_or(default.gain_percentile),
            gain_range: self.gain_range.unwrap_or(default.gain_range),
            eps: self.eps.unwrap_or(default.eps),
        }
    }
}

/// Configuration for Baseline B (spatial gain field)
#[derive(Debug, Clone, Copy)]
pub struct GainFieldConfig {
    pub pattern: CfaPattern,
    pub channel_scale: ChannelScale,
    /// Odd box-filter size applied after upsampling; 1 disables smoothing.
    pub smoothing_kernel: usize,
    /// Border divisor for the smoothing pass.
    pub border_normalization: BoxNormalization,
    pub gain_range: GainRange,
    pub eps: f32,
}

impl Default for GainFieldConfig {
    fn default() -> Self {
        Self {
            pattern: CfaPattern::Rggb,
            channel_scale: ChannelScale::identity(),
            smoothing_kernel: 7,
            border_normalization: BoxNormalization::ZeroPadded,
            gain_range: GainRange::default(),
            eps: 1e-6,
        }
    }
}

impl GainFieldConfig {
    pub fn builder() -> GainFieldConfigBuilder {
        GainFieldConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.smoothing_kernel == 0 || self.smoothing_kernel % 2 == 0 {
            return Err(SensorError::InvalidConfig(format!(
                "smoothing_kernel must be odd, got {}",
                self.smoothing_kernel
            )));
        }
        self.gain_range.validate()
    }
}

/// Builder for GainFieldConfig
#[derive(Default)]
pub struct GainFieldConfigBuilder {
    pattern: Option<CfaPattern>,
    channel_scale: Option<ChannelScale>,
    smoothing_kernel: Option<usize>,
    border_normalization: Option<BoxNormalization>,
    gain_range: Option<GainRange>,
    eps: Option<f32>,
}

impl GainFieldConfigBuilder {
    pub fn pattern(mut self, pattern: CfaPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn channel_scale(mut self, scale: ChannelScale) -> Self {
        self.channel_scale = Some(scale);
        self
    }

    pub fn smoothing_kernel(mut self, size: usize) -> Self {
        self.smoothing_kernel = Some(size);
        self
    }

    pub fn border_normalization(mut self, normalization: BoxNormalization) -> Self {
        self.border_normalization = Some(normalization);
        self
    }

    pub fn gain_range(mut self, min_gain: f32, max_gain: f32) -> Self {
        self.gain_range = Some(GainRange { min_gain, max_gain });
        self
    }

    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = Some(eps);
        self
    }

    pub fn build(self) -> GainFieldConfig {
        let default = GainFieldConfig::default();
        GainFieldConfig {
            pattern: self.pattern.unwrap_or(default.pattern),
            channel_scale: self.channel_scale.unwrap_or(default.channel_scale),
            smoothing_kernel: self.smoothing_kernel.unwrap_or(default.smoothing_kernel),
            border_normalization: self
                .border_normalization
                .unwrap_or(default.border_normalization),
            gain_range: self.gain_range.unwrap_or(default.gain_range),
            eps: self.eps.unwrap_or(default.eps),
        }
    }
}
