use crate::sensor_pipeline::common::error::{Result, SensorError};

/// Per-channel linear gain applied before mosaicing (sensor gain mismatch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelScale(pub [f32; 3]);

impl Default for ChannelScale {
    fn default() -> Self {
        ChannelScale([1.0, 1.0, 1.0])
    }
}

impl ChannelScale {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_slice(values: &[f32]) -> Result<Self> {
        match values {
            [r, g, b] => Ok(ChannelScale([*r, *g, *b])),
            _ => Err(SensorError::InvalidConfig(format!(
                "channel_scale must have 3 entries, got {}",
                values.len()
            ))),
        }
    }

    pub fn get(&self, channel: usize) -> f32 {
        self.0[channel]
    }
}

impl From<[f32; 3]> for ChannelScale {
    fn from(values: [f32; 3]) -> Self {
        ChannelScale(values)
    }
}
