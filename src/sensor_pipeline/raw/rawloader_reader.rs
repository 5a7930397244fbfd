//! RAW reader backed by rawloader.
//!
//! Any format rawloader decodes (ARW, CR2, NEF, DNG, ...) works as long as
//! it carries a single-component 2x2 Bayer CFA.

use std::io::Cursor;

use rawloader::{CFA, RawImageData};
use tracing::debug;

use crate::sensor_pipeline::cfa::{CfaPattern, ColorChannel};
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::raw::reader::RawCaptureReader;
use crate::sensor_pipeline::raw::types::RawCapture;

pub struct RawLoaderReader;

/// Maps rawloader's 2x2 CFA description onto a [`CfaPattern`].
pub(crate) fn pattern_from_cfa(cfa: &CFA) -> Result<CfaPattern> {
    if cfa.width != 2 || cfa.height != 2 {
        return Err(SensorError::UnsupportedFormat(format!(
            "CFA '{}' is {}x{}, only 2x2 Bayer layouts are supported",
            cfa.name, cfa.width, cfa.height
        )));
    }

    let mut layout = [[ColorChannel::Green; 2]; 2];
    for (row, cells) in layout.iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            *cell = match cfa.color_at(row, col) {
                0 => ColorChannel::Red,
                1 => ColorChannel::Green,
                2 => ColorChannel::Blue,
                other => {
                    return Err(SensorError::UnsupportedFormat(format!(
                        "CFA '{}' has non-RGB color index {other}",
                        cfa.name
                    )));
                }
            };
        }
    }

    CfaPattern::from_layout(layout).ok_or_else(|| {
        SensorError::UnsupportedFormat(format!("CFA '{}' is not a Bayer layout", cfa.name))
    })
}

impl RawCaptureReader for RawLoaderReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawCapture> {
        debug!("Decoding RAW capture, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| SensorError::DecodeError(e.to_string()))?;
        if decoded.cpp != 1 {
            return Err(SensorError::UnsupportedFormat(format!(
                "expected one component per pixel, got {}",
                decoded.cpp
            )));
        }
        let pattern = pattern_from_cfa(&decoded.cfa)?;

        // float data is normalized to 0.0-1.0
        let (data, black_level, white_level) = match decoded.data {
            RawImageData::Integer(values) => (
                values,
                decoded.blacklevels[0],
                decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX),
            ),
            RawImageData::Float(values) => (
                values
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16)
                    .collect(),
                0,
                u16::MAX,
            ),
        };

        debug!(
            width = decoded.width,
            height = decoded.height,
            %pattern,
            black_level,
            white_level,
            "Decoded RAW capture"
        );

        Ok(RawCapture {
            width: decoded.width,
            height: decoded.height,
            data,
            pattern,
            black_level,
            white_level,
            wb_coeffs: decoded.wb_coeffs,
        })
    }
}
