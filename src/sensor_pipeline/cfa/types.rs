//! CFA pattern types

use std::fmt;
use std::str::FromStr;

use crate::sensor_pipeline::common::error::SensorError;

/// Physical color sampled by a photosite, in RGB channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 3] = [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue];

    /// Index into the channel axis of an RGB tensor.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorChannel::Red => "r",
            ColorChannel::Green => "g",
            ColorChannel::Blue => "b",
        }
    }
}

/// 2x2 CFA layout, named by reading the top-left 2x2 cell row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CfaPattern {
    #[default]
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl CfaPattern {
    pub const ALL: [CfaPattern; 4] = [
        CfaPattern::Rggb,
        CfaPattern::Bggr,
        CfaPattern::Grbg,
        CfaPattern::Gbrg,
    ];

    /// The 2x2 layout as `[row][col]`, position (0, 0) top-left.
    pub fn layout(self) -> [[ColorChannel; 2]; 2] {
        use ColorChannel::{Blue as B, Green as G, Red as R};
        match self {
            CfaPattern::Rggb => [[R, G], [G, B]],
            CfaPattern::Bggr => [[B, G], [G, R]],
            CfaPattern::Grbg => [[G, R], [B, G]],
            CfaPattern::Gbrg => [[G, B], [R, G]],
        }
    }

    /// Color at the given row/column parity. Only the low bit of each is used.
    pub fn color_at(self, row: usize, col: usize) -> ColorChannel {
        self.layout()[row & 1][col & 1]
    }

    pub fn name(self) -> &'static str {
        match self {
            CfaPattern::Rggb => "rggb",
            CfaPattern::Bggr => "bggr",
            CfaPattern::Grbg => "grbg",
            CfaPattern::Gbrg => "gbrg",
        }
    }

    /// Recovers a pattern from its top-left 2x2 cell, if it is one of the four.
    pub fn from_layout(layout: [[ColorChannel; 2]; 2]) -> Option<Self> {
        CfaPattern::ALL.into_iter().find(|p| p.layout() == layout)
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CfaPattern {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rggb" => Ok(CfaPattern::Rggb),
            "bggr" => Ok(CfaPattern::Bggr),
            "grbg" => Ok(CfaPattern::Grbg),
            "gbrg" => Ok(CfaPattern::Gbrg),
            _ => Err(SensorError::InvalidPattern(s.to_string())),
        }
    }
}

/// Which address bits select the layout cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Per-pixel parity `(y & 1, x & 1)`; a plain Bayer mosaic.
    Pixel,
    /// Per 2x2 block parity `((y / 2) & 1, (x / 2) & 1)`; the quad-Bayer grid.
    Block,
}

impl Granularity {
    pub(crate) fn shift(self) -> usize {
        match self {
            Granularity::Pixel => 0,
            Granularity::Block => 1,
        }
    }
}
