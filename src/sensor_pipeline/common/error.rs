use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Shape validation failed: {0}")]
    Shape(String),

    #[error("Domain mismatch: expected shape {expected:?}, got {actual:?}")]
    DomainMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid CFA pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot aggregate an empty collection: {0}")]
    EmptyAggregation(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode RAW capture: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid qualitative manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SensorError {
    pub(crate) fn domain(expected: &[usize], actual: &[usize]) -> Self {
        SensorError::DomainMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;
