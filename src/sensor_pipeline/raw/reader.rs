use crate::sensor_pipeline::common::error::Result;
use crate::sensor_pipeline::raw::types::RawCapture;

pub trait RawCaptureReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawCapture>;
}
