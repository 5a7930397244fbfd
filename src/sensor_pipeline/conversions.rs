//! RAW capture to anchor mosaic conversion

mod anchor_ingest;
pub mod types;


pub use anchor_ingest::AnchorIngestPipeline;
pub use types::{AnchorFrame, PipelineConfig, PipelineConfigBuilder};
