pub mod logger;
pub mod sensor_pipeline;
