//! Sensor-consistency pipeline for the 48MP linear RGB reconstruction model
//!
//! Everything here revolves around one differentiable forward operator that
//! mosaics and bins a full-resolution linear RGB prediction into the
//! half-resolution quad-Bayer RAW anchor domain. Losses, metrics, fallback
//! baselines and risk guards all project through it, so they agree on what
//! the sensor would have recorded.
//!
//! The RAW ingest, demosaic and TIFF modules are the thin I/O shell around
//! that core: they turn a camera file into an anchor mosaic and write
//! mosaics/renders back out for inspection.

pub mod common;
pub mod cfa;
pub mod forward;
pub mod losses;
pub mod evaluation;
pub mod baselines;
pub mod risk;
pub mod analysis;
pub mod reporting;
pub mod raw;
pub mod debayer;
pub mod tiff;
pub mod conversions;

pub use common::{
    Ccm,
    GlobalRender,
    Result,
    SensorError,
    linear_curve,
};

pub use cfa::{
    CfaPattern,
    ColorChannel,
    Granularity,
    channel_index_map,
};

pub use forward::{
    ChannelScale,
    quad_bayer_adjoint,
    quad_bayer_forward,
};

pub use losses::{
    AnchorLoss,
    DEFAULT_CHARBONNIER_EPS,
    GainRegularization,
    GainRegularizationConfig,
    anchor_charbonnier_loss,
    anchor_charbonnier_loss_with_grad,
    charbonnier_loss,
    gain_regularization,
    gradient_detail_loss,
};

pub use evaluation::{
    CfaHistograms,
    GradientConsistency,
    HistogramConfig,
    SsimConfig,
    gradient_consistency_metrics,
    per_cfa_error_histogram,
    psnr,
    ssim,
};

pub use baselines::{
    BaselineGain,
    BaselineOutput,
    BoxNormalization,
    GAIN_FIELD_SCALE,
    GainFieldConfig,
    GainFieldPrediction,
    GainRange,
    GlobalGainConfig,
    build_model_inputs,
    compose_linear_prediction,
    gain_field_baseline,
    global_gain_baseline,
    upsample_guidance,
};

pub use risk::{
    AlignmentReport,
    DEFAULT_WB_TOLERANCE,
    MisalignmentConfig,
    WhiteBalanceCheck,
    detect_misalignment,
    estimate_white_balance_neutral,
    quad_binner_residual,
    white_balance_consistency,
};

pub use analysis::{
    AnalysisArtifacts,
    AnalysisInputs,
    build_analysis_artifacts,
};

pub use reporting::{
    DEFAULT_REQUIRED_TAGS,
    MetricMap,
    MetricSummary,
    QualitativeSample,
    QualitativeSet,
    Report,
    SampleComparison,
    SampleInputs,
    evaluate_sample,
    generate_report,
    load_qualitative_manifest,
    summarize_samples,
};

pub use raw::{
    RawCapture,
    RawCaptureReader,
    RawLoaderReader,
};

pub use debayer::CpuDebayer;

pub use tiff::{
    ExportConfig,
    ExportConfigBuilder,
    StandardTiffWriter,
    TiffCompression,
    TiffWriter,
};

pub use conversions::{
    AnchorFrame,
    AnchorIngestPipeline,
    PipelineConfig,
    PipelineConfigBuilder,
};
