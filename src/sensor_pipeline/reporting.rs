//! Candidate vs. baseline reporting
//!
//! Per-sample anchor-space and edge metrics, their aggregation across a
//! capture set, and the qualitative manifest that tracks scenario coverage.
//! The resulting [`Report`] serializes to JSON.

mod qualitative;
mod summary;

pub use qualitative::{
    DEFAULT_REQUIRED_TAGS,
    QualitativeSample,
    QualitativeSet,
    load_qualitative_manifest,
};
pub use summary::{
    MetricMap,
    MetricSummary,
    QualitativeSummary,
    Report,
    SampleComparison,
    SampleEntry,
    SampleInputs,
    evaluate_sample,
    generate_report,
    summarize_samples,
};
