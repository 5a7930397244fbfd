//! Analysis artifacts for side-by-side review
//!
//! Collects the anchor-space projections, residuals and per-CFA histograms
//! of a candidate and a baseline prediction, together with globally rendered
//! previews, so every visualization goes through the same forward operator
//! as training.

use std::collections::BTreeMap;

use ndarray::{Array4, Axis, concatenate};
use tracing::instrument;

use crate::sensor_pipeline::cfa::CfaPattern;
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::render::GlobalRender;
use crate::sensor_pipeline::common::tensor::require_same_shape;
use crate::sensor_pipeline::evaluation::{CfaHistograms, HistogramConfig, per_cfa_error_histogram};
use crate::sensor_pipeline::forward::{ChannelScale, quad_bayer_forward};

/// Tensors to analyse. Only the anchor and the two predictions are required.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInputs<'a> {
    pub anchor_mosaic: &'a Array4<f32>,
    pub candidate_rgb48: &'a Array4<f32>,
    pub baseline_rgb48: &'a Array4<f32>,
    pub proraw_rgb48: Option<&'a Array4<f32>>,
    /// Demosaiced anchor preview `(B, 3, h, w)`, rendered as-is.
    pub anchor_render: Option<&'a Array4<f32>>,
    /// Gain map `(B, 1, H, W)` or `(B, 3, H, W)`.
    pub gain_map: Option<&'a Array4<f32>>,
}

impl<'a> AnalysisInputs<'a> {
    pub fn new(
        anchor_mosaic: &'a Array4<f32>,
        candidate_rgb48: &'a Array4<f32>,
        baseline_rgb48: &'a Array4<f32>,
    ) -> Self {
        Self {
            anchor_mosaic,
            candidate_rgb48,
            baseline_rgb48,
            proraw_rgb48: None,
            anchor_render: None,
            gain_map: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisArtifacts {
    /// `candidate`, `baseline` and `anchor` in the RAW anchor domain.
    pub mosaics: BTreeMap<&'static str, Array4<f32>>,
    /// Projection minus anchor for `candidate` and `baseline`.
    pub residuals: BTreeMap<&'static str, Array4<f32>>,
    pub histograms: BTreeMap<&'static str, CfaHistograms>,
    /// Display renders clamped at zero; `gain` is min-max normalized.
    pub renders: BTreeMap<&'static str, Array4<f32>>,
}

/// Min-max normalizes each `(batch, channel)` plane into `[0, 1]`; a single
/// channel map is repeated to three.
fn normalize_gain_map(gain_map: &Array4<f32>) -> Result<Array4<f32>> {
    let mut display = match gain_map.dim().1 {
        1 => concatenate(Axis(1), &[gain_map.view(), gain_map.view(), gain_map.view()])
            .map_err(|e| SensorError::Shape(e.to_string()))?,
        3 => gain_map.clone(),
        other => {
            return Err(SensorError::Shape(format!(
                "gain_map must have 1 or 3 channels, got {other}"
            )));
        }
    };

    for mut sample in display.outer_iter_mut() {
        for mut plane in sample.outer_iter_mut() {
            let min = plane.iter().copied().fold(f32::INFINITY, f32::min);
            let max = plane.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let denom = (max - min).max(1e-6);
            plane.mapv_inplace(|v| (v - min) / denom);
        }
    }
    Ok(display)
}

#[instrument(skip_all, fields(pattern = %pattern))]
pub fn build_analysis_artifacts(
    inputs: &AnalysisInputs<'_>,
    pattern: CfaPattern,
    scale: &ChannelScale,
    render: &GlobalRender<'_>,
) -> Result<AnalysisArtifacts> {
    let candidate_mosaic = quad_bayer_forward(inputs.candidate_rgb48, pattern, scale)?;
    let baseline_mosaic = quad_bayer_forward(inputs.baseline_rgb48, pattern, scale)?;
    require_same_shape(&candidate_mosaic, inputs.anchor_mosaic)?;
    require_same_shape(&baseline_mosaic, inputs.anchor_mosaic)?;

    let mut residuals = BTreeMap::new();
    residuals.insert("candidate", &candidate_mosaic - inputs.anchor_mosaic);
    residuals.insert("baseline", &baseline_mosaic - inputs.anchor_mosaic);

    let histogram_config = HistogramConfig::default();
    let mut histograms = BTreeMap::new();
    for (&name, residual) in &residuals {
        histograms.insert(name, per_cfa_error_histogram(residual, pattern, &histogram_config)?);
    }

    let mut renders = BTreeMap::new();
    renders.insert("candidate", render.apply_display(inputs.candidate_rgb48)?);
    renders.insert("baseline", render.apply_display(inputs.baseline_rgb48)?);
    if let Some(proraw) = inputs.proraw_rgb48 {
        renders.insert("input", render.apply_display(proraw)?);
    }
    if let Some(anchor_render) = inputs.anchor_render {
        renders.insert("anchor", render.apply_display(anchor_render)?);
    }
    if let Some(gain_map) = inputs.gain_map {
        renders.insert("gain", normalize_gain_map(gain_map)?);
    }

    let mut mosaics = BTreeMap::new();
    mosaics.insert("candidate", candidate_mosaic);
    mosaics.insert("baseline", baseline_mosaic);
    mosaics.insert("anchor", inputs.anchor_mosaic.clone());

    Ok(AnalysisArtifacts {
        mosaics,
        residuals,
        histograms,
        renders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_pipeline::common::render::Ccm;

    #[test]
    fn test_projects_with_channel_scale() {
        let anchor = Array4::<f32>::zeros((1, 1, 2, 2));
        let candidate = Array4::<f32>::ones((1, 3, 4, 4));
        let baseline = Array4::<f32>::zeros((1, 3, 4, 4));
        let scale = ChannelScale([1.0, 2.0, 4.0]);

        let artifacts = build_analysis_artifacts(
            &AnalysisInputs::new(&anchor, &candidate, &baseline),
            CfaPattern::Rggb,
            &scale,
            &GlobalRender::default(),
        )
        .unwrap();

        let expected = quad_bayer_forward(&candidate, CfaPattern::Rggb, &scale).unwrap();
        assert_eq!(artifacts.mosaics["candidate"], expected);
        assert_eq!(artifacts.residuals["candidate"], &expected - &anchor);
        assert_eq!(artifacts.mosaics["anchor"], anchor);
        assert_eq!(
            artifacts.histograms.keys().copied().collect::<Vec<_>>(),
            vec!["baseline", "candidate"]
        );
        assert!(!artifacts.renders.contains_key("gain"));
    }

    #[test]
    fn test_emits_renders_and_gain_map() {
        let anchor = Array4::<f32>::from_elem((1, 1, 2, 2), 0.5);
        let candidate = Array4::<f32>::ones((1, 3, 4, 4));
        let baseline = Array4::<f32>::zeros((1, 3, 4, 4));
        let proraw = Array4::<f32>::from_elem((1, 3, 4, 4), 0.25);
        let anchor_render = Array4::<f32>::from_elem((1, 3, 4, 4), 0.75);
        let gain = Array4::from_shape_fn((1, 1, 4, 4), |(_, _, y, x)| {
            0.5 + (y * 4 + x) as f32 / 15.0
        });
        let sqrt = |v: f32| v.sqrt();
        let render = GlobalRender::new(Ccm::diagonal(2.0, 2.0, 2.0), &sqrt);

        let inputs = AnalysisInputs {
            proraw_rgb48: Some(&proraw),
            anchor_render: Some(&anchor_render),
            gain_map: Some(&gain),
            ..AnalysisInputs::new(&anchor, &candidate, &baseline)
        };
        let artifacts =
            build_analysis_artifacts(&inputs, CfaPattern::Rggb, &ChannelScale::identity(), &render)
                .unwrap();

        let sqrt2 = 2.0f32.sqrt();
        assert!(artifacts.renders["candidate"].iter().all(|&v| (v - sqrt2).abs() < 1e-6));
        assert!(artifacts.renders["input"].iter().all(|&v| (v - 0.5f32.sqrt()).abs() < 1e-6));
        assert!(artifacts.renders["anchor"].iter().all(|&v| (v - 1.5f32.sqrt()).abs() < 1e-6));

        let gain_render = &artifacts.renders["gain"];
        assert_eq!(gain_render.shape(), &[1, 3, 4, 4]);
        assert!(gain_render.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(gain_render[[0, 2, 0, 0]].abs() < 1e-6);
        assert!((gain_render[[0, 2, 3, 3]] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_flat_gain_map_stays_finite() {
        let gain = Array4::<f32>::from_elem((1, 3, 2, 2), 1.3);
        let normalized = normalize_gain_map(&gain).unwrap();
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_anchor_shape_must_match_projection() {
        let anchor = Array4::<f32>::zeros((1, 1, 4, 4));
        let candidate = Array4::<f32>::ones((1, 3, 4, 4));
        let baseline = Array4::<f32>::zeros((1, 3, 4, 4));

        let result = build_analysis_artifacts(
            &AnalysisInputs::new(&anchor, &candidate, &baseline),
            CfaPattern::Rggb,
            &ChannelScale::identity(),
            &GlobalRender::default(),
        );
        assert!(matches!(result, Err(SensorError::DomainMismatch { .. })));
    }
}
