use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::Array4;
use serde::Serialize;
use tracing::{info, instrument};

use super::qualitative::QualitativeSet;
use crate::sensor_pipeline::common::error::{Result, SensorError};
use crate::sensor_pipeline::common::render::GlobalRender;
use crate::sensor_pipeline::evaluation::{SsimConfig, gradient_consistency_metrics, psnr, ssim};

/// Metric name to value. PSNR of an exact match is `+inf`, which serializes
/// as `null`.
pub type MetricMap = BTreeMap<String, f64>;

/// Everything needed to score one capture.
#[derive(Debug, Clone, Copy)]
pub struct SampleInputs<'a> {
    pub sample_id: &'a str,
    pub candidate_mosaic: &'a Array4<f32>,
    pub baseline_mosaic: &'a Array4<f32>,
    pub anchor_mosaic: &'a Array4<f32>,
    pub candidate_render: &'a Array4<f32>,
    pub baseline_render: &'a Array4<f32>,
    pub anchor_render: &'a Array4<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleComparison {
    pub sample_id: String,
    pub candidate: MetricMap,
    pub baseline: MetricMap,
}

impl SampleComparison {
    /// Candidate minus baseline for metrics both sides report.
    pub fn delta(&self) -> MetricMap {
        self.candidate
            .iter()
            .filter_map(|(name, &c)| self.baseline.get(name).map(|&b| (name.clone(), c - b)))
            .collect()
    }
}

fn path_metrics(
    mosaic: &Array4<f32>,
    render: &Array4<f32>,
    inputs: &SampleInputs<'_>,
    global_render: &GlobalRender<'_>,
) -> Result<MetricMap> {
    let mut metrics = MetricMap::new();
    metrics.insert("psnr".into(), psnr(mosaic, inputs.anchor_mosaic, 1.0)? as f64);
    metrics.insert(
        "ssim".into(),
        ssim(mosaic, inputs.anchor_mosaic, &SsimConfig::default())? as f64,
    );
    let edges = gradient_consistency_metrics(render, inputs.anchor_render, global_render)?;
    for (name, value) in edges.entries() {
        metrics.insert(name.into(), value as f64);
    }
    Ok(metrics)
}

/// Anchor-space PSNR/SSIM on the mosaics and edge consistency on the renders,
/// for both the candidate and the baseline path.
pub fn evaluate_sample(
    inputs: &SampleInputs<'_>,
    global_render: &GlobalRender<'_>,
) -> Result<SampleComparison> {
    Ok(SampleComparison {
        sample_id: inputs.sample_id.to_string(),
        candidate: path_metrics(
            inputs.candidate_mosaic,
            inputs.candidate_render,
            inputs,
            global_render,
        )?,
        baseline: path_metrics(
            inputs.baseline_mosaic,
            inputs.baseline_render,
            inputs,
            global_render,
        )?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub candidate: f64,
    pub baseline: f64,
    pub delta: f64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-metric means across samples. Deltas are averaged over samples that
/// report the metric on both paths.
pub fn summarize_samples(samples: &[SampleComparison]) -> Result<BTreeMap<String, MetricSummary>> {
    if samples.is_empty() {
        return Err(SensorError::EmptyAggregation(
            "no samples provided for summary".into(),
        ));
    }

    let names: BTreeSet<&String> = samples.iter().flat_map(|s| s.candidate.keys()).collect();
    let mut summary = BTreeMap::new();
    for name in names {
        let candidate: Vec<f64> = samples.iter().filter_map(|s| s.candidate.get(name).copied()).collect();
        let baseline: Vec<f64> = samples.iter().filter_map(|s| s.baseline.get(name).copied()).collect();
        let deltas: Vec<f64> = samples.iter().filter_map(|s| s.delta().get(name).copied()).collect();
        if candidate.is_empty() || baseline.is_empty() || deltas.is_empty() {
            continue;
        }
        summary.insert(
            name.clone(),
            MetricSummary {
                candidate: mean(&candidate),
                baseline: mean(&baseline),
                delta: mean(&deltas),
            },
        );
    }
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleEntry {
    pub id: String,
    pub candidate: MetricMap,
    pub baseline: MetricMap,
    pub delta: MetricMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitativeSummary {
    pub num_samples: usize,
    pub tag_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: BTreeMap<String, MetricSummary>,
    pub samples: Vec<SampleEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualitative: Option<QualitativeSummary>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|e| {
            SensorError::OutputWriteError(format!(
                "failed to create {}: {e}",
                path.as_ref().display()
            ))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[instrument(skip_all, fields(samples = samples.len()))]
pub fn generate_report(
    samples: &[SampleComparison],
    qualitative: Option<&QualitativeSet>,
) -> Result<Report> {
    let summary = summarize_samples(samples)?;
    let entries = samples
        .iter()
        .map(|s| SampleEntry {
            id: s.sample_id.clone(),
            candidate: s.candidate.clone(),
            baseline: s.baseline.clone(),
            delta: s.delta(),
        })
        .collect();

    if let Some(psnr) = summary.get("psnr") {
        info!(
            candidate = psnr.candidate,
            baseline = psnr.baseline,
            delta = psnr.delta,
            "anchor PSNR"
        );
    }

    Ok(Report {
        summary,
        samples: entries,
        qualitative: qualitative.map(|set| QualitativeSummary {
            num_samples: set.samples.len(),
            tag_counts: set.tag_counts(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor_pipeline::reporting::QualitativeSample;
    use ndarray::s;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn comparison(id: &str, candidate: &[(&str, f64)], baseline: &[(&str, f64)]) -> SampleComparison {
        let to_map = |pairs: &[(&str, f64)]| {
            pairs
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect::<MetricMap>()
        };
        SampleComparison {
            sample_id: id.to_string(),
            candidate: to_map(candidate),
            baseline: to_map(baseline),
        }
    }

    #[test]
    fn test_evaluate_sample_prefers_closer_candidate() {
        let anchor_mosaic = Array4::<f32>::zeros((1, 1, 4, 4));
        let candidate_mosaic = &anchor_mosaic + 0.01;
        let baseline_mosaic = &anchor_mosaic + 0.1;

        let anchor_render = Array4::<f32>::zeros((1, 3, 4, 4));
        let mut candidate_render = anchor_render.clone();
        candidate_render.slice_mut(s![.., .., .., 2..]).fill(0.02);
        let mut baseline_render = anchor_render.clone();
        baseline_render.slice_mut(s![.., .., .., 2..]).fill(0.1);

        let inputs = SampleInputs {
            sample_id: "scene_a",
            candidate_mosaic: &candidate_mosaic,
            baseline_mosaic: &baseline_mosaic,
            anchor_mosaic: &anchor_mosaic,
            candidate_render: &candidate_render,
            baseline_render: &baseline_render,
            anchor_render: &anchor_render,
        };
        let comparison = evaluate_sample(&inputs, &GlobalRender::default()).unwrap();

        assert_eq!(comparison.sample_id, "scene_a");
        assert!(comparison.candidate["psnr"] > comparison.baseline["psnr"]);
        assert!(comparison.candidate["ssim"] > comparison.baseline["ssim"]);
        assert!(comparison.candidate["halo_l1"] < comparison.baseline["halo_l1"]);
        assert_eq!(
            comparison.candidate.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["corr_x", "corr_y", "halo_l1", "psnr", "ssim"]
        );
    }

    #[test]
    fn test_delta_uses_shared_metrics() {
        let sample = comparison("a", &[("psnr", 30.0), ("ssim", 0.9)], &[("psnr", 25.0)]);
        let delta = sample.delta();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["psnr"], 5.0);
    }

    #[test]
    fn test_summary_means() {
        let samples = vec![
            comparison("a", &[("psnr", 30.0)], &[("psnr", 20.0)]),
            comparison("b", &[("psnr", 40.0)], &[("psnr", 24.0)]),
        ];
        let summary = summarize_samples(&samples).unwrap();

        assert_eq!(
            summary["psnr"],
            MetricSummary {
                candidate: 35.0,
                baseline: 22.0,
                delta: 13.0,
            }
        );
    }

    #[test]
    fn test_empty_summary_fails() {
        assert!(matches!(
            summarize_samples(&[]),
            Err(SensorError::EmptyAggregation(_))
        ));
    }

    #[test]
    fn test_report_with_qualitative_coverage() {
        let samples = vec![
            comparison("scene_one", &[("psnr", 26.0), ("ssim", 0.8)], &[("psnr", 20.0), ("ssim", 0.6)]),
            comparison("scene_two", &[("psnr", 34.0), ("ssim", 0.9)], &[("psnr", 26.0), ("ssim", 0.7)]),
        ];
        let qualitative = QualitativeSet::new(vec![
            QualitativeSample {
                capture_id: "scene_one".into(),
                path: PathBuf::from("/tmp/a"),
                tags: vec!["backlit".into()],
                notes: None,
            },
            QualitativeSample {
                capture_id: "scene_two".into(),
                path: PathBuf::from("/tmp/b"),
                tags: vec!["foliage".into()],
                notes: None,
            },
        ]);

        let report = generate_report(&samples, Some(&qualitative)).unwrap();

        assert!(report.summary["psnr"].candidate > report.summary["psnr"].baseline);
        assert!(report.summary["ssim"].delta > 0.0);
        assert_eq!(report.samples.len(), 2);
        let q = report.qualitative.as_ref().unwrap();
        assert_eq!(q.num_samples, 2);
        assert_eq!(q.tag_counts["backlit"], 1);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["qualitative", "samples", "summary"]);
    }

    #[test]
    fn test_infinite_psnr_serializes_as_null() {
        let samples = vec![comparison("exact", &[("psnr", f64::INFINITY)], &[("psnr", 20.0)])];
        let report = generate_report(&samples, None).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        report.write_json(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert!(json["samples"][0]["candidate"]["psnr"].is_null());
        assert!(json.get("qualitative").is_none());
    }
}
