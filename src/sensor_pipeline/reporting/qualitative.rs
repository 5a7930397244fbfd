use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::sensor_pipeline::common::error::{Result, SensorError};

/// Scenarios every qualitative set has to cover.
pub const DEFAULT_REQUIRED_TAGS: [&str; 6] = [
    "backlit",
    "mixed_light",
    "bright_windows",
    "city_lights",
    "foliage",
    "fine_patterns",
];

#[derive(Debug, Clone, PartialEq)]
pub struct QualitativeSample {
    pub capture_id: String,
    pub path: PathBuf,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl QualitativeSample {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualitativeSet {
    pub samples: Vec<QualitativeSample>,
}

impl QualitativeSet {
    pub fn new(samples: Vec<QualitativeSample>) -> Self {
        Self { samples }
    }

    /// Fails with every required tag that no sample carries.
    pub fn ensure_coverage(&self, required_tags: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required_tags
            .iter()
            .copied()
            .filter(|tag| !self.samples.iter().any(|s| s.has_tag(tag)))
            .collect();
        if !missing.is_empty() {
            return Err(SensorError::Manifest(format!(
                "missing required tags: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn filter_by_tag(&self, tag: &str) -> QualitativeSet {
        QualitativeSet::new(
            self.samples
                .iter()
                .filter(|s| s.has_tag(tag))
                .cloned()
                .collect(),
        )
    }

    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.samples.iter().flat_map(|s| s.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Deserialize)]
struct ManifestFile {
    captures: Option<Vec<ManifestEntry>>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    id: Option<String>,
    path: Option<String>,
    tags: Option<Vec<String>>,
    notes: Option<String>,
}

fn parse_entry(entry: ManifestEntry, manifest_dir: &Path) -> Result<QualitativeSample> {
    let capture_id = entry
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SensorError::Manifest("each capture requires a non-empty 'id'".into()))?;
    let relative_path = entry.path.filter(|p| !p.is_empty()).ok_or_else(|| {
        SensorError::Manifest(format!("capture '{capture_id}' requires a non-empty 'path'"))
    })?;
    let tags = entry.tags.filter(|t| !t.is_empty()).ok_or_else(|| {
        SensorError::Manifest(format!("capture '{capture_id}' requires a non-empty 'tags' list"))
    })?;

    Ok(QualitativeSample {
        capture_id,
        path: std::path::absolute(manifest_dir.join(relative_path))?,
        tags,
        notes: entry.notes,
    })
}

/// Loads `{"captures": [{"id", "path", "tags", "notes"}]}` and checks that
/// `required_tags` are covered. Capture paths resolve against the manifest's
/// directory.
pub fn load_qualitative_manifest(
    manifest_path: impl AsRef<Path>,
    required_tags: &[&str],
) -> Result<QualitativeSet> {
    let manifest_path = manifest_path.as_ref();
    if !manifest_path.exists() {
        return Err(SensorError::Manifest(format!(
            "manifest not found: {}",
            manifest_path.display()
        )));
    }

    let text = fs::read_to_string(manifest_path)?;
    let manifest: ManifestFile = serde_json::from_str(&text)?;
    let entries = manifest
        .captures
        .ok_or_else(|| SensorError::Manifest("manifest missing 'captures' list".into()))?;

    let manifest_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let samples = entries
        .into_iter()
        .map(|entry| parse_entry(entry, manifest_dir))
        .collect::<Result<Vec<_>>>()?;
    debug!(count = samples.len(), path = %manifest_path.display(), "qualitative manifest loaded");

    let set = QualitativeSet::new(samples);
    set.ensure_coverage(required_tags)?;
    Ok(set)
}
