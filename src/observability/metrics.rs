//! Run counters for the ingredient pipeline.
//!
//! Stages record through the `metrics` facade. Without an installed recorder
//! every call is a no-op; when a snapshot path is configured the binary
//! installs a Prometheus recorder and writes its text rendering at the end
//! of the run.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::error::{MergeError, Result};

/// Enum representing all metric names used in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RecordsLoaded,
    RecordsNormalized,
    NamesStandardized,
    DuplicatesMerged,
    NamesCorrected,
    RecordsSeparated,
    RegionsTagged,
    ValidationIssues,
    StageDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecordsLoaded => "feed_merge_records_loaded_total",
            MetricName::RecordsNormalized => "feed_merge_records_normalized_total",
            MetricName::NamesStandardized => "feed_merge_names_standardized_total",
            MetricName::DuplicatesMerged => "feed_merge_duplicates_merged_total",
            MetricName::NamesCorrected => "feed_merge_names_corrected_total",
            MetricName::RecordsSeparated => "feed_merge_records_separated_total",
            MetricName::RegionsTagged => "feed_merge_regions_tagged_total",
            MetricName::ValidationIssues => "feed_merge_validation_issues_total",
            MetricName::StageDuration => "feed_merge_stage_duration_seconds",
        }
    }

    /// Get all metric names as an iterator
    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RecordsLoaded,
            RecordsNormalized,
            NamesStandardized,
            DuplicatesMerged,
            NamesCorrected,
            RecordsSeparated,
            RegionsTagged,
            ValidationIssues,
            StageDuration,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus recorder and returns the handle used for rendering.
pub fn init() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MergeError::Metrics(format!("Failed to install Prometheus recorder: {}", e)))?;
    info!("Metrics recorder installed");
    Ok(handle)
}

/// Writes the Prometheus text exposition of every recorded metric.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }
    fs::write(path, handle.render()).map_err(|e| MergeError::io(path, e))?;
    info!(path = %path.display(), "Metrics snapshot written");
    Ok(())
}

/// Writes the snapshot at the end of a run. A failed write is logged and only
/// becomes the result when the run itself succeeded.
pub fn finish_run<E: From<MergeError>>(
    outcome: std::result::Result<(), E>,
    handle: &PrometheusHandle,
    path: &Path,
) -> std::result::Result<(), E> {
    match write_snapshot(handle, path) {
        Ok(()) => outcome,
        Err(e) => {
            error!(path = %path.display(), "Failed to write metrics snapshot: {}", e);
            outcome.and(Err(e.into()))
        }
    }
}

pub fn stage_duration(stage: &'static str, secs: f64) {
    ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
}

pub mod ingestion {
    use super::MetricName;

    pub fn records_loaded(source: &str, count: usize) {
        ::metrics::counter!(MetricName::RecordsLoaded.as_str(), "source" => source.to_string())
            .increment(count as u64);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn records_normalized(count: usize) {
        ::metrics::counter!(MetricName::RecordsNormalized.as_str()).increment(count as u64);
    }

    pub fn names_standardized(count: usize) {
        ::metrics::counter!(MetricName::NamesStandardized.as_str()).increment(count as u64);
    }
}

pub mod dedup {
    use super::MetricName;

    pub fn duplicates_merged(policy: &'static str, count: usize) {
        ::metrics::counter!(MetricName::DuplicatesMerged.as_str(), "policy" => policy)
            .increment(count as u64);
    }
}

pub mod remediate {
    use super::MetricName;

    pub fn names_corrected(count: usize) {
        ::metrics::counter!(MetricName::NamesCorrected.as_str()).increment(count as u64);
    }

    pub fn records_separated(count: usize) {
        ::metrics::counter!(MetricName::RecordsSeparated.as_str()).increment(count as u64);
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn regions_tagged(count: usize) {
        ::metrics::counter!(MetricName::RegionsTagged.as_str()).increment(count as u64);
    }
}

pub mod quality_gate {
    use super::MetricName;

    pub fn validation_issues(issue_type: &'static str, count: usize) {
        ::metrics::counter!(MetricName::ValidationIssues.as_str(), "type" => issue_type)
            .increment(count as u64);
    }
}
