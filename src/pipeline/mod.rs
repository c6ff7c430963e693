// Data processing pipeline: ingestion, processing, reporting and storage

pub mod ingestion;
pub mod processing;
pub mod report;
pub mod storage;

use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span};

use crate::config::{MergeConfig, RemediateConfig};
use crate::domain::IngredientRecord;
use crate::error::Result;
use crate::observability::metrics;
use crate::rules::RuleSet;
use ingestion::{Loader, SourceBatch};
use processing::conflation::{assign_sequential_ids, Deduplicator};
use processing::enrich::{Enricher, RegionalTagger};
use processing::normalize::{DefaultNormalizer, NormalizationRegistry, Normalizer};
use processing::quality_gate::{DefaultQualityGate, ValidationSummary};
use processing::remediate::{RemediationOutcome, Remediator};
use processing::standardize::NameStandardizer;
use report::{MergeReport, RemediationReport, ValidationReport};
use storage::Storage;

/// In-memory result of the merge stages, before anything is written
#[derive(Debug, Clone)]
pub struct MergedDataset {
    pub records: Vec<IngredientRecord>,
    pub loaded: usize,
    pub merges: usize,
    pub merge_log: Vec<String>,
    pub standards_based: usize,
    pub validation: ValidationSummary,
}

#[derive(Debug, Clone)]
pub struct MergeRunResult {
    pub dataset: MergedDataset,
    pub output: PathBuf,
    pub report: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RemediationRunResult {
    pub outcome: RemediationOutcome,
    pub output: PathBuf,
    pub report: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ValidationRunResult {
    pub summary: ValidationSummary,
    pub report_text: String,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TagRunResult {
    pub records: Vec<IngredientRecord>,
    pub tagged: usize,
    pub output: PathBuf,
}

/// Runs the pipeline commands against one rule set and one output store.
///
/// Each command completes all of its in-memory work before the first write,
/// so a failing run leaves no partial outputs behind.
pub struct Pipeline<'a> {
    rules: &'a RuleSet,
    storage: &'a dyn Storage,
}

impl<'a> Pipeline<'a> {
    pub fn new(rules: &'a RuleSet, storage: &'a dyn Storage) -> Self {
        Self { rules, storage }
    }

    /// Normalize, standardize, deduplicate, renumber and validate loaded batches.
    pub fn merge_batches(&self, batches: &[SourceBatch], config: &MergeConfig) -> Result<MergedDataset> {
        let loaded = batches.iter().map(|b| b.entries.len()).sum();

        let mut records = DefaultNormalizer::new().normalize(batches);
        let standards_based = NameStandardizer::new(&self.rules.standard_patterns)?.apply(&mut records);

        let dedup = Deduplicator::from_config(config).deduplicate(records);
        let mut records = dedup.records;
        assign_sequential_ids(&mut records);

        let validation = DefaultQualityGate::new(&self.rules.reference_standards).validate(&records);

        Ok(MergedDataset {
            records,
            loaded,
            merges: dedup.merges,
            merge_log: dedup.merge_log,
            standards_based,
            validation,
        })
    }

    pub fn run_merge(&self, config: &MergeConfig) -> Result<MergeRunResult> {
        let span = info_span!("merge_run", sources = config.sources.len());
        let _enter = span.enter();
        let started = Instant::now();

        let batches = Loader::load_all(&config.sources)?;
        let dataset = self.merge_batches(&batches, config)?;

        let report = MergeReport {
            records: &dataset.records,
            sources: &config.sources,
            policy: Deduplicator::from_config(config).policy_name(),
            merges: dataset.merges,
            merge_log: &dataset.merge_log,
            validation: &dataset.validation,
            generated_at: Local::now(),
        }
        .render();

        self.storage.write_records(&config.output, &dataset.records)?;
        self.storage.write_report(&config.report, &report)?;

        metrics::stage_duration("merge", started.elapsed().as_secs_f64());
        info!(
            loaded = dataset.loaded,
            unique = dataset.records.len(),
            merges = dataset.merges,
            "Merge run finished"
        );
        Ok(MergeRunResult {
            dataset,
            output: config.output.clone(),
            report: config.report.clone(),
        })
    }

    pub fn run_remediation(&self, config: &RemediateConfig) -> Result<RemediationRunResult> {
        let span = info_span!("remediation_run", input = %config.input.display());
        let _enter = span.enter();
        let started = Instant::now();

        let records = ingestion::read_records(&config.input, &NormalizationRegistry::new())?;
        let outcome = Remediator::new(self.rules, config.separation_mode).remediate(records);
        let report = RemediationReport {
            outcome: &outcome,
            generated_at: Local::now(),
        }
        .render();

        self.storage.write_records(&config.output, &outcome.records)?;
        self.storage.write_report(&config.report, &report)?;

        metrics::stage_duration("remediate", started.elapsed().as_secs_f64());
        Ok(RemediationRunResult {
            outcome,
            output: config.output.clone(),
            report: config.report.clone(),
        })
    }

    /// Validates any ingredient file; the report is written only when a path is given.
    pub fn run_validation(&self, input: &Path, report: Option<&Path>) -> Result<ValidationRunResult> {
        let span = info_span!("validation_run", input = %input.display());
        let _enter = span.enter();
        let started = Instant::now();

        let records = ingestion::read_records(input, &NormalizationRegistry::new())?;
        let summary = DefaultQualityGate::new(&self.rules.reference_standards).validate(&records);
        let report_text = ValidationReport {
            source: &input.display().to_string(),
            summary: &summary,
            generated_at: Local::now(),
        }
        .render();

        if let Some(path) = report {
            self.storage.write_report(path, &report_text)?;
        }

        metrics::stage_duration("validate", started.elapsed().as_secs_f64());
        Ok(ValidationRunResult {
            summary,
            report_text,
            report: report.map(Path::to_path_buf),
        })
    }

    pub fn run_tag_regions(&self, input: &Path, output: &Path) -> Result<TagRunResult> {
        let span = info_span!("tag_regions_run", input = %input.display());
        let _enter = span.enter();
        let started = Instant::now();

        let mut records = ingestion::read_records(input, &NormalizationRegistry::new())?;
        let tagged = RegionalTagger::new(&self.rules.regional_patterns)?.enrich(&mut records);

        self.storage.write_records(output, &records)?;

        metrics::stage_duration("tag_regions", started.elapsed().as_secs_f64());
        Ok(TagRunResult {
            records,
            tagged,
            output: output.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeparationMode, SourceFile};
    use std::fs;
    use storage::InMemoryStorage;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn merge_config(dir: &Path, sources: Vec<SourceFile>) -> MergeConfig {
        MergeConfig {
            sources,
            output: dir.join("merged.json"),
            report: dir.join("MERGE_REPORT.md"),
            ..MergeConfig::default()
        }
    }

    #[test]
    fn test_failed_load_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "a.json", r#"[{"name": "Corn", "crude_protein": 8.5}]"#);
        let config = merge_config(
            dir.path(),
            vec![
                SourceFile { tag: "a".to_string(), path: good },
                SourceFile { tag: "b".to_string(), path: dir.path().join("missing.json") },
            ],
        );
        let rules = RuleSet::builtin();
        let storage = InMemoryStorage::new();

        let result = Pipeline::new(&rules, &storage).run_merge(&config);

        assert!(result.is_err());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn test_merge_run_writes_list_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "ingredient",
            r#"[{"ingredient_id": 7, "name": "Corn", "crude_protein": 8.5},
                {"ingredient_id": 9, "name": "Fish meal", "crude_protein": 65}]"#,
        );
        let b = write(dir.path(), "new_regional.json", r#"[{"name": "corn grain", "crude_protein": 9.0}]"#);
        let config = merge_config(
            dir.path(),
            vec![
                SourceFile { tag: "ingredient".to_string(), path: a },
                SourceFile { tag: "new_regional.json".to_string(), path: b },
            ],
        );
        let rules = RuleSet::builtin();
        let storage = InMemoryStorage::new();

        let result = Pipeline::new(&rules, &storage).run_merge(&config).unwrap();

        let written = storage.records(&config.output).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].id, Some(1));
        assert_eq!(written[0].crude_protein, Some(8.5));
        assert_eq!(written[1].standardized_name, "Fish meal, 65% protein");
        assert_eq!(result.dataset.loaded, 3);
        assert_eq!(result.dataset.merges, 1);
        let report = storage.report(&config.report).unwrap();
        assert!(report.contains("MERGED: 'Corn' ← 'corn grain'"));
    }

    #[test]
    fn test_remediation_run_reads_merged_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "merged.json",
            r#"[{"ingredient_id": 36, "name": "Fish meal, 62% protein", "crude_protein": 62.0}]"#,
        );
        let config = RemediateConfig {
            input,
            output: dir.path().join("standardized.json"),
            report: dir.path().join("REMEDIATION_REPORT.md"),
            separation_mode: SeparationMode::EmitAll,
        };
        let rules = RuleSet::builtin();
        let storage = InMemoryStorage::new();

        let result = Pipeline::new(&rules, &storage).run_remediation(&config).unwrap();

        assert_eq!(result.outcome.records.len(), 3);
        assert_eq!(storage.records(&config.output).unwrap().len(), 3);
        assert!(storage
            .report(&config.report)
            .unwrap()
            .contains("Separated into 3 distinct ingredients"));
    }

    #[test]
    fn test_validation_run_without_report_path_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "x.json", r#"[{"name": "Mystery", "crude_protein": 120}]"#);
        let rules = RuleSet::builtin();
        let storage = InMemoryStorage::new();

        let result = Pipeline::new(&rules, &storage).run_validation(&input, None).unwrap();

        assert_eq!(result.summary.range_warnings().len(), 1);
        assert!(result.report_text.contains("RANGE CHECK"));
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn test_tag_regions_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "std.json", r#"[{"name": "Moringa leaf meal"}, {"name": "Grape pomace"}]"#);
        let rules = RuleSet::builtin();
        let storage = InMemoryStorage::new();

        let result = Pipeline::new(&rules, &storage).run_tag_regions(&input, &input).unwrap();

        assert_eq!(result.tagged, 2);
        let written = storage.records(&input).unwrap();
        assert_eq!(written[0].region.as_deref(), Some("Africa, Asia"));
        assert_eq!(written[1].region.as_deref(), Some("Global"));
    }
}
