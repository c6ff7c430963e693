//! Markdown run reports.
//!
//! Rendering is pure: every report is built from in-memory results and a
//! timestamp, and the caller decides where the text goes.

use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashMap};

use crate::config::SourceFile;
use crate::constants::{REPORT_GROUP_LIMIT, REPORT_LIST_LIMIT};
use crate::domain::IngredientRecord;
use crate::pipeline::processing::quality_gate::{self, QualityIssueType, ValidationSummary};
use crate::pipeline::processing::remediate::RemediationOutcome;

const RULE: &str = "================================================================================";

/// Share of `part` in `total`, 0 for an empty list.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Category frequencies, most frequent first, ties by category key.
pub fn category_distribution(records: &[IngredientRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let key = record
            .category_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}

/// Appends at most `limit` items, then an `... and N more` line.
fn push_capped(lines: &mut Vec<String>, items: &[String], limit: usize, prefix: &str) {
    for item in items.iter().take(limit) {
        lines.push(format!("{}{}", prefix, item));
    }
    if items.len() > limit {
        lines.push(format!("  ... and {} more", items.len() - limit));
    }
}

fn push_elision(out: &mut String, total: usize) {
    if total > REPORT_LIST_LIMIT {
        out.push_str(&format!("  ... and {} more\n\n", total - REPORT_LIST_LIMIT));
    }
}

/// Summary of a merge run
pub struct MergeReport<'a> {
    pub records: &'a [IngredientRecord],
    pub sources: &'a [SourceFile],
    pub policy: &'a str,
    pub merges: usize,
    pub merge_log: &'a [String],
    pub validation: &'a ValidationSummary,
    pub generated_at: DateTime<Local>,
}

impl MergeReport<'_> {
    pub fn render(&self) -> String {
        let total = self.records.len();
        let complete = self.records.iter().filter(|r| quality_gate::is_complete(r)).count();
        let standards_based: Vec<&IngredientRecord> =
            self.records.iter().filter(|r| r.is_standards_based).collect();

        let mut lines = vec![
            "# INGREDIENT DATASET MERGE REPORT".to_string(),
            RULE.to_string(),
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            String::new(),
            "## SUMMARY".to_string(),
            String::new(),
            "**Source Files:**".to_string(),
        ];
        for source in self.sources {
            lines.push(format!("  - {} ({})", source.tag, source.path.display()));
        }
        lines.push(String::new());
        lines.push(format!("Final dataset: {} unique ingredients", total));
        lines.push(format!("Duplicates merged: {} (policy: {})", self.merges, self.policy));
        lines.push(format!(
            "Complete records: {}/{} ({:.1}%)",
            complete,
            total,
            percent(complete, total)
        ));
        lines.push(format!(
            "Industry-standardized names: {}/{} ({:.1}%)",
            standards_based.len(),
            total,
            percent(standards_based.len(), total)
        ));
        lines.push(String::new());

        lines.push("## CATEGORY DISTRIBUTION".to_string());
        lines.push(String::new());
        for (category, count) in category_distribution(self.records) {
            lines.push(format!("  {}: {} ingredients", category, count));
        }
        lines.push(String::new());

        if !standards_based.is_empty() {
            lines.push("## STANDARDS-BASED INGREDIENTS".to_string());
            lines.push(String::new());
            let mut by_standard: BTreeMap<&str, Vec<&IngredientRecord>> = BTreeMap::new();
            for record in standards_based.iter().copied() {
                let reference = record.standard_reference.as_deref().unwrap_or("Unknown");
                by_standard.entry(reference).or_default().push(record);
            }
            for (standard, group) in by_standard {
                lines.push(format!("### {}", standard));
                lines.push(String::new());
                let entries: Vec<String> = group
                    .iter()
                    .map(|r| {
                        let cp = r
                            .crude_protein
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "N/A".to_string());
                        format!("{} (CP: {}%)", r.display_name(), cp)
                    })
                    .collect();
                push_capped(&mut lines, &entries, REPORT_GROUP_LIMIT, "  - ");
                lines.push(String::new());
            }
        }

        if !self.merge_log.is_empty() {
            lines.push(format!("## DUPLICATES MERGED ({})", self.merge_log.len()));
            lines.push(String::new());
            push_capped(&mut lines, self.merge_log, REPORT_LIST_LIMIT, "  ");
            lines.push(String::new());
        }

        let warnings = self.validation.range_warnings();
        if !warnings.is_empty() {
            lines.push(format!("## DATA VALIDATION WARNINGS ({})", warnings.len()));
            lines.push(String::new());
            push_capped(&mut lines, &warnings, REPORT_LIST_LIMIT, "  ⚠ ");
            lines.push(String::new());
        }

        lines.push(RULE.to_string());
        lines.join("\n")
    }
}

/// Summary of a remediation run
pub struct RemediationReport<'a> {
    pub outcome: &'a RemediationOutcome,
    pub generated_at: DateTime<Local>,
}

impl RemediationReport<'_> {
    pub fn render(&self) -> String {
        let outcome = self.outcome;
        let mut out = String::new();

        out.push_str("# INGREDIENT STANDARDIZATION REMEDIATION REPORT\n");
        out.push_str(&format!("{}\n\n", RULE));
        out.push_str(&format!("Generated: {}\n", self.generated_at.to_rfc3339()));
        out.push_str(&format!("Original ingredients: {}\n", outcome.original_count));
        out.push_str(&format!("Remediated ingredients: {}\n", outcome.records.len()));
        out.push_str(&format!(
            "Net increase from separations: {}\n\n",
            outcome.net_increase()
        ));

        if !outcome.corrections.is_empty() {
            out.push_str("## NAME CORRECTIONS APPLIED\n\n");
            out.push_str(&format!("Total corrections: {}\n\n", outcome.corrections.len()));
            for correction in outcome.corrections.iter().take(REPORT_LIST_LIMIT) {
                out.push_str(&format!("**ID {}:**\n", correction.id));
                out.push_str(&format!("- From: `{}`\n", correction.from));
                out.push_str(&format!("- To: `{}`\n\n", correction.to));
            }
            push_elision(&mut out, outcome.corrections.len());
        }

        if !outcome.separations.is_empty() {
            out.push_str("## INGREDIENT SEPARATIONS APPLIED\n\n");
            out.push_str(&format!("Total separations: {}\n\n", outcome.separations.len()));
            for separation in outcome.separations.iter().take(REPORT_LIST_LIMIT) {
                out.push_str(&format!(
                    "**Original ID {}: {}**\n\n",
                    separation.original_id, separation.original_name
                ));
                out.push_str(&format!(
                    "Separated into {} distinct ingredients:\n\n",
                    separation.names.len()
                ));
                for (index, name) in separation.names.iter().enumerate() {
                    out.push_str(&format!("{}. `{}`\n", index + 1, name));
                }
                out.push('\n');
            }
            push_elision(&mut out, outcome.separations.len());
        }

        out.push_str("## INDUSTRY STANDARDS APPLIED\n\n");
        out.push_str("**Standards referenced in remediation:**\n\n");
        out.push_str("- **NRC 2012:** Nutrient Requirements of Swine (National Research Council)\n");
        out.push_str("- **CVB:** Centraal Veevoeder Bureau (Netherlands Feed Tables)\n");
        out.push_str("- **INRA:** Institut National de Recherche Agronomique (France)\n");
        out.push_str("- **FAO:** Global Feed Composition Database\n");
        out.push_str("- **ASABE:** American Society of Agricultural & Biological Engineers\n");
        out
    }
}

/// Full quality gate findings for one file
pub struct ValidationReport<'a> {
    pub source: &'a str,
    pub summary: &'a ValidationSummary,
    pub generated_at: DateTime<Local>,
}

impl ValidationReport<'_> {
    pub fn render(&self) -> String {
        let summary = self.summary;
        let mut lines = vec![
            "# INGREDIENT DATA VALIDATION REPORT".to_string(),
            RULE.to_string(),
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            format!("File: {}", self.source),
            String::new(),
            format!("Total ingredients: {}", summary.assessed),
            format!(
                "Complete records: {}/{} ({:.1}%)",
                summary.complete,
                summary.assessed,
                percent(summary.complete, summary.assessed)
            ),
            format!("Accepted: {}", summary.accepted),
            format!("Accepted with warnings: {}", summary.accepted_with_warnings),
            format!("Flagged for review: {}", summary.quarantined),
            String::new(),
        ];

        let sections = [
            (QualityIssueType::OutOfRange, "RANGE CHECK"),
            (QualityIssueType::UnitInconsistency, "UNIT CONSISTENCY CHECK"),
            (QualityIssueType::MissingData, "COMPLETENESS CHECK"),
            (QualityIssueType::StandardDeviation, "INDUSTRY STANDARDS CHECK"),
        ];
        for (index, (issue_type, title)) in sections.into_iter().enumerate() {
            lines.push(format!("## {}. {}", index + 1, title));
            lines.push(String::new());
            let found: Vec<String> = summary
                .of_type(issue_type)
                .map(|i| i.description.clone())
                .collect();
            if found.is_empty() {
                lines.push("[PASS] No issues found".to_string());
            } else {
                lines.push(format!("[FAIL] Found {} issues:", found.len()));
                push_capped(&mut lines, &found, REPORT_LIST_LIMIT, "  ");
            }
            lines.push(String::new());
        }

        lines.push(format!("Total issues: {}", summary.issues.len()));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::quality_gate::DefaultQualityGate;
    use crate::pipeline::processing::remediate::{AppliedCorrection, AppliedSeparation};
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn record(name: &str, category: Option<i64>, cp: Option<f64>) -> IngredientRecord {
        let mut r = IngredientRecord::named(name, "ingredient");
        r.category_id = category;
        r.crude_protein = cp;
        r
    }

    #[test]
    fn test_percent_guards_empty_list() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn test_category_distribution_orders_by_count_then_key() {
        let records = vec![
            record("A", Some(2), None),
            record("B", None, None),
            record("C", Some(1), None),
            record("D", Some(2), None),
            record("E", Some(1), None),
        ];

        let distribution = category_distribution(&records);

        assert_eq!(
            distribution,
            vec![
                ("1".to_string(), 2),
                ("2".to_string(), 2),
                ("Unknown".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_merge_report_caps_lists_and_lists_warnings() {
        let mut records = vec![record("Corn", Some(1), Some(8.5)), record("Mystery", None, Some(120.0))];
        records[0].is_standards_based = true;
        records[0].standard_reference = Some("CVB/INRA".to_string());
        let merge_log: Vec<String> = (0..25).map(|i| format!("MERGED: 'a{}' ← 'b{}'", i, i)).collect();
        let validation = DefaultQualityGate::new(&[]).validate(&records);

        let text = MergeReport {
            records: &records,
            sources: &[],
            policy: "fuzzy_name",
            merges: 25,
            merge_log: &merge_log,
            validation: &validation,
            generated_at: timestamp(),
        }
        .render();

        assert!(text.contains("Generated: 2024-05-01 09:30:00"));
        assert!(text.contains("Final dataset: 2 unique ingredients"));
        assert!(text.contains("Industry-standardized names: 1/2 (50.0%)"));
        assert!(text.contains("### CVB/INRA"));
        assert!(text.contains("  - Corn (CP: 8.5%)"));
        assert!(text.contains("MERGED: 'a19' ← 'b19'"));
        assert!(!text.contains("MERGED: 'a20' ← 'b20'"));
        assert!(text.contains("  ... and 5 more"));
        assert!(text.contains("⚠ Mystery: Crude protein 120% outside typical range (0-50%)"));
    }

    #[test]
    fn test_merge_report_on_empty_list() {
        let validation = ValidationSummary::default();

        let text = MergeReport {
            records: &[],
            sources: &[],
            policy: "fuzzy_name",
            merges: 0,
            merge_log: &[],
            validation: &validation,
            generated_at: timestamp(),
        }
        .render();

        assert!(text.contains("Complete records: 0/0 (0.0%)"));
        assert!(!text.contains("DUPLICATES MERGED"));
    }

    #[test]
    fn test_remediation_report_sections() {
        let outcome = RemediationOutcome {
            records: vec![record("x", None, None); 4],
            original_count: 2,
            corrections: vec![AppliedCorrection {
                id: 86,
                from: "Wheat, soft".to_string(),
                to: "Wheat grain".to_string(),
            }],
            separations: vec![AppliedSeparation {
                original_id: 36,
                original_name: "Fish meal 62% CP".to_string(),
                names: vec!["Fish meal 62% CP".to_string(), "Fish meal 65% CP".to_string()],
            }],
        };

        let text = RemediationReport {
            outcome: &outcome,
            generated_at: timestamp(),
        }
        .render();

        assert!(text.contains("Net increase from separations: 2"));
        assert!(text.contains("**ID 86:**\n- From: `Wheat, soft`\n- To: `Wheat grain`"));
        assert!(text.contains("**Original ID 36: Fish meal 62% CP**"));
        assert!(text.contains("Separated into 2 distinct ingredients:"));
        assert!(text.contains("2. `Fish meal 65% CP`"));
        assert!(text.contains("## INDUSTRY STANDARDS APPLIED"));
    }

    #[test]
    fn test_remediation_report_caps_listings() {
        let outcome = RemediationOutcome {
            records: Vec::new(),
            original_count: 0,
            corrections: (1..=25)
                .map(|id| AppliedCorrection {
                    id,
                    from: format!("old {}", id),
                    to: format!("new {}", id),
                })
                .collect(),
            separations: Vec::new(),
        };

        let text = RemediationReport {
            outcome: &outcome,
            generated_at: timestamp(),
        }
        .render();

        assert!(text.contains("Total corrections: 25"));
        assert!(text.contains("**ID 20:**"));
        assert!(!text.contains("**ID 21:**"));
        assert!(text.contains("  ... and 5 more"));
    }

    #[test]
    fn test_validation_report_passes_clean_sections() {
        let records = vec![record("Mystery", None, Some(120.0))];
        let summary = DefaultQualityGate::new(&[]).validate(&records);

        let text = ValidationReport {
            source: "ingredients.json",
            summary: &summary,
            generated_at: timestamp(),
        }
        .render();

        assert!(text.contains("## 1. RANGE CHECK\n\n[FAIL] Found 1 issues:"));
        assert!(text.contains("## 4. INDUSTRY STANDARDS CHECK\n\n[PASS] No issues found"));
        assert!(text.contains("Flagged for review: 1"));
    }
}
