//! Quality gate over ingredient lists.
//!
//! Checks are advisory: issues are collected and reported, records are never
//! dropped and a run never fails because of them.

pub mod standards;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::constants;
use crate::domain::{IngredientRecord, Nutrient};
use crate::observability::metrics;
use crate::rules::ReferenceStandard;

/// Fields a record needs to count as complete.
pub const CORE_FIELDS: [Nutrient; 5] = [
    Nutrient::CrudeProtein,
    Nutrient::CrudeFiber,
    Nutrient::Calcium,
    Nutrient::TotalPhosphorus,
    Nutrient::MePoultry,
];

/// Proximate fractions that must each stay a percentage and jointly stay near 100.
const PROXIMATE: [Nutrient; 5] = [
    Nutrient::CrudeProtein,
    Nutrient::CrudeFiber,
    Nutrient::CrudeFat,
    Nutrient::Ash,
    Nutrient::Moisture,
];

/// Individual quality issue found during assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityIssue {
    pub issue_type: QualityIssueType,
    pub severity: QualitySeverity,
    pub ingredient_id: Option<i64>,
    pub ingredient: String,
    /// Field or attribute that triggered this issue
    pub field: Option<String>,
    /// Human-readable description, prefixed with the ingredient name
    pub description: String,
}

impl QualityIssue {
    pub(crate) fn new(
        issue_type: QualityIssueType,
        severity: QualitySeverity,
        record: &IngredientRecord,
        field: &str,
        description: String,
    ) -> Self {
        Self {
            issue_type,
            severity,
            ingredient_id: record.id,
            ingredient: record.label().to_string(),
            field: Some(field.to_string()),
            description,
        }
    }
}

/// Types of quality issues that can be detected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QualityIssueType {
    /// Value outside its plausibility bounds
    OutOfRange,
    /// Percentages above 100 or proximate fractions summing past the limit
    UnitInconsistency,
    /// Core composition fields absent
    MissingData,
    /// Value outside the published range for the ingredient
    StandardDeviation,
}

impl QualityIssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIssueType::OutOfRange => "out_of_range",
            QualityIssueType::UnitInconsistency => "unit_inconsistency",
            QualityIssueType::MissingData => "missing_data",
            QualityIssueType::StandardDeviation => "standard_deviation",
        }
    }

    pub fn all() -> [QualityIssueType; 4] {
        [
            QualityIssueType::OutOfRange,
            QualityIssueType::UnitInconsistency,
            QualityIssueType::MissingData,
            QualityIssueType::StandardDeviation,
        ]
    }
}

/// Severity levels for quality issues
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualitySeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// What the gate would do with a record if it were enforcing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QualityDecision {
    Accept,
    AcceptWithWarnings,
    /// Flagged for manual review
    Quarantine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub decision: QualityDecision,
    pub issues: Vec<QualityIssue>,
}

/// Trait for implementing Quality Gate assessment logic
pub trait QualityGate {
    fn assess(&self, record: &IngredientRecord) -> QualityAssessment;
}

#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    pub check_completeness: bool,
    pub check_reference_standards: bool,
    /// Share of a reference range's width allowed on either side
    pub tolerance: f64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            check_completeness: true,
            check_reference_standards: true,
            tolerance: constants::STANDARD_TOLERANCE,
        }
    }
}

/// Aggregated outcome of gating a whole list
#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    pub assessed: usize,
    pub complete: usize,
    pub accepted: usize,
    pub accepted_with_warnings: usize,
    pub quarantined: usize,
    pub issues: Vec<QualityIssue>,
}

impl ValidationSummary {
    pub fn of_type(&self, issue_type: QualityIssueType) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.issue_type == issue_type)
    }

    pub fn count(&self, issue_type: QualityIssueType) -> usize {
        self.of_type(issue_type).count()
    }

    /// Plausibility-range messages, in record order.
    pub fn range_warnings(&self) -> Vec<String> {
        self.of_type(QualityIssueType::OutOfRange)
            .map(|i| i.description.clone())
            .collect()
    }
}

/// Range, unit, completeness and reference-standard checks
pub struct DefaultQualityGate<'a> {
    standards: &'a [ReferenceStandard],
    config: QualityGateConfig,
}

impl<'a> DefaultQualityGate<'a> {
    pub fn new(standards: &'a [ReferenceStandard]) -> Self {
        Self::with_config(standards, QualityGateConfig::default())
    }

    pub fn with_config(standards: &'a [ReferenceStandard], config: QualityGateConfig) -> Self {
        Self { standards, config }
    }

    /// Assesses every record and records issue counts per type.
    pub fn validate(&self, records: &[IngredientRecord]) -> ValidationSummary {
        let span = info_span!("quality_gate", records = records.len());
        let _enter = span.enter();

        let mut summary = ValidationSummary {
            assessed: records.len(),
            ..ValidationSummary::default()
        };
        for record in records {
            if is_complete(record) {
                summary.complete += 1;
            }
            let assessment = self.assess(record);
            match assessment.decision {
                QualityDecision::Accept => summary.accepted += 1,
                QualityDecision::AcceptWithWarnings => summary.accepted_with_warnings += 1,
                QualityDecision::Quarantine => summary.quarantined += 1,
            }
            for issue in &assessment.issues {
                if issue.severity >= QualitySeverity::Warning {
                    warn!(
                        issue_type = issue.issue_type.as_str(),
                        field = issue.field.as_deref().unwrap_or(""),
                        "{}",
                        issue.description
                    );
                }
            }
            summary.issues.extend(assessment.issues);
        }

        for issue_type in QualityIssueType::all() {
            metrics::quality_gate::validation_issues(issue_type.as_str(), summary.count(issue_type));
        }
        info!(
            issues = summary.issues.len(),
            complete = summary.complete,
            quarantined = summary.quarantined,
            "Quality gate finished"
        );
        summary
    }

    fn determine_decision(&self, issues: &[QualityIssue]) -> QualityDecision {
        if issues.iter().any(|i| i.severity >= QualitySeverity::Error) {
            return QualityDecision::Quarantine;
        }
        if issues.iter().any(|i| i.severity == QualitySeverity::Warning) {
            return QualityDecision::AcceptWithWarnings;
        }
        QualityDecision::Accept
    }
}

impl QualityGate for DefaultQualityGate<'_> {
    fn assess(&self, record: &IngredientRecord) -> QualityAssessment {
        let mut issues = check_ranges(record);
        issues.extend(check_units(record));
        if self.config.check_completeness {
            issues.extend(check_completeness(record));
        }
        if self.config.check_reference_standards {
            issues.extend(standards::check_reference(record, self.standards, self.config.tolerance));
        }

        QualityAssessment {
            decision: self.determine_decision(&issues),
            issues,
        }
    }
}

/// Plausibility bounds. Zero and absent values are not checked; for energy only
/// the first offending species value is reported.
pub fn check_ranges(record: &IngredientRecord) -> Vec<QualityIssue> {
    let mut issues = Vec::new();

    let bounded = [
        (Nutrient::CrudeProtein, constants::PROTEIN_RANGE),
        (Nutrient::CrudeFiber, constants::FIBER_RANGE),
        (Nutrient::CrudeFat, constants::FAT_RANGE),
    ];
    for (nutrient, (min, max)) in bounded {
        let Some(value) = record.nutrient(nutrient).filter(|v| *v != 0.0) else {
            continue;
        };
        if value < min || value > max {
            issues.push(QualityIssue::new(
                QualityIssueType::OutOfRange,
                QualitySeverity::Warning,
                record,
                nutrient.key(),
                format!(
                    "{}: {} {}% outside typical range ({}-{}%)",
                    record.label(),
                    nutrient,
                    value,
                    min,
                    max
                ),
            ));
        }
    }

    let (min, max) = constants::ENERGY_RANGE;
    let offender = [Nutrient::MeGrowingPig, Nutrient::MePoultry, Nutrient::MeRuminant]
        .into_iter()
        .filter_map(|n| record.nutrient(n).filter(|v| *v != 0.0).map(|v| (n, v)))
        .find(|(_, v)| *v < min || *v > max);
    if let Some((nutrient, value)) = offender {
        issues.push(QualityIssue::new(
            QualityIssueType::OutOfRange,
            QualitySeverity::Warning,
            record,
            nutrient.key(),
            format!(
                "{}: Energy {} kcal/kg outside typical range ({}-{})",
                record.label(),
                value,
                min,
                max
            ),
        ));
    }

    issues
}

/// Percentages above 100 and proximate sums past the dry-matter tolerance.
///
/// Urea-type non-protein nitrogen sources carry crude protein as a nitrogen
/// equivalent above 100%; they get an informational note instead.
pub fn check_units(record: &IngredientRecord) -> Vec<QualityIssue> {
    let value = |n: Nutrient| record.nutrient(n).unwrap_or(0.0);

    if record.name.to_lowercase().contains("urea") {
        let cp = value(Nutrient::CrudeProtein);
        if cp > constants::PERCENT_LIMIT {
            return vec![QualityIssue::new(
                QualityIssueType::UnitInconsistency,
                QualitySeverity::Info,
                record,
                Nutrient::CrudeProtein.key(),
                format!("{}: CP={:.1}% is a nitrogen equivalent (N x 6.25)", record.label(), cp),
            )];
        }
    }

    let mut issues: Vec<QualityIssue> = PROXIMATE
        .into_iter()
        .filter(|n| value(*n) > constants::PERCENT_LIMIT)
        .map(|n| {
            QualityIssue::new(
                QualityIssueType::UnitInconsistency,
                QualitySeverity::Error,
                record,
                n.key(),
                format!("{}: {} = {:.2} (>100%)", record.label(), n.key(), value(n)),
            )
        })
        .collect();

    let total: f64 = PROXIMATE.into_iter().map(value).sum();
    if total > constants::PROXIMATE_SUM_LIMIT {
        issues.push(QualityIssue::new(
            QualityIssueType::UnitInconsistency,
            QualitySeverity::Error,
            record,
            "proximate_total",
            format!("{}: TOTAL = {:.2}% (sum exceeds 100%)", record.label(), total),
        ));
    }

    issues
}

/// Core fields the record does not carry.
pub fn missing_core_fields(record: &IngredientRecord) -> Vec<&'static str> {
    CORE_FIELDS
        .iter()
        .filter(|n| record.nutrient(**n).is_none())
        .map(|n| n.key())
        .collect()
}

pub fn is_complete(record: &IngredientRecord) -> bool {
    CORE_FIELDS.iter().all(|n| record.nutrient(*n).is_some())
}

pub fn check_completeness(record: &IngredientRecord) -> Option<QualityIssue> {
    let missing = missing_core_fields(record);
    if missing.is_empty() {
        return None;
    }
    Some(QualityIssue::new(
        QualityIssueType::MissingData,
        QualitySeverity::Info,
        record,
        missing[0],
        format!("{}: missing {}", record.label(), missing.join(", ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn complete(name: &str) -> IngredientRecord {
        let mut r = IngredientRecord::named(name, "ingredient");
        r.crude_protein = Some(20.0);
        r.crude_fiber = Some(5.0);
        r.calcium = Some(0.2);
        r.total_phosphorus = Some(0.5);
        r.me_poultry = Some(2800.0);
        r
    }

    #[test]
    fn test_out_of_range_protein_is_flagged() {
        let mut record = complete("Mystery meal");
        record.crude_protein = Some(120.0);

        let issues = check_ranges(&record);

        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].description,
            "Mystery meal: Crude protein 120% outside typical range (0-50%)"
        );
        assert!(check_ranges(&complete("Plain meal")).is_empty());
    }

    #[test]
    fn test_zero_values_are_not_range_checked() {
        let mut record = complete("Salt");
        record.crude_protein = Some(0.0);
        record.me_poultry = Some(0.0);

        assert!(check_ranges(&record).is_empty());
    }

    #[test]
    fn test_only_first_energy_offender_is_reported() {
        let mut record = complete("Fat blend");
        record.me_growing_pig = Some(12000.0);
        record.me_poultry = Some(11000.0);

        let issues = check_ranges(&record);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field.as_deref(), Some("me_growing_pig"));
        assert!(issues[0].description.contains("Energy 12000 kcal/kg"));
    }

    #[test]
    fn test_unit_consistency() {
        let mut record = complete("Dried whey");
        record.crude_protein = Some(12.0);
        record.crude_fat = Some(1.0);
        record.ash = Some(9.0);
        record.moisture = Some(90.0);

        let issues = check_units(&record);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.ends_with("TOTAL = 117.00% (sum exceeds 100%)"));

        record.moisture = Some(150.0);
        assert_eq!(check_units(&record).len(), 2);
    }

    #[test]
    fn test_urea_protein_is_informational() {
        let mut urea = complete("Urea (feed grade)");
        urea.crude_protein = Some(287.5);

        let issues = check_units(&urea);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, QualitySeverity::Info);
    }

    #[test]
    fn test_completeness() {
        let mut record = complete("Oats");
        assert!(is_complete(&record));
        assert!(check_completeness(&record).is_none());

        record.calcium = None;
        record.me_poultry = None;
        let issue = check_completeness(&record).unwrap();
        assert_eq!(issue.description, "Oats: missing calcium, me_poultry");
        assert!(!is_complete(&record));
    }

    #[test]
    fn test_gate_decisions() {
        let rules = RuleSet::builtin();
        let gate = DefaultQualityGate::new(&rules.reference_standards);

        assert_eq!(gate.assess(&complete("Moringa leaf")).decision, QualityDecision::Accept);

        let mut high = complete("Moringa leaf");
        high.crude_protein = Some(55.0);
        assert_eq!(gate.assess(&high).decision, QualityDecision::AcceptWithWarnings);

        high.crude_protein = Some(120.0);
        assert_eq!(gate.assess(&high).decision, QualityDecision::Quarantine);
    }

    #[test]
    fn test_validate_summarizes_list() {
        let rules = RuleSet::builtin();
        let gate = DefaultQualityGate::new(&rules.reference_standards);
        let mut bad = complete("Mystery meal");
        bad.crude_protein = Some(120.0);
        let records = vec![complete("Sesame cake"), bad, IngredientRecord::named("Premix", "x")];

        let summary = gate.validate(&records);

        assert_eq!(summary.assessed, 3);
        assert_eq!(summary.complete, 2);
        assert_eq!(summary.quarantined, 1);
        assert_eq!(summary.range_warnings().len(), 1);
        assert!(summary.range_warnings()[0].contains("120"));
        assert_eq!(summary.count(QualityIssueType::MissingData), 1);
    }

    #[test]
    fn test_empty_list_validates_cleanly() {
        let gate = DefaultQualityGate::new(&[]);

        let summary = gate.validate(&[]);

        assert_eq!(summary.assessed, 0);
        assert!(summary.issues.is_empty());
    }
}
