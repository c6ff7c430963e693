//! Comparison against published composition ranges.

use super::{QualityIssue, QualityIssueType, QualitySeverity};
use crate::domain::{IngredientRecord, Nutrient};
use crate::rules::{ReferenceRange, ReferenceStandard};

/// First standard whose name fragment appears in `name`, case-insensitively.
pub fn find_standard<'a>(name: &str, standards: &'a [ReferenceStandard]) -> Option<&'a ReferenceStandard> {
    let name_lower = name.to_lowercase();
    standards
        .iter()
        .find(|s| name_lower.contains(&s.name_contains.to_lowercase()))
}

/// Range bounds pushed outwards by `tolerance` times the range width.
pub fn widen(range: &ReferenceRange, tolerance: f64) -> (f64, f64) {
    let width = range.max - range.min;
    (range.min - width * tolerance, range.max + width * tolerance)
}

/// Deviations of `record` from its matching reference standard.
///
/// A value the record does not carry reads as zero, so a standard that lists a
/// nutrient also flags records missing it.
pub fn check_reference(
    record: &IngredientRecord,
    standards: &[ReferenceStandard],
    tolerance: f64,
) -> Vec<QualityIssue> {
    let Some(standard) = find_standard(&record.name, standards) else {
        return Vec::new();
    };

    standard
        .ranges
        .iter()
        .filter_map(|range| {
            let value = record.nutrient(range.nutrient).unwrap_or(0.0);
            let (low, high) = widen(range, tolerance);
            if (low..=high).contains(&value) {
                return None;
            }
            Some(QualityIssue::new(
                QualityIssueType::StandardDeviation,
                severity_for(range.nutrient),
                record,
                range.nutrient.key(),
                format!(
                    "{}: {} {:.1}{} outside range {:.1}-{:.1} ({})",
                    record.label(),
                    range.nutrient,
                    value,
                    range.nutrient.unit(),
                    low,
                    high,
                    range.source
                ),
            ))
        })
        .collect()
}

/// Protein, limiting amino acids and energy drive formulation; fiber less so.
fn severity_for(nutrient: Nutrient) -> QualitySeverity {
    match nutrient {
        Nutrient::CrudeProtein
        | Nutrient::LysineTotal
        | Nutrient::MethionineTotal
        | Nutrient::EnergyMePig
        | Nutrient::EnergyNePig => QualitySeverity::Error,
        _ => QualitySeverity::Warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STANDARD_TOLERANCE;
    use crate::rules::RuleSet;

    #[test]
    fn test_widened_range() {
        let range = ReferenceRange {
            nutrient: Nutrient::CrudeProtein,
            min: 46.0,
            max: 49.0,
            source: "NRC 2012".to_string(),
        };

        let (low, high) = widen(&range, 0.15);

        assert!((low - 45.55).abs() < 1e-9);
        assert!((high - 49.45).abs() < 1e-9);
    }

    #[test]
    fn test_first_matching_standard_wins() {
        let standards = RuleSet::builtin().reference_standards;

        assert_eq!(find_standard("Maize (Corn)", &standards).unwrap().name_contains, "Maize");
        assert_eq!(find_standard("corn grain", &standards).unwrap().name_contains, "Corn");
        assert!(find_standard("Moringa leaf", &standards).is_none());
    }

    #[test]
    fn test_deviation_is_reported_outside_tolerance() {
        let standards = RuleSet::builtin().reference_standards;
        let mut barley = IngredientRecord::named("Barley", "ingredient");
        barley.crude_protein = Some(11.5);
        barley.crude_fiber = Some(9.0);
        barley.amino_acids_total.lysine = Some(4.0);
        barley.energy.me_pig = Some(3050.0);
        barley.energy.ne_pig = Some(2050.0);

        let issues = check_reference(&barley, &standards, STANDARD_TOLERANCE);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field.as_deref(), Some("crude_fiber"));
        assert_eq!(issues[0].severity, QualitySeverity::Warning);
        assert!(issues[0].description.starts_with("Barley: Crude fiber 9.0% outside range"));
        assert!(issues[0].description.ends_with("(CVB 2021)"));
    }

    #[test]
    fn test_missing_value_reads_as_zero() {
        let standards = RuleSet::builtin().reference_standards;
        let mut meal = IngredientRecord::named("Canola meal", "ingredient");
        meal.crude_protein = Some(38.0);
        meal.crude_fiber = Some(11.0);
        meal.amino_acids_total.lysine = Some(20.0);

        let issues = check_reference(&meal, &standards, STANDARD_TOLERANCE);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field.as_deref(), Some("energy.mePig"));
        assert_eq!(issues[0].severity, QualitySeverity::Error);
    }
}
