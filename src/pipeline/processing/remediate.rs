//! Remediation of a merged ingredient list: curated name corrections, then
//! separation of identifiers known to conflate distinct grades.

use std::collections::HashSet;
use tracing::{info, info_span, warn};

use crate::config::SeparationMode;
use crate::domain::IngredientRecord;
use crate::observability::metrics;
use crate::rules::{RuleSet, SeparationRules};

/// A name correction that was applied
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCorrection {
    pub id: i64,
    /// Name the correction table expected
    pub from: String,
    pub to: String,
}

/// A record that was replaced by its variants
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSeparation {
    pub original_id: i64,
    pub original_name: String,
    /// Names of the emitted variants, in table order
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemediationOutcome {
    pub records: Vec<IngredientRecord>,
    pub original_count: usize,
    pub corrections: Vec<AppliedCorrection>,
    pub separations: Vec<AppliedSeparation>,
}

impl RemediationOutcome {
    /// Records added by separation, net of the originals they replaced
    pub fn net_increase(&self) -> i64 {
        self.records.len() as i64 - self.original_count as i64
    }
}

/// Applies the correction and separation tables it was built with
pub struct Remediator<'a> {
    rules: &'a RuleSet,
    mode: SeparationMode,
}

impl<'a> Remediator<'a> {
    pub fn new(rules: &'a RuleSet, mode: SeparationMode) -> Self {
        Self { rules, mode }
    }

    /// Renames the record if its identifier has a curated correction.
    pub fn correct(&self, record: &mut IngredientRecord) -> Option<AppliedCorrection> {
        let correction = self.rules.correction_for(record.id?)?;

        if record.name != correction.from {
            warn!(
                id = correction.id,
                expected = %correction.from,
                found = %record.name,
                "Correction target does not carry the expected name"
            );
        }
        record.name = correction.to.clone();
        record.standardized_name = correction.to.clone();
        if let Some(reference) = self.rules.reference_for(&correction.to) {
            record.standard_reference = Some(reference.to_string());
        }

        Some(AppliedCorrection {
            id: correction.id,
            from: correction.from.clone(),
            to: correction.to.clone(),
        })
    }

    /// One shallow copy of `record` per variant, numbered from `next_id`.
    ///
    /// In [`SeparationMode::EmitAll`] every variant is emitted and the predicate
    /// outcome is only recorded. In [`SeparationMode::Conditional`] only variants
    /// whose predicate holds are emitted.
    pub fn separate(
        &self,
        record: &IngredientRecord,
        rules: &SeparationRules,
        next_id: &mut i64,
    ) -> Vec<IngredientRecord> {
        let mut variants = Vec::new();
        for variant in &rules.variants {
            let holds = variant.condition.holds(record);
            if self.mode == SeparationMode::Conditional && !holds {
                continue;
            }

            let mut separated = record.clone();
            separated.id = Some(*next_id);
            separated.name = variant.name.clone();
            separated.standardized_name = variant.name.clone();
            separated.separation_notes = Some(variant.note.clone());
            separated.original_id = Some(rules.id);
            separated.condition_met = Some(holds);
            if let Some(reference) = self.rules.reference_for(&variant.name) {
                separated.standard_reference = Some(reference.to_string());
            }

            variants.push(separated);
            *next_id += 1;
        }
        variants
    }

    pub fn remediate(&self, records: Vec<IngredientRecord>) -> RemediationOutcome {
        let span = info_span!("remediate", records = records.len());
        let _enter = span.enter();

        let mut outcome = RemediationOutcome {
            original_count: records.len(),
            ..RemediationOutcome::default()
        };
        let mut next_id: i64 = 1;
        let mut separated_ids = HashSet::new();

        for mut record in records {
            if let Some(id) = record.id {
                if separated_ids.contains(&id) {
                    warn!(id, name = %record.name, "Identifier already separated, skipping");
                    continue;
                }
            }

            if let Some(correction) = self.correct(&mut record) {
                info!(id = correction.id, to = %correction.to, "Name corrected");
                outcome.corrections.push(correction);
            }

            let rules = record.id.and_then(|id| self.rules.separation_for(id));
            let variants = match rules {
                Some(rules) => self.separate(&record, rules, &mut next_id),
                None => Vec::new(),
            };

            match rules {
                Some(rules) if !variants.is_empty() => {
                    info!(id = rules.id, variants = variants.len(), "Record separated");
                    separated_ids.insert(rules.id);
                    outcome.separations.push(AppliedSeparation {
                        original_id: rules.id,
                        original_name: record.name.clone(),
                        names: variants.iter().map(|v| v.name.clone()).collect(),
                    });
                    outcome.records.extend(variants);
                }
                _ => {
                    record.id = Some(next_id);
                    next_id += 1;
                    outcome.records.push(record);
                }
            }
        }

        let emitted: usize = outcome.separations.iter().map(|s| s.names.len()).sum();
        info!(
            original = outcome.original_count,
            remediated = outcome.records.len(),
            corrections = outcome.corrections.len(),
            separations = outcome.separations.len(),
            "Remediation finished"
        );
        metrics::remediate::names_corrected(outcome.corrections.len());
        metrics::remediate::records_separated(emitted);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, cp: Option<f64>) -> IngredientRecord {
        let mut r = IngredientRecord::named(name, "ingredient");
        r.id = Some(id);
        r.crude_protein = cp;
        r
    }

    #[test]
    fn test_correction_renames_and_attaches_reference() {
        let rules = RuleSet::builtin();
        let remediator = Remediator::new(&rules, SeparationMode::EmitAll);
        let mut wheat = record(86, "Wheat, soft", Some(11.5));

        let applied = remediator.correct(&mut wheat).unwrap();

        assert_eq!(applied.to, "Wheat grain");
        assert_eq!(wheat.name, "Wheat grain");
        assert_eq!(wheat.standardized_name, "Wheat grain");
        assert!(wheat.standard_reference.unwrap().starts_with("NRC 2012: 4-05-211"));
        assert!(remediator.correct(&mut record(2, "Barley", None)).is_none());
    }

    #[test]
    fn test_fish_meal_splits_into_three_variants() {
        let rules = RuleSet::builtin();
        let remediator = Remediator::new(&rules, SeparationMode::EmitAll);
        let records = vec![
            record(1, "Alfalfa meal, dehydrated, protein < 16%", Some(15.0)),
            record(36, "Fish meal, 62% protein", Some(62.0)),
            record(37, "Flaxseed meal", Some(34.0)),
        ];

        let outcome = remediator.remediate(records);

        let ids: Vec<i64> = outcome.records.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let fish: Vec<&IngredientRecord> =
            outcome.records.iter().filter(|r| r.original_id == Some(36)).collect();
        assert_eq!(fish.len(), 3);
        assert_eq!(fish[0].name, "Fish meal 62% CP");
        assert_eq!(fish[1].name, "Fish meal 65% CP");
        assert_eq!(fish[2].name, "Fish meal 70% CP");
        assert_eq!(fish[0].condition_met, Some(true));
        assert_eq!(fish[2].condition_met, Some(false));
        assert_eq!(outcome.records[4].name, "Flaxseed meal");
        assert_eq!(outcome.net_increase(), 2);
        assert_eq!(outcome.separations[0].original_name, "Fish meal 62% CP");
    }

    #[test]
    fn test_conditional_mode_emits_only_matching_variants() {
        let rules = RuleSet::builtin();
        let remediator = Remediator::new(&rules, SeparationMode::Conditional);

        let outcome = remediator.remediate(vec![record(36, "Fish meal", Some(66.0))]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "Fish meal 65% CP");
        assert_eq!(outcome.records[0].condition_met, Some(true));
    }

    #[test]
    fn test_conditional_mode_keeps_record_when_nothing_holds() {
        let rules = RuleSet::builtin();
        let remediator = Remediator::new(&rules, SeparationMode::Conditional);
        let mut bran = record(87, "Wheat bran", Some(15.0));
        bran.crude_fiber = Some(9.0);

        let outcome = remediator.remediate(vec![bran]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].original_id, None);
        assert!(outcome.separations.is_empty());
    }

    #[test]
    fn test_reappearing_separated_id_is_skipped() {
        let rules = RuleSet::builtin();
        let remediator = Remediator::new(&rules, SeparationMode::EmitAll);

        let outcome = remediator.remediate(vec![
            record(73, "Soybean meal, 48% CP, solvent extracted", Some(47.0)),
            record(73, "Soybean meal duplicate", Some(44.0)),
        ]);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.separations.len(), 1);
    }
}
