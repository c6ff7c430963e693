//! Field-by-field combination of a matched pair.
//!
//! The accepted record always wins a conflict between two present values, so
//! the outcome of several merges depends on the order records arrived in.

use crate::domain::{fill_missing, IngredientRecord};

/// Folds `incoming` into `existing`.
pub fn merge_records(existing: &mut IngredientRecord, incoming: &IngredientRecord) {
    existing.amino_acids_total.absorb(&incoming.amino_acids_total);
    existing.amino_acids_sid.absorb(&incoming.amino_acids_sid);
    existing.energy.absorb(&incoming.energy);
    existing.anti_nutritional_factors.absorb(&incoming.anti_nutritional_factors);
    existing.max_inclusion_pct.absorb(&incoming.max_inclusion_pct);

    existing.notes = join_text(existing.notes.take(), incoming.notes.as_deref(), "; ");
    existing.standard_reference = join_text(
        existing.standard_reference.take(),
        incoming.standard_reference.as_deref(),
        ", ",
    );

    fill_missing!(existing, incoming;
        id, category_id,
        crude_protein, crude_fiber, crude_fat, ash, moisture, starch,
        calcium, total_phosphorus, available_phosphorus, phytate_phosphorus,
        lysine, methionine,
        me_growing_pig, me_finishing_pig, me_adult_pig, me_poultry, me_ruminant, me_rabbit,
        de_salmonids,
        bulk_density, price_kg, available_qty,
        warning, regulatory_note,
        created_by, created_date,
        original_id, separation_notes, condition_met, region,
    );

    if existing.name.is_empty() {
        existing.name = incoming.name.clone();
    }
    if existing.standardized_name.is_empty() {
        existing.standardized_name = incoming.standardized_name.clone();
    }

    let mut sources = existing.provenance();
    sources.extend(incoming.provenance());
    existing.sources = sources;
}

/// Both present and different: joined. Otherwise whichever is present.
fn join_text(existing: Option<String>, incoming: Option<&str>, separator: &str) -> Option<String> {
    let existing = existing.filter(|s| !s.is_empty());
    let incoming = incoming.filter(|s| !s.is_empty());
    match (existing, incoming) {
        (Some(old), Some(new)) if old != new => Some(format!("{}{}{}", old, separator, new)),
        (Some(old), _) => Some(old),
        (None, new) => new.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_scalar_wins_and_gaps_fill() {
        let mut existing = IngredientRecord::named("Corn", "ingredient");
        existing.crude_protein = Some(8.5);
        let mut incoming = IngredientRecord::named("corn grain", "new_regional.json");
        incoming.crude_protein = Some(9.0);
        incoming.calcium = Some(0.02);

        merge_records(&mut existing, &incoming);

        assert_eq!(existing.name, "Corn");
        assert_eq!(existing.crude_protein, Some(8.5));
        assert_eq!(existing.calcium, Some(0.02));
        assert_eq!(
            existing.sources.iter().cloned().collect::<Vec<_>>(),
            vec!["ingredient".to_string(), "new_regional.json".to_string()]
        );
    }

    #[test]
    fn test_notes_and_references_are_joined() {
        let mut existing = IngredientRecord::named("Fish meal", "a");
        existing.notes = Some("Peruvian".to_string());
        existing.standard_reference = Some("NRC 2012".to_string());
        let mut incoming = IngredientRecord::named("Fish meal", "b");
        incoming.notes = Some("Danish".to_string());
        incoming.standard_reference = Some("CVB/INRA".to_string());

        merge_records(&mut existing, &incoming);

        assert_eq!(existing.notes.as_deref(), Some("Peruvian; Danish"));
        assert_eq!(existing.standard_reference.as_deref(), Some("NRC 2012, CVB/INRA"));

        let mut same = IngredientRecord::named("Fish meal", "c");
        same.notes = Some("Danish".to_string());
        let mut only_new = IngredientRecord::named("Fish meal", "d");
        only_new.notes = Some("Danish".to_string());
        merge_records(&mut same, &only_new);
        assert_eq!(same.notes.as_deref(), Some("Danish"));
    }

    #[test]
    fn test_nested_profiles_keep_old_values() {
        let mut existing = IngredientRecord::named("Soybean meal", "a");
        existing.amino_acids_total.lysine = Some(29.0);
        let mut incoming = IngredientRecord::named("Soybean meal", "b");
        incoming.amino_acids_total.lysine = Some(30.5);
        incoming.amino_acids_total.threonine = Some(18.0);
        incoming.max_inclusion_pct.pig_grower = 25.0;

        merge_records(&mut existing, &incoming);

        assert_eq!(existing.amino_acids_total.lysine, Some(29.0));
        assert_eq!(existing.amino_acids_total.threonine, Some(18.0));
        assert_eq!(existing.max_inclusion_pct.pig_grower, 25.0);
    }

    #[test]
    fn test_three_way_merge_keeps_first_entered_value() {
        let mut a = IngredientRecord::named("Barley", "a");
        a.crude_fiber = Some(4.5);
        let mut b = IngredientRecord::named("Barley", "b");
        b.crude_fiber = Some(5.0);
        let mut c = IngredientRecord::named("Barley", "c");
        c.crude_fiber = Some(5.5);

        let mut abc = a.clone();
        merge_records(&mut abc, &b);
        merge_records(&mut abc, &c);

        let mut cba = c.clone();
        merge_records(&mut cba, &b);
        merge_records(&mut cba, &a);

        assert_eq!(abc.crude_fiber, Some(4.5));
        assert_eq!(cba.crude_fiber, Some(5.5));
        assert_eq!(abc.sources, cba.sources);
    }
}
