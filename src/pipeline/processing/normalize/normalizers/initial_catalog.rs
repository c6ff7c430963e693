use serde_json::{Map, Value};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::domain::IngredientRecord;

/// Normalizer for the hand-maintained initial ingredient catalog.
///
/// Entries are usually keyed by `id` and carry their energy values only in
/// the nested `energy` object, which the legacy scalars are filled from.
pub struct InitialCatalogNormalizer;

impl InitialCatalogNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InitialCatalogNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for InitialCatalogNormalizer {
    fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        NormalizerUtils::build_record(raw, source)
    }

    fn strategy(&self) -> &'static str {
        "initial_catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingredient_id_wins_over_id() {
        let raw = json!({"id": 8, "ingredient_id": 80, "name": "Oats"});
        let record = InitialCatalogNormalizer::new().normalize(raw.as_object().unwrap(), "x");
        assert_eq!(record.id, Some(80));
    }

    #[test]
    fn test_catalog_entry_uses_id_and_nested_energy() {
        let raw = json!({
            "id": 3,
            "name": "Barley",
            "crude_protein": 11.5,
            "energy": {"mePig": 3050, "mePoultry": 2750, "meRuminant": 2900}
        });

        let record =
            InitialCatalogNormalizer::new().normalize(raw.as_object().unwrap(), "initial_ingredients_.json");

        assert_eq!(record.id, Some(3));
        assert_eq!(record.me_growing_pig, Some(3050.0));
        assert_eq!(record.me_finishing_pig, None);
        assert_eq!(record.me_poultry, Some(2750.0));
        assert_eq!(record.me_ruminant, Some(2900.0));
    }
}
