use serde_json::{Map, Value};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::domain::IngredientRecord;

/// Normalizer for the application database export.
///
/// Rows come straight out of a SQL table: nested profiles are stored as JSON
/// text, numbers are often strings, and flags are 0/1 or booleans.
pub struct DatabaseExportNormalizer;

impl DatabaseExportNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DatabaseExportNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for DatabaseExportNormalizer {
    fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        let mut record = NormalizerUtils::build_record(raw, source);

        // Empty text columns are NULLs that went through a string cast
        for column in [
            &mut record.warning,
            &mut record.regulatory_note,
            &mut record.notes,
            &mut record.created_by,
            &mut record.created_date,
        ] {
            if column.as_deref().is_some_and(|s| s.trim().is_empty() || s == "NULL") {
                *column = None;
            }
        }

        record
    }

    fn strategy(&self) -> &'static str {
        "database_export"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_row_with_text_columns() {
        let raw = json!({
            "ingredient_id": "17",
            "id": 99,
            "name": "Cassava root meal, dried",
            "crude_protein": "2.8",
            "favourite": true,
            "notes": "NULL",
            "anti_nutritional_factors": "{\"tanninsPpm\": 1200}"
        });

        let record = DatabaseExportNormalizer::new().normalize(raw.as_object().unwrap(), "ingredient");

        assert_eq!(record.id, Some(17));
        assert_eq!(record.crude_protein, Some(2.8));
        assert_eq!(record.favourite, 1);
        assert_eq!(record.notes, None);
        assert_eq!(record.anti_nutritional_factors.tannins_ppm, Some(1200.0));
        assert_eq!(record.source, "ingredient");
    }

    #[test]
    fn test_plain_id_key_is_an_alias() {
        let raw = json!({"id": 5, "name": "Oats"});
        let record = DatabaseExportNormalizer::new().normalize(raw.as_object().unwrap(), "ingredient");
        assert_eq!(record.id, Some(5));

        let raw = json!({"ingredient_id": null, "id": "6", "name": "Rye"});
        let record = DatabaseExportNormalizer::new().normalize(raw.as_object().unwrap(), "ingredient");
        assert_eq!(record.id, Some(6));
    }
}
