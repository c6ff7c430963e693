use serde_json::{Map, Value};

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::domain::IngredientRecord;

/// Normalizer for the regional ingredient table.
///
/// Regional entries are flat and may already name the region they come from.
pub struct RegionalNormalizer;

impl RegionalNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegionalNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for RegionalNormalizer {
    fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        let mut record = NormalizerUtils::build_record(raw, source);
        record.region = NormalizerUtils::text(raw, "region");
        record
    }

    fn strategy(&self) -> &'static str {
        "regional"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regional_entry_keeps_region() {
        let raw = json!({"name": "Moringa leaf meal", "crude_protein": 27.1, "region": "Africa"});

        let record = RegionalNormalizer::new().normalize(raw.as_object().unwrap(), "new_regional.json");

        assert_eq!(record.region.as_deref(), Some("Africa"));
        assert_eq!(record.crude_protein, Some(27.1));
        assert_eq!(record.id, None);
    }
}
