use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use super::normalizers::{
    BaseNormalizer, DatabaseExportNormalizer, InitialCatalogNormalizer, RegionalNormalizer,
    SourceNormalizer,
};
use crate::constants;
use crate::domain::IngredientRecord;

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<String, Box<dyn SourceNormalizer>>,
    fallback: BaseNormalizer,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with predefined normalizers
    pub fn new() -> Self {
        let mut normalizers: HashMap<String, Box<dyn SourceNormalizer>> = HashMap::new();

        normalizers.insert(
            constants::DATABASE_EXPORT_SOURCE.to_string(),
            Box::new(DatabaseExportNormalizer::new()),
        );
        normalizers.insert(
            constants::INITIAL_CATALOG_SOURCE.to_string(),
            Box::new(InitialCatalogNormalizer::new()),
        );
        normalizers.insert(
            constants::REGIONAL_SOURCE.to_string(),
            Box::new(RegionalNormalizer::new()),
        );

        Self {
            normalizers,
            fallback: BaseNormalizer::new(),
        }
    }

    /// Register a normalizer for a specific source
    pub fn register(&mut self, source: String, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(source, normalizer);
    }

    /// The normalizer for a source, or the base normalizer when none is registered
    pub fn get_normalizer(&self, source: &str) -> &dyn SourceNormalizer {
        self.normalizers
            .get(source)
            .map(|n| n.as_ref())
            .unwrap_or(&self.fallback)
    }

    /// Normalizes one entry. Entries already in the target schema (they carry
    /// `standardized_name`, e.g. a previous merge output) are taken as they are,
    /// keeping their provenance and remediation fields.
    pub fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        if raw.contains_key("standardized_name") {
            match serde_json::from_value::<IngredientRecord>(Value::Object(raw.clone())) {
                Ok(mut record) => {
                    if record.source.is_empty() {
                        record.source = source.to_string();
                    }
                    return record;
                }
                Err(e) => debug!(error = %e, source, "Entry does not fit the target schema, normalizing"),
            }
        }
        self.get_normalizer(source).normalize(raw, source)
    }

    /// List all registered source tags
    pub fn list_sources(&self) -> Vec<&str> {
        self.normalizers.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
