//! Normalization: every raw entry becomes an [`IngredientRecord`] with the
//! full target schema, using the strategy registered for its source.

pub mod normalizers;
pub mod registry;

pub use registry::NormalizationRegistry;

use tracing::{debug, info, info_span};

use crate::domain::IngredientRecord;
use crate::observability::metrics;
use crate::pipeline::ingestion::SourceBatch;

/// Trait for turning loaded source batches into target-schema records
pub trait Normalizer {
    fn normalize(&self, batches: &[SourceBatch]) -> Vec<IngredientRecord>;
}

/// Normalizer that dispatches each batch through a [`NormalizationRegistry`]
pub struct DefaultNormalizer {
    registry: NormalizationRegistry,
}

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self {
            registry: NormalizationRegistry::new(),
        }
    }

    pub fn with_registry(registry: NormalizationRegistry) -> Self {
        Self { registry }
    }
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for DefaultNormalizer {
    /// Records keep source order, and sources keep load order.
    fn normalize(&self, batches: &[SourceBatch]) -> Vec<IngredientRecord> {
        let span = info_span!("normalize");
        let _enter = span.enter();

        let mut records = Vec::new();
        for batch in batches {
            let strategy = self.registry.get_normalizer(&batch.tag).strategy();
            debug!(source = %batch.tag, strategy, "Normalizing source");
            records.extend(
                batch
                    .entries
                    .iter()
                    .map(|entry| self.registry.normalize(entry, &batch.tag)),
            );
        }

        info!(records = records.len(), "Normalized records");
        metrics::normalize::records_normalized(records.len());
        records
    }
}
