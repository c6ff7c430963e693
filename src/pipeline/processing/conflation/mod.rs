//! Conflation: folding the normalized stream into unique ingredients.

pub mod matcher;
pub mod merge;

pub use matcher::{policy_for, FuzzyNameMatcher, MatchPolicy, StandardNameMatcher};
pub use merge::merge_records;

use tracing::{debug, info, info_span};

use crate::config::MergeConfig;
use crate::domain::IngredientRecord;
use crate::observability::metrics;

/// Result of one deduplication pass
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub records: Vec<IngredientRecord>,
    /// Number of incoming records folded into an accepted one
    pub merges: usize,
    /// `MERGED: '<old>' ← '<new>'` lines for merges whose names differ
    pub merge_log: Vec<String>,
}

/// Builds the unique list in arrival order, merging each match into the accepted entry
pub struct Deduplicator {
    policy: Box<dyn MatchPolicy>,
}

impl Deduplicator {
    pub fn new(policy: Box<dyn MatchPolicy>) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(policy_for(config.policy, config.similarity_threshold))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn deduplicate(&self, records: Vec<IngredientRecord>) -> DedupOutcome {
        let span = info_span!("dedup", policy = self.policy.name(), incoming = records.len());
        let _enter = span.enter();

        let mut outcome = DedupOutcome::default();
        for mut record in records {
            match self.policy.find_match(&record, &outcome.records) {
                Some(index) => {
                    let accepted = &mut outcome.records[index];
                    if accepted.name != record.name {
                        let line = format!("MERGED: '{}' ← '{}'", accepted.name, record.name);
                        debug!("{}", line);
                        outcome.merge_log.push(line);
                    }
                    merge_records(accepted, &record);
                    outcome.merges += 1;
                }
                None => {
                    record.sources = record.provenance();
                    outcome.records.push(record);
                }
            }
        }

        info!(
            merges = outcome.merges,
            unique = outcome.records.len(),
            "Deduplication finished"
        );
        metrics::dedup::duplicates_merged(self.policy.name(), outcome.merges);
        outcome
    }
}

/// Renumbers records densely from 1 in list order.
pub fn assign_sequential_ids(records: &mut [IngredientRecord]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.id = Some(index as i64 + 1);
    }
}
