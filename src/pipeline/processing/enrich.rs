//! Regional tagging: each record gets the region of the first name pattern it matches.

use regex::Regex;
use tracing::{debug, info, info_span};

use crate::constants;
use crate::domain::IngredientRecord;
use crate::error::{MergeError, Result};
use crate::observability::metrics;
use crate::rules::RegionalPattern;

/// Trait for adding contextual tags to records
pub trait Enricher {
    /// Tags every record in place and returns how many were tagged.
    fn enrich(&self, records: &mut [IngredientRecord]) -> usize;
}

/// Assigns `region` from an ordered pattern table, falling back to a default region
pub struct RegionalTagger {
    patterns: Vec<(Regex, String)>,
    default_region: String,
}

impl RegionalTagger {
    pub fn new(patterns: &[RegionalPattern]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|regex| (regex, p.region.clone()))
                    .map_err(|source| MergeError::InvalidPattern {
                        pattern: p.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            default_region: constants::DEFAULT_REGION.to_string(),
        })
    }

    /// Region for a raw ingredient name.
    pub fn region_for(&self, name: &str) -> &str {
        let name_lower = name.to_lowercase();
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(&name_lower))
            .map(|(_, region)| region.as_str())
            .unwrap_or(&self.default_region)
    }
}

impl Enricher for RegionalTagger {
    /// Existing tags are overwritten so re-running on an edited table stays consistent.
    fn enrich(&self, records: &mut [IngredientRecord]) -> usize {
        let span = info_span!("enrich", records = records.len());
        let _enter = span.enter();

        for record in records.iter_mut() {
            let region = self.region_for(&record.name).to_string();
            debug!(name = %record.name, region = %region, "Region assigned");
            record.region = Some(region);
        }

        info!(tagged = records.len(), "Regional tagging finished");
        metrics::enrich::regions_tagged(records.len());
        records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn tagger() -> RegionalTagger {
        RegionalTagger::new(&RuleSet::builtin().regional_patterns).unwrap()
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let tagger = tagger();

        assert_eq!(tagger.region_for("Cassava root meal"), "Africa, Asia");
        assert_eq!(tagger.region_for("Teff straw"), "Africa");
        assert_eq!(tagger.region_for("Rice bran, full fat"), "Asia");
        // "wheat" is listed before "corn"
        assert_eq!(tagger.region_for("Wheat and corn screenings"), "Europe, Americas");
        assert_eq!(tagger.region_for("Palm kernel cake"), "Oceania, Global");
    }

    #[test]
    fn test_unmatched_name_gets_default_region() {
        assert_eq!(tagger().region_for("Grape pomace"), "Global");
        assert_eq!(tagger().region_for(""), "Global");
    }

    #[test]
    fn test_enrich_overwrites_existing_tags() {
        let tagger = tagger();
        let mut records = vec![
            IngredientRecord::named("Soybean meal", "a"),
            IngredientRecord::named("Kelp meal", "b"),
        ];
        records[0].region = Some("Asia".to_string());

        let tagged = tagger.enrich(&mut records);

        assert_eq!(tagged, 2);
        assert_eq!(records[0].region.as_deref(), Some("Americas, Global"));
        assert_eq!(records[1].region.as_deref(), Some("Oceania, Global"));
    }

    #[test]
    fn test_invalid_regional_pattern_is_rejected() {
        let patterns = vec![RegionalPattern {
            pattern: "[".to_string(),
            region: "Nowhere".to_string(),
        }];

        assert!(matches!(
            RegionalTagger::new(&patterns),
            Err(MergeError::InvalidPattern { .. })
        ));
    }
}
