use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::MatchPolicyKind;
use crate::constants;
use crate::domain::{IngredientRecord, Nutrient};

static ARTICLES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(a|an|the)\b").expect("valid article regex"));

static QUALIFIERS: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<String> = constants::QUALIFIER_WORDS
        .iter()
        .map(|w| regex::escape(w))
        .collect();
    Regex::new(&format!(r"\s+({})\b", words.join("|"))).expect("valid qualifier regex")
});

/// Decides which accepted record, if any, an incoming record duplicates
pub trait MatchPolicy: Send + Sync {
    /// Index of the matched record in `accepted`, scanning in list order
    fn find_match(&self, candidate: &IngredientRecord, accepted: &[IngredientRecord]) -> Option<usize>;

    fn name(&self) -> &'static str;
}

/// Builds the policy selected in configuration
pub fn policy_for(kind: MatchPolicyKind, similarity_threshold: f64) -> Box<dyn MatchPolicy> {
    match kind {
        MatchPolicyKind::FuzzyName => Box::new(FuzzyNameMatcher::new(similarity_threshold)),
        MatchPolicyKind::StandardName => Box::new(StandardNameMatcher::new()),
    }
}

/// Matches on edit-distance similarity of names stripped of articles and qualifiers.
///
/// The first accepted record at or above the threshold wins, even if a later
/// one would score higher.
pub struct FuzzyNameMatcher {
    threshold: f64,
}

impl FuzzyNameMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Comparison form of a name: `"The Corn Meal"` → `"corn"`.
    pub fn base_name(name: &str) -> String {
        let lower = name.trim().to_lowercase();
        let without_articles = ARTICLES.replace_all(&lower, "");
        let without_qualifiers = QUALIFIERS.replace_all(&without_articles, "");
        without_qualifiers.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Normalized Levenshtein similarity of the base names; 0 when either is empty.
    pub fn similarity(a: &str, b: &str) -> f64 {
        let (a, b) = (Self::base_name(a), Self::base_name(b));
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        strsim::normalized_levenshtein(&a, &b)
    }
}

impl MatchPolicy for FuzzyNameMatcher {
    fn find_match(&self, candidate: &IngredientRecord, accepted: &[IngredientRecord]) -> Option<usize> {
        accepted
            .iter()
            .position(|existing| Self::similarity(&candidate.name, &existing.name) >= self.threshold)
    }

    fn name(&self) -> &'static str {
        "fuzzy_name"
    }
}

/// Matches on exact standardized name, unless the nutrient profiles differ too much
pub struct StandardNameMatcher {
    gates: Vec<(Nutrient, f64)>,
}

impl StandardNameMatcher {
    pub fn new() -> Self {
        Self {
            gates: vec![
                (Nutrient::CrudeProtein, constants::GATE_CRUDE_PROTEIN),
                (Nutrient::CrudeFiber, constants::GATE_CRUDE_FIBER),
                (Nutrient::CrudeFat, constants::GATE_CRUDE_FAT),
                (Nutrient::MeGrowingPig, constants::GATE_ME_GROWING_PIG),
            ],
        }
    }

    /// Reason the two records must stay apart, if any.
    ///
    /// A nutrient is only compared when both sides carry it, and skipped when both
    /// are zero. Merging never changes a value that is present, so a veto still
    /// holds on a second pass and deduplication stays idempotent.
    pub fn nutrient_veto(&self, a: &IngredientRecord, b: &IngredientRecord) -> Option<String> {
        self.gates.iter().find_map(|(nutrient, threshold)| {
            let (Some(va), Some(vb)) = (a.nutrient(*nutrient), b.nutrient(*nutrient)) else {
                return None;
            };
            if va == 0.0 && vb == 0.0 {
                return None;
            }
            let diff = (va - vb).abs();
            (diff > *threshold).then(|| {
                format!("{} differs by {:.1} (threshold: {})", nutrient.key(), diff, threshold)
            })
        })
    }
}

impl Default for StandardNameMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchPolicy for StandardNameMatcher {
    fn find_match(&self, candidate: &IngredientRecord, accepted: &[IngredientRecord]) -> Option<usize> {
        accepted.iter().position(|existing| {
            if existing.standardized_name != candidate.standardized_name {
                return false;
            }
            match self.nutrient_veto(candidate, existing) {
                Some(reason) => {
                    debug!(
                        name = %candidate.standardized_name,
                        reason = %reason,
                        "Same standardized name kept separate"
                    );
                    false
                }
                None => true,
            }
        })
    }

    fn name(&self) -> &'static str {
        "standard_name"
    }
}
