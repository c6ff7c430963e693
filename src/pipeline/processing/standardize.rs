//! Industry-standard naming.
//!
//! A raw name is matched against an ordered pattern table; the first pattern
//! that resolves decides the canonical name. Names that match nothing keep
//! their text with whitespace and comma spacing cleaned up.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, info_span};

use crate::constants;
use crate::domain::IngredientRecord;
use crate::error::{MergeError, Result};
use crate::observability::metrics;
use crate::rules::{SeparationAxis, StandardPatternRule};

static AMINO_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(l-|dl-)?(lysine|methionine|threonine|tryptophan)").expect("valid amino acid regex")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid comma regex"));

/// Outcome of standardizing one name
#[derive(Debug, Clone, PartialEq)]
pub struct StandardName {
    pub name: String,
    /// Whether the name came from the pattern table with a grade or variant
    pub standards_based: bool,
    pub reference: Option<String>,
}

impl StandardName {
    fn table(name: String, standards_based: bool, reference: &str) -> Self {
        Self {
            name,
            standards_based,
            reference: Some(reference.to_string()),
        }
    }
}

struct CompiledPattern {
    rule: StandardPatternRule,
    regex: Regex,
}

/// Maps raw names onto canonical names using an injected pattern table
pub struct NameStandardizer {
    patterns: Vec<CompiledPattern>,
}

impl NameStandardizer {
    /// Compiles the table, keeping its order.
    pub fn new(rules: &[StandardPatternRule]) -> Result<Self> {
        let patterns = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|source| MergeError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
                Ok(CompiledPattern {
                    rule: rule.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Canonical name for `raw_name`. Pure: the same input always gives the same output.
    pub fn standardize(&self, raw_name: &str, crude_protein: Option<f64>) -> StandardName {
        let name_lower = raw_name.to_lowercase();

        for pattern in &self.patterns {
            if !pattern.regex.is_match(&name_lower) {
                continue;
            }
            let rule = &pattern.rule;
            let resolved = match &rule.axis {
                SeparationAxis::ProteinGrade { bands } => {
                    let cp = crude_protein.unwrap_or(0.0);
                    if cp > 0.0 {
                        bands
                            .iter()
                            .find(|band| band.below.map_or(true, |bound| cp < bound))
                            .map(|band| {
                                StandardName::table(
                                    format!("{}, {}", rule.prefix, band.label),
                                    true,
                                    constants::NRC_2012,
                                )
                            })
                    } else {
                        None
                    }
                }
                SeparationAxis::ProcessingMethod { variants } => {
                    let found = variants
                        .iter()
                        .find(|variant| name_lower.contains(&variant.to_lowercase()));
                    Some(match found {
                        Some(variant) => StandardName::table(
                            format!("{}, {}", rule.prefix, variant),
                            true,
                            constants::CVB_INRA,
                        ),
                        None => StandardName::table(rule.prefix.clone(), false, constants::CVB_INRA),
                    })
                }
                SeparationAxis::PurityForm => AMINO_TOKEN.find(&name_lower).map(|token| {
                    let amino = title_case(token.as_str());
                    if name_lower.contains("hcl") || name_lower.contains("78") {
                        StandardName::table(format!("{} HCl", amino), true, constants::NRC_2012)
                    } else if name_lower.contains("98") || name_lower.contains("pure") {
                        StandardName::table(format!("{}, 98% pure", amino), true, constants::NRC_2012)
                    } else {
                        StandardName::table(amino, false, constants::NRC_2012)
                    }
                }),
            };

            if let Some(standard) = resolved {
                return standard;
            }
            // Unresolved protein grade: later, broader patterns get a chance
        }

        StandardName {
            name: normalize_spacing(raw_name),
            standards_based: false,
            reference: None,
        }
    }

    /// Standardizes every record in place and returns how many are standards based.
    pub fn apply(&self, records: &mut [IngredientRecord]) -> usize {
        let span = info_span!("standardize", records = records.len());
        let _enter = span.enter();

        let mut standards_based = 0;
        for record in records.iter_mut() {
            let standard = self.standardize(&record.name, record.crude_protein);
            debug!(name = %record.name, standardized = %standard.name, "Standardized name");
            if standard.standards_based {
                standards_based += 1;
            }
            record.standardized_name = standard.name;
            record.standard_reference = standard.reference;
            record.is_standards_based = standard.standards_based;
        }

        info!(standards_based, total = records.len(), "Applied industry standard names");
        metrics::normalize::names_standardized(standards_based);
        standards_based
    }
}

/// Collapses runs of whitespace and normalizes comma spacing to `", "`.
pub fn normalize_spacing(name: &str) -> String {
    let collapsed = WHITESPACE.replace_all(name.trim(), " ");
    COMMA.replace_all(&collapsed, ", ").into_owned()
}

/// Uppercases the first letter of every alphabetic run: `dl-methionine` → `Dl-Methionine`.
fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut at_word_start = true;
    for c in token.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
