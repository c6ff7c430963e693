//! Curated lookup tables: industry name patterns, name corrections,
//! separation rules, standard references, regional tags and reference
//! nutrient ranges.
//!
//! The tables are plain data. They are built once, either from the
//! built-in set or from a JSON rule file, and handed to the stages that
//! consume them.

mod builtin;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::RulesConfig;
use crate::domain::{IngredientRecord, Nutrient};
use crate::error::{MergeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    /// Ordered; the first matching pattern wins
    pub standard_patterns: Vec<StandardPatternRule>,
    pub name_corrections: Vec<NameCorrection>,
    pub separations: Vec<SeparationRules>,
    /// Ordered; the first key contained in a name wins
    pub standard_references: Vec<StandardReference>,
    /// Ordered; the first matching pattern wins
    pub regional_patterns: Vec<RegionalPattern>,
    pub reference_standards: Vec<ReferenceStandard>,
}

/// One row of the industry-standard naming table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardPatternRule {
    pub key: String,
    /// Regex matched against the lowercased raw name
    pub pattern: String,
    pub prefix: String,
    #[serde(flatten)]
    pub axis: SeparationAxis,
}

/// The dimension along which a matched ingredient is split into named variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "separate_by", rename_all = "snake_case")]
pub enum SeparationAxis {
    /// Bucket by crude protein into the first band whose bound it is below
    ProteinGrade { bands: Vec<GradeBand> },
    /// Pick the first variant keyword found in the name
    ProcessingMethod { variants: Vec<String> },
    /// Amino acid products told apart by purity
    PurityForm,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeBand {
    /// Exclusive upper bound; `None` is the catch-all band
    pub below: Option<f64>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameCorrection {
    pub id: i64,
    /// Name the record is expected to carry before correction
    pub from: String,
    pub to: String,
}

/// The variants a conflated record identifier is split into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeparationRules {
    pub id: i64,
    pub variants: Vec<VariantRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantRule {
    pub name: String,
    pub condition: Condition,
    pub note: String,
}

/// A predicate over one nutrient; absent values read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Always,
    Never,
    Below { nutrient: Nutrient, value: f64 },
    AtLeast { nutrient: Nutrient, value: f64 },
    Above { nutrient: Nutrient, value: f64 },
    /// `low < v < high`
    Between { nutrient: Nutrient, low: f64, high: f64 },
    /// `low < v <= high`
    AboveAtMost { nutrient: Nutrient, low: f64, high: f64 },
}

impl Condition {
    pub fn holds(&self, record: &IngredientRecord) -> bool {
        let read = |n: &Nutrient| record.nutrient(*n).unwrap_or(0.0);
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Below { nutrient, value } => read(nutrient) < *value,
            Condition::AtLeast { nutrient, value } => read(nutrient) >= *value,
            Condition::Above { nutrient, value } => read(nutrient) > *value,
            Condition::Between { nutrient, low, high } => {
                let v = read(nutrient);
                *low < v && v < *high
            }
            Condition::AboveAtMost { nutrient, low, high } => {
                let v = read(nutrient);
                *low < v && v <= *high
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardReference {
    /// Matched case-insensitively as a substring of the ingredient name
    pub key: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalPattern {
    pub pattern: String,
    pub region: String,
}

/// Published nutrient ranges for ingredients whose name contains `name_contains`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceStandard {
    pub name_contains: String,
    pub ranges: Vec<ReferenceRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub nutrient: Nutrient,
    pub min: f64,
    pub max: f64,
    pub source: String,
}

impl RuleSet {
    /// The curated tables shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            standard_patterns: builtin::standard_patterns(),
            name_corrections: builtin::name_corrections(),
            separations: builtin::separations(),
            standard_references: builtin::standard_references(),
            regional_patterns: builtin::regional_patterns(),
            reference_standards: builtin::reference_standards(),
        }
    }

    /// Reads a complete rule set from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        let rules: RuleSet =
            serde_json::from_str(&content).map_err(|e| MergeError::json(path, e))?;
        info!(path = %path.display(), "Loaded rule tables from file");
        Ok(rules)
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn correction_for(&self, id: i64) -> Option<&NameCorrection> {
        self.name_corrections.iter().find(|c| c.id == id)
    }

    pub fn separation_for(&self, id: i64) -> Option<&SeparationRules> {
        self.separations.iter().find(|s| s.id == id)
    }

    /// First standard reference whose key appears in `name`.
    pub fn reference_for(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.standard_references
            .iter()
            .find(|r| name_lower.contains(&r.key.to_lowercase()))
            .map(|r| r.reference.as_str())
    }
}
