/// Source tags for the three ingredient tables, in their usual load order
pub const DATABASE_EXPORT_SOURCE: &str = "ingredient";
pub const INITIAL_CATALOG_SOURCE: &str = "initial_ingredients_.json";
pub const REGIONAL_SOURCE: &str = "new_regional.json";

/// Fuzzy-name match cutoff (normalized edit-distance similarity)
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Words dropped from names before fuzzy comparison
pub const QUALIFIER_WORDS: &[&str] = &[
    "meal",
    "flour",
    "powder",
    "oil",
    "seed",
    "cake",
    "bran",
    "hull",
    "straw",
    "hay",
    "dried",
    "fresh",
    "dehydrated",
    "raw",
    "cooked",
    "fermented",
    "solvent-extracted",
    "expeller-pressed",
    "cold-pressed",
    "ground",
    "milled",
    "cracked",
    "flaked",
    "roasted",
    "toasted",
    "pelleted",
    "grain",
    "whole",
];

// Nutrient gate for the standardized-name policy
pub const GATE_CRUDE_PROTEIN: f64 = 5.0;
pub const GATE_CRUDE_FIBER: f64 = 5.0;
pub const GATE_CRUDE_FAT: f64 = 3.0;
pub const GATE_ME_GROWING_PIG: f64 = 200.0;

/// Plausibility bounds used by the range validator
pub const PROTEIN_RANGE: (f64, f64) = (0.0, 50.0);
pub const FIBER_RANGE: (f64, f64) = (0.0, 40.0);
pub const FAT_RANGE: (f64, f64) = (0.0, 30.0);
pub const ENERGY_RANGE: (f64, f64) = (500.0, 10000.0);

/// Proximate fractions may not add up past this (dry-matter tolerance)
pub const PROXIMATE_SUM_LIMIT: f64 = 105.0;
pub const PERCENT_LIMIT: f64 = 100.0;

/// Reference-standard ranges are widened by this share of their width
pub const STANDARD_TOLERANCE: f64 = 0.15;

/// Region assigned when no regional pattern matches
pub const DEFAULT_REGION: &str = "Global";

// Report listing caps
pub const REPORT_LIST_LIMIT: usize = 20;
pub const REPORT_GROUP_LIMIT: usize = 10;

// Standard reference tags attached by the name matcher
pub const NRC_2012: &str = "NRC 2012";
pub const CVB_INRA: &str = "CVB/INRA";
