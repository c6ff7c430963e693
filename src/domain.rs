//! Ingredient record shapes shared by every pipeline stage.
//!
//! The field order of [`IngredientRecord`] is the field order of the written
//! JSON, so reordering fields changes the output files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Fills every `None` slot of `$target` from `$source`, leaving existing values alone.
macro_rules! fill_missing {
    ($target:expr, $source:expr; $($field:ident),+ $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
}

pub(crate) use fill_missing;

/// A single feed ingredient with its nutrient composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientRecord {
    /// Sequential identifier, reassigned on every pipeline run
    #[serde(rename = "ingredient_id")]
    pub id: Option<i64>,
    /// Name as supplied by the source
    pub name: String,
    /// Canonical name used as the dedup key
    pub standardized_name: String,
    pub standard_reference: Option<String>,
    /// Whether the standardized name came from the industry pattern table
    pub is_standards_based: bool,
    pub category_id: Option<i64>,

    // Proximate analysis, percent as fed
    pub crude_protein: Option<f64>,
    pub crude_fiber: Option<f64>,
    pub crude_fat: Option<f64>,
    pub ash: Option<f64>,
    pub moisture: Option<f64>,
    pub starch: Option<f64>,

    // Minerals, percent
    pub calcium: Option<f64>,
    pub total_phosphorus: Option<f64>,
    pub available_phosphorus: Option<f64>,
    pub phytate_phosphorus: Option<f64>,

    // Legacy amino acid scalars
    pub lysine: Option<f64>,
    pub methionine: Option<f64>,

    // Legacy energy scalars, kcal/kg
    pub me_growing_pig: Option<f64>,
    pub me_finishing_pig: Option<f64>,
    pub me_adult_pig: Option<f64>,
    pub me_poultry: Option<f64>,
    pub me_ruminant: Option<f64>,
    pub me_rabbit: Option<f64>,
    pub de_salmonids: Option<f64>,

    pub bulk_density: Option<f64>,
    pub price_kg: Option<f64>,
    pub available_qty: Option<f64>,

    pub amino_acids_total: AminoAcidProfile,
    pub amino_acids_sid: AminoAcidProfile,
    pub energy: EnergyProfile,
    pub anti_nutritional_factors: AntiNutritionalFactors,
    pub max_inclusion_pct: MaxInclusionProfile,

    pub warning: Option<String>,
    pub regulatory_note: Option<String>,
    pub notes: Option<String>,

    pub favourite: i64,
    pub is_custom: i64,
    pub created_by: Option<String>,
    pub created_date: Option<String>,

    /// Tag of the source file this record was loaded from
    pub source: String,
    /// Every source that contributed to this record after merging
    pub sources: BTreeSet<String>,

    // Set by remediation
    pub original_id: Option<i64>,
    pub separation_notes: Option<String>,
    pub condition_met: Option<bool>,

    // Set by regional tagging
    pub region: Option<String>,
}

impl IngredientRecord {
    /// Creates an otherwise empty record with a name and a source tag.
    pub fn named(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            standardized_name: name.to_string(),
            source: source.to_string(),
            ..Self::default()
        }
    }

    /// Reads a nutrient value by key, including values nested in the profiles.
    pub fn nutrient(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::CrudeProtein => self.crude_protein,
            Nutrient::CrudeFiber => self.crude_fiber,
            Nutrient::CrudeFat => self.crude_fat,
            Nutrient::Ash => self.ash,
            Nutrient::Moisture => self.moisture,
            Nutrient::Starch => self.starch,
            Nutrient::Calcium => self.calcium,
            Nutrient::TotalPhosphorus => self.total_phosphorus,
            Nutrient::MeGrowingPig => self.me_growing_pig,
            Nutrient::MePoultry => self.me_poultry,
            Nutrient::MeRuminant => self.me_ruminant,
            Nutrient::LysineTotal => self.amino_acids_total.lysine,
            Nutrient::MethionineTotal => self.amino_acids_total.methionine,
            Nutrient::EnergyMePig => self.energy.me_pig,
            Nutrient::EnergyNePig => self.energy.ne_pig,
        }
    }

    /// All source tags this record carries, including its own.
    pub fn provenance(&self) -> BTreeSet<String> {
        let mut tags = self.sources.clone();
        if !self.source.is_empty() {
            tags.insert(self.source.clone());
        }
        tags
    }

    /// Raw name for validation messages, `"Unknown"` when blank.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// Name shown in reports: the standardized name when one exists.
    pub fn display_name(&self) -> &str {
        if self.standardized_name.is_empty() {
            &self.name
        } else {
            &self.standardized_name
        }
    }
}

/// Nutrient keys addressable by validation rules, gates and separation predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    CrudeProtein,
    CrudeFiber,
    CrudeFat,
    Ash,
    Moisture,
    Starch,
    Calcium,
    TotalPhosphorus,
    MeGrowingPig,
    MePoultry,
    MeRuminant,
    LysineTotal,
    MethionineTotal,
    EnergyMePig,
    EnergyNePig,
}

impl Nutrient {
    /// JSON key of the field this nutrient reads.
    pub fn key(&self) -> &'static str {
        match self {
            Nutrient::CrudeProtein => "crude_protein",
            Nutrient::CrudeFiber => "crude_fiber",
            Nutrient::CrudeFat => "crude_fat",
            Nutrient::Ash => "ash",
            Nutrient::Moisture => "moisture",
            Nutrient::Starch => "starch",
            Nutrient::Calcium => "calcium",
            Nutrient::TotalPhosphorus => "total_phosphorus",
            Nutrient::MeGrowingPig => "me_growing_pig",
            Nutrient::MePoultry => "me_poultry",
            Nutrient::MeRuminant => "me_ruminant",
            Nutrient::LysineTotal => "amino_acids_total.lysine",
            Nutrient::MethionineTotal => "amino_acids_total.methionine",
            Nutrient::EnergyMePig => "energy.mePig",
            Nutrient::EnergyNePig => "energy.nePig",
        }
    }

    /// Unit suffix used in report lines.
    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::MeGrowingPig
            | Nutrient::MePoultry
            | Nutrient::MeRuminant
            | Nutrient::EnergyMePig
            | Nutrient::EnergyNePig => " kcal/kg",
            Nutrient::LysineTotal | Nutrient::MethionineTotal => " g/kg",
            _ => "%",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Nutrient::CrudeProtein => "Crude protein",
            Nutrient::CrudeFiber => "Crude fiber",
            Nutrient::CrudeFat => "Crude fat",
            Nutrient::Ash => "Ash",
            Nutrient::Moisture => "Moisture",
            Nutrient::Starch => "Starch",
            Nutrient::Calcium => "Calcium",
            Nutrient::TotalPhosphorus => "Total phosphorus",
            Nutrient::MeGrowingPig => "ME growing pig",
            Nutrient::MePoultry => "ME poultry",
            Nutrient::MeRuminant => "ME ruminant",
            Nutrient::LysineTotal => "Lysine total",
            Nutrient::MethionineTotal => "Methionine total",
            Nutrient::EnergyMePig => "ME pig",
            Nutrient::EnergyNePig => "NE pig",
        };
        write!(f, "{}", label)
    }
}

/// Amino acid content, g/kg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AminoAcidProfile {
    pub lysine: Option<f64>,
    pub methionine: Option<f64>,
    pub cystine: Option<f64>,
    pub threonine: Option<f64>,
    pub tryptophan: Option<f64>,
    pub phenylalanine: Option<f64>,
    pub tyrosine: Option<f64>,
    pub leucine: Option<f64>,
    pub isoleucine: Option<f64>,
    pub valine: Option<f64>,
}

impl AminoAcidProfile {
    pub fn absorb(&mut self, other: &Self) {
        fill_missing!(self, other;
            lysine, methionine, cystine, threonine, tryptophan,
            phenylalanine, tyrosine, leucine, isoleucine, valine,
        );
    }
}

/// Species energy values, kcal/kg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnergyProfile {
    #[serde(alias = "me_pig")]
    pub me_pig: Option<f64>,
    #[serde(alias = "de_pig")]
    pub de_pig: Option<f64>,
    #[serde(alias = "ne_pig")]
    pub ne_pig: Option<f64>,
    #[serde(alias = "me_poultry")]
    pub me_poultry: Option<f64>,
    #[serde(alias = "me_ruminant")]
    pub me_ruminant: Option<f64>,
    #[serde(alias = "me_rabbit")]
    pub me_rabbit: Option<f64>,
    #[serde(alias = "de_salmonids")]
    pub de_salmonids: Option<f64>,
}

impl EnergyProfile {
    pub fn absorb(&mut self, other: &Self) {
        fill_missing!(self, other;
            me_pig, de_pig, ne_pig, me_poultry, me_ruminant, me_rabbit, de_salmonids,
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AntiNutritionalFactors {
    pub glucosinolates_micromol_g: Option<f64>,
    pub trypsin_inhibitor_tu_g: Option<f64>,
    pub tannins_ppm: Option<f64>,
    pub phytic_acid_ppm: Option<f64>,
}

impl AntiNutritionalFactors {
    pub fn absorb(&mut self, other: &Self) {
        fill_missing!(self, other;
            glucosinolates_micromol_g, trypsin_inhibitor_tu_g, tannins_ppm, phytic_acid_ppm,
        );
    }
}

/// Maximum inclusion rate per species and lifecycle stage, percent.
///
/// Every slot defaults to 0, which also means "no limit recorded".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxInclusionProfile {
    pub pig_starter: f64,
    pub pig_grower: f64,
    pub pig_finisher: f64,
    pub pig_gestating: f64,
    pub pig_lactating: f64,
    pub ruminant_beef: f64,
    pub ruminant_dairy: f64,
    pub ruminant_sheep: f64,
    pub ruminant_goat: f64,
    pub rabbit: f64,
    pub poultry_broiler_starter: f64,
    pub poultry_broiler_grower: f64,
    pub poultry_layer: f64,
    pub poultry_breeder: f64,
    pub fish_freshwater: f64,
    pub fish_marine: f64,
}

impl MaxInclusionProfile {
    /// Mutable access to every slot by its JSON key.
    pub fn slots_mut(&mut self) -> [(&'static str, &mut f64); 16] {
        [
            ("pig_starter", &mut self.pig_starter),
            ("pig_grower", &mut self.pig_grower),
            ("pig_finisher", &mut self.pig_finisher),
            ("pig_gestating", &mut self.pig_gestating),
            ("pig_lactating", &mut self.pig_lactating),
            ("ruminant_beef", &mut self.ruminant_beef),
            ("ruminant_dairy", &mut self.ruminant_dairy),
            ("ruminant_sheep", &mut self.ruminant_sheep),
            ("ruminant_goat", &mut self.ruminant_goat),
            ("rabbit", &mut self.rabbit),
            ("poultry_broiler_starter", &mut self.poultry_broiler_starter),
            ("poultry_broiler_grower", &mut self.poultry_broiler_grower),
            ("poultry_layer", &mut self.poultry_layer),
            ("poultry_breeder", &mut self.poultry_breeder),
            ("fish_freshwater", &mut self.fish_freshwater),
            ("fish_marine", &mut self.fish_marine),
        ]
    }

    /// Takes the other profile's limit wherever this one has none (zero).
    pub fn absorb(&mut self, other: &Self) {
        let mut other = other.clone();
        for ((_, mine), (_, theirs)) in self.slots_mut().into_iter().zip(other.slots_mut()) {
            if *mine == 0.0 && *theirs != 0.0 {
                *mine = *theirs;
            }
        }
    }
}
