use super::{
    Condition, GradeBand, NameCorrection, ReferenceRange, ReferenceStandard, RegionalPattern,
    SeparationAxis, SeparationRules, StandardPatternRule, StandardReference, VariantRule,
};
use crate::domain::Nutrient;

fn band(below: Option<f64>, label: &str) -> GradeBand {
    GradeBand {
        below,
        label: label.to_string(),
    }
}

fn processing(key: &str, pattern: &str, prefix: &str, variants: &[&str]) -> StandardPatternRule {
    StandardPatternRule {
        key: key.to_string(),
        pattern: pattern.to_string(),
        prefix: prefix.to_string(),
        axis: SeparationAxis::ProcessingMethod {
            variants: variants.iter().map(|v| v.to_string()).collect(),
        },
    }
}

/// NRC 2012 / CVB / INRA naming patterns. Later rows are broader fallbacks.
pub(super) fn standard_patterns() -> Vec<StandardPatternRule> {
    vec![
        StandardPatternRule {
            key: "fish_meal".to_string(),
            pattern: r"fish.*meal".to_string(),
            prefix: "Fish meal".to_string(),
            axis: SeparationAxis::ProteinGrade {
                bands: vec![
                    band(Some(63.0), "62% protein"),
                    band(Some(67.0), "65% protein"),
                    band(None, "70% protein"),
                ],
            },
        },
        processing(
            "corn",
            r"\bcorn\b",
            "Corn",
            &["grain", "meal", "flour", "gluten meal", "gluten feed"],
        ),
        processing(
            "wheat",
            r"\bwheat\b",
            "Wheat",
            &["grain", "bran", "middlings", "flour", "straw"],
        ),
        processing("soybean", r"soy", "Soybean", &["meal", "full-fat", "hulls", "oil"]),
        processing("palm_kernel", r"palm kernel", "Palm kernel", &["meal", "cake", "oil"]),
        processing("canola", r"(canola|rapeseed)", "Canola", &["meal", "seed", "oil"]),
        processing(
            "alfalfa",
            r"alfalfa",
            "Alfalfa",
            &["dehydrated", "hay", "meal", "fresh"],
        ),
        StandardPatternRule {
            key: "amino_acids".to_string(),
            pattern: r"(lysine|methionine|threonine|tryptophan)".to_string(),
            prefix: "varies".to_string(),
            axis: SeparationAxis::PurityForm,
        },
        processing(
            "blood_meal",
            r"blood.*meal",
            "Blood meal",
            &["spray dried", "ring dried", "flash dried"],
        ),
        StandardPatternRule {
            key: "meat_meal".to_string(),
            pattern: r"meat.*meal".to_string(),
            prefix: "Meat meal".to_string(),
            axis: SeparationAxis::ProteinGrade {
                bands: vec![
                    band(Some(52.0), "45-50% protein"),
                    band(Some(57.0), "50-55% protein"),
                    band(None, ">55% protein"),
                ],
            },
        },
    ]
}

pub(super) fn name_corrections() -> Vec<NameCorrection> {
    [
        (1, "Alfalfa meal, dehydrated, protein < 16%", "Alfalfa (Lucerne) meal, dehydrated"),
        (6, "Barley distillers grains, dried", "Barley"),
        (15, "Canola meal, solvent extracted, oil < 5%", "Rapeseed meal, solvent extracted"),
        (17, "Cassava root meal, dried", "Cassava (Manihot esculenta) root meal"),
        (36, "Fish meal, 62% protein", "Fish meal 62% CP"),
        (51, "Palm kernel meal, oil < 5%", "Palm kernel meal, solvent extracted (<10% oil)"),
        (60, "Rapeseed meal, oil < 5%", "Rapeseed meal, solvent extracted (low GSL)"),
        (73, "Soybean meal, 48% CP, solvent extracted", "Soybean meal 48% CP, solvent extracted"),
        (74, "Soybean meal, 48% CP, extruded", "Soybean meal 48% CP, solvent extracted"),
        (78, "Sunflower meal, dehulled", "Sunflower meal, solvent extracted"),
        (86, "Wheat, soft", "Wheat grain"),
        (87, "Wheat bran", "Wheat bran"),
        (88, "Wheat gluten", "Wheat gluten meal"),
        (89, "Wheat middlings", "Wheat middlings"),
        (100, "Corn Silage (Maize Silage)", "Corn silage"),
        (101, "Corn Flour (Maize Flour)", "Corn flour"),
        (102, "Coconut Meal (Copra meal)", "Coconut meal, solvent extracted"),
        (111, "Rapeseed meal, oil 5-20%", "Rapeseed meal, solvent extracted (standard)"),
        (120, "Wheat feed flour", "Wheat middlings"),
        (123, "Processed animal protein, pig (porcine meal)", "Meat meal, rendered"),
        (124, "Processed animal protein, poultry, 45-60% protein", "Meat & Bone meal, rendered"),
        (138, "Maize (Corn)", "Corn grain"),
        (152, "Corn DDGS (hi-pro)", "Corn DDGS (distillers dried grains with solubles)"),
        (160, "Alfalfa pellets (sun-cured)", "Alfalfa (Lucerne) meal, dehydrated"),
        (161, "Alfalfa pellets (dehydrated)", "Alfalfa (Lucerne) meal, dehydrated"),
        (169, "Sunflower cake (high fiber)", "Sunflower meal, solvent extracted"),
        (171, "Rapeseed meal (low-GSL)", "Rapeseed meal, solvent extracted (low GSL)"),
        (174, "Distillers wheat grains", "Wheat DDGS (distillers dried grains)"),
    ]
    .into_iter()
    .map(|(id, from, to)| NameCorrection {
        id,
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}

fn variant(name: &str, condition: Condition, note: &str) -> VariantRule {
    VariantRule {
        name: name.to_string(),
        condition,
        note: note.to_string(),
    }
}

/// Identifiers known to conflate distinct grades, with the variants they split into.
pub(super) fn separations() -> Vec<SeparationRules> {
    use Condition::*;
    use Nutrient::*;

    vec![
        SeparationRules {
            id: 36,
            variants: vec![
                variant(
                    "Fish meal 62% CP",
                    Below { nutrient: CrudeProtein, value: 65.0 },
                    "Standard 62% CP grade - lower energy, good value",
                ),
                variant(
                    "Fish meal 65% CP",
                    Between { nutrient: CrudeProtein, low: 64.0, high: 68.0 },
                    "Premium 65% CP grade - medium energy",
                ),
                variant(
                    "Fish meal 70% CP",
                    AtLeast { nutrient: CrudeProtein, value: 68.0 },
                    "Premium 70% CP grade - highest energy",
                ),
            ],
        },
        SeparationRules {
            id: 73,
            variants: vec![
                variant(
                    "Soybean meal 44% CP, solvent extracted",
                    Below { nutrient: CrudeProtein, value: 46.0 },
                    "44% CP grade - standard extraction",
                ),
                variant(
                    "Soybean meal 48% CP, solvent extracted",
                    AtLeast { nutrient: CrudeProtein, value: 46.0 },
                    "48% CP grade - premium extraction",
                ),
            ],
        },
        SeparationRules {
            id: 51,
            variants: vec![
                variant(
                    "Palm kernel meal <10% oil, solvent extracted",
                    Below { nutrient: CrudeFat, value: 10.0 },
                    "Solvent extracted - lowest oil, highest energy",
                ),
                variant(
                    "Palm kernel meal 10-20% oil, expeller",
                    AtLeast { nutrient: CrudeFat, value: 10.0 },
                    "Expeller pressed - higher oil content",
                ),
            ],
        },
        SeparationRules {
            id: 60,
            variants: vec![
                variant(
                    "Rapeseed meal <30 μmol/g GSL (double-low)",
                    Always,
                    "Low glucosinolate (double-low) variety - safe for all animals",
                ),
                variant(
                    "Rapeseed meal >30 μmol/g GSL (conventional)",
                    Never,
                    "Conventional variety - limit inclusion rates",
                ),
            ],
        },
        SeparationRules {
            id: 100,
            variants: vec![variant(
                "Corn silage, immature",
                Above { nutrient: CrudeFiber, value: 7.0 },
                "Fresh/ensiled corn - fermented",
            )],
        },
        SeparationRules {
            id: 101,
            variants: vec![variant(
                "Corn flour (maize flour)",
                Always,
                "Fine ground corn - improves digestibility",
            )],
        },
        SeparationRules {
            id: 138,
            variants: vec![variant(
                "Corn grain, dent",
                Below { nutrient: CrudeFiber, value: 3.0 },
                "Whole grain corn - standard form",
            )],
        },
        SeparationRules {
            id: 87,
            variants: vec![variant(
                "Wheat bran",
                Above { nutrient: CrudeFiber, value: 12.0 },
                "High fiber milling byproduct - ~15% fiber",
            )],
        },
        SeparationRules {
            id: 89,
            variants: vec![variant(
                "Wheat middlings",
                AboveAtMost { nutrient: CrudeFiber, low: 5.0, high: 10.0 },
                "Medium fiber milling byproduct - ~8% fiber",
            )],
        },
        SeparationRules {
            id: 86,
            variants: vec![variant(
                "Wheat grain, soft",
                Below { nutrient: CrudeFiber, value: 4.0 },
                "Whole grain wheat - standard form",
            )],
        },
        SeparationRules {
            id: 123,
            variants: vec![variant(
                "Meat meal, rendered (no bone)",
                Below { nutrient: Ash, value: 15.0 },
                "Pure meat - high protein, low ash",
            )],
        },
        SeparationRules {
            id: 124,
            variants: vec![variant(
                "Meat & Bone meal, rendered",
                AtLeast { nutrient: Ash, value: 15.0 },
                "Mixed meat & bone - moderate protein, high ash/minerals",
            )],
        },
    ]
}

pub(super) fn standard_references() -> Vec<StandardReference> {
    [
        ("Fish meal", "NRC 2012: 5-01-968 | CVB: AM003 | INRA: am_001 | Protein grade critical"),
        ("Soybean meal, solvent extracted", "NRC 2012: 5-04-612 | CVB: SB010 | INRA: sb_001 | Track CP level"),
        ("Wheat grain", "NRC 2012: 4-05-211 | CVB: CR001 | INRA: ce_001 | Whole grain form"),
        ("Wheat bran", "NRC 2012: 4-05-219 | CVB: CR006 | INRA: ce_004 | High fiber ~15%"),
        ("Wheat middlings", "NRC 2012: 4-05-205 | CVB: CR008 | INRA: ce_003 | Medium fiber ~8%"),
        ("Corn grain", "NRC 2012: 4-02-935 | CVB: CR020 | INRA: ce_010 | Dent variety"),
        ("Corn meal", "NRC 2012: 4-02-954 | CVB: CR021 | INRA: ce_011 | Ground grain"),
        ("Rapeseed meal, solvent extracted", "NRC 2012: 5-03-870 | CVB: SB035 | INRA: sb_005 | GSL content critical"),
        ("Palm kernel meal", "NRC 2012: 5-03-646 | CVB: SB037 | INRA: sb_006 | Oil grade affects energy"),
        ("Meat meal, rendered", "NRC 2012: 5-02-001 | CVB: AM005 | INRA: am_001 | No bone meal"),
        ("Meat & Bone meal, rendered", "NRC 2012: 5-02-009 | CVB: AM006 | INRA: am_002 | Includes bone"),
    ]
    .into_iter()
    .map(|(key, reference)| StandardReference {
        key: key.to_string(),
        reference: reference.to_string(),
    })
    .collect()
}

pub(super) fn regional_patterns() -> Vec<RegionalPattern> {
    [
        (
            r"(azolla|lemna|wolffia|cassava|moringa|cowpea|pigeon pea|bambara|locust bean|shea|plantain|banana)",
            "Africa, Asia",
        ),
        (
            r"(yam peel|teff|sesbania|gliricidia|elephant grass|napier|guinea grass|brachiaria)",
            "Africa",
        ),
        (r"(rice bran|rice polish|taro|mung bean|water spinach|hyacinth)", "Asia"),
        (
            r"(barley|rapeseed|wheat|oats|rye|lupin|linseed|alfalfa|timothy|clover)",
            "Europe, Americas",
        ),
        (r"(corn|soybean|ddgs|sorghum|field pea)", "Americas, Global"),
        (
            r"(fishmeal|fish oil|meat and bone|feather meal|blood meal|premix|mineral|vitamin|limestone|phosphate|salt)",
            "Global",
        ),
        (r"(seaweed|kelp|copra|coconut|palm kernel)", "Oceania, Global"),
    ]
    .into_iter()
    .map(|(pattern, region)| RegionalPattern {
        pattern: pattern.to_string(),
        region: region.to_string(),
    })
    .collect()
}

fn range(nutrient: Nutrient, min: f64, max: f64, source: &str) -> ReferenceRange {
    ReferenceRange {
        nutrient,
        min,
        max,
        source: source.to_string(),
    }
}

/// Published composition ranges (NRC 2012, CVB 2021, INRA-AFZ 2018, AMINODat 5.0).
pub(super) fn reference_standards() -> Vec<ReferenceStandard> {
    use Nutrient::*;

    let cereal_corn = vec![
        range(CrudeProtein, 7.0, 10.0, "NRC 2012"),
        range(CrudeFiber, 1.8, 2.8, "NRC 2012"),
        range(CrudeFat, 3.0, 4.5, "NRC 2012"),
        range(LysineTotal, 2.2, 2.8, "AMINODat 5.0"),
        range(EnergyMePig, 3200.0, 3400.0, "NRC 2012"),
        range(EnergyNePig, 2350.0, 2550.0, "NRC 2012"),
    ];

    vec![
        ReferenceStandard {
            name_contains: "Maize".to_string(),
            ranges: cereal_corn.clone(),
        },
        ReferenceStandard {
            name_contains: "Corn".to_string(),
            ranges: cereal_corn,
        },
        ReferenceStandard {
            name_contains: "Soybean meal, 48%".to_string(),
            ranges: vec![
                range(CrudeProtein, 46.0, 49.0, "NRC 2012"),
                range(CrudeFiber, 3.0, 4.5, "NRC 2012"),
                range(LysineTotal, 29.0, 32.0, "AMINODat 5.0"),
                range(MethionineTotal, 6.5, 7.2, "AMINODat 5.0"),
                range(EnergyMePig, 3300.0, 3550.0, "NRC 2012"),
                range(EnergyNePig, 2050.0, 2250.0, "NRC 2012"),
            ],
        },
        ReferenceStandard {
            name_contains: "Wheat".to_string(),
            ranges: vec![
                range(CrudeProtein, 10.0, 13.5, "NRC 2012"),
                range(CrudeFiber, 2.0, 3.0, "CVB 2021"),
                range(LysineTotal, 3.0, 4.0, "AMINODat 5.0"),
                range(EnergyMePig, 3250.0, 3450.0, "NRC 2012"),
                range(EnergyNePig, 2300.0, 2500.0, "NRC 2012"),
            ],
        },
        ReferenceStandard {
            name_contains: "Barley".to_string(),
            ranges: vec![
                range(CrudeProtein, 10.0, 13.0, "NRC 2012"),
                range(CrudeFiber, 4.5, 6.0, "CVB 2021"),
                range(LysineTotal, 3.5, 4.5, "AMINODat 5.0"),
                range(EnergyMePig, 2900.0, 3200.0, "NRC 2012"),
                range(EnergyNePig, 1950.0, 2150.0, "NRC 2012"),
            ],
        },
        ReferenceStandard {
            name_contains: "Fish meal, 65%".to_string(),
            ranges: vec![
                range(CrudeProtein, 63.0, 68.0, "NRC 2012"),
                range(LysineTotal, 48.0, 52.0, "AMINODat 5.0"),
                range(MethionineTotal, 17.5, 19.5, "AMINODat 5.0"),
                range(EnergyMePig, 3400.0, 3800.0, "NRC 2012"),
            ],
        },
        ReferenceStandard {
            name_contains: "Canola meal".to_string(),
            ranges: vec![
                range(CrudeProtein, 36.0, 40.0, "NRC 2012"),
                range(CrudeFiber, 10.0, 13.0, "CVB 2021"),
                range(LysineTotal, 19.0, 22.0, "AMINODat 5.0"),
                range(EnergyMePig, 2700.0, 3000.0, "NRC 2012"),
            ],
        },
        ReferenceStandard {
            name_contains: "Rice bran".to_string(),
            ranges: vec![
                range(CrudeProtein, 13.0, 17.0, "INRA-AFZ 2018"),
                range(CrudeFiber, 9.0, 13.0, "CVB 2021"),
                range(EnergyMePig, 2200.0, 2600.0, "NRC 2012"),
            ],
        },
    ]
}
