use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::{
    AminoAcidProfile, AntiNutritionalFactors, EnergyProfile, IngredientRecord, MaxInclusionProfile,
};

/// Trait for source-specific normalization strategies.
///
/// Normalization is best effort: a field that is absent, unparseable or of the
/// wrong type becomes `None`, never an error.
pub trait SourceNormalizer: Send + Sync {
    /// Map one raw source entry onto the target schema
    fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord;

    /// Name of the strategy, for logging
    fn strategy(&self) -> &'static str;
}

/// Identifier aliases, first non-null wins
const ID_KEYS: &[&str] = &["ingredient_id", "id"];

/// Energy slots and the snake_case spelling some sources use for them
const ENERGY_ALIASES: &[(&str, &str)] = &[
    ("mePig", "me_pig"),
    ("dePig", "de_pig"),
    ("nePig", "ne_pig"),
    ("mePoultry", "me_poultry"),
    ("meRuminant", "me_ruminant"),
    ("meRabbit", "me_rabbit"),
    ("deSalmonids", "de_salmonids"),
];

/// Shared coercion helpers for all source normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    /// Lenient float coercion: numbers pass, numeric strings parse, anything else is `None`.
    pub fn to_float(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn to_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First key whose value coerces to a float wins.
    pub fn first_float(raw: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| raw.get(*k).and_then(Self::to_float))
    }

    pub fn first_int(raw: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
        keys.iter().find_map(|k| raw.get(*k).and_then(Self::to_int))
    }

    pub fn float(raw: &Map<String, Value>, key: &str) -> Option<f64> {
        Self::first_float(raw, &[key])
    }

    pub fn text(raw: &Map<String, Value>, key: &str) -> Option<String> {
        raw.get(key).and_then(Self::to_text)
    }

    /// Nested sub-record as an object; JSON text is decoded, undecodable text is dropped.
    pub fn nested_object(value: Option<&Value>) -> Option<Map<String, Value>> {
        match value? {
            Value::Object(map) => Some(map.clone()),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    /// Decodes a profile keeping only the slots that coerce to numbers.
    pub fn profile<T: DeserializeOwned + Default>(object: Option<Map<String, Value>>) -> T {
        let Some(object) = object else {
            return T::default();
        };
        let numeric: Map<String, Value> = object
            .into_iter()
            .filter_map(|(k, v)| {
                let number = Self::to_float(&v).and_then(serde_json::Number::from_f64)?;
                Some((k, Value::Number(number)))
            })
            .collect();
        serde_json::from_value(Value::Object(numeric)).unwrap_or_default()
    }

    /// Energy profile with camelCase keys taking precedence over snake_case ones.
    pub fn energy(object: Option<Map<String, Value>>) -> EnergyProfile {
        let canonical = object.map(|mut map| {
            for (camel, snake) in ENERGY_ALIASES {
                let snake_value = map.remove(*snake);
                let camel_missing = map.get(*camel).and_then(Self::to_float).is_none();
                if camel_missing {
                    if let Some(v) = snake_value {
                        map.insert(camel.to_string(), v);
                    }
                }
            }
            map
        });
        Self::profile(canonical)
    }

    /// Builds the full target record; source normalizers adjust the result.
    pub fn build_record(raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        let amino_total_raw = Self::nested_object(raw.get("amino_acids_total"));
        let amino_acids_total: AminoAcidProfile = Self::profile(amino_total_raw);
        let amino_acids_sid: AminoAcidProfile =
            Self::profile(Self::nested_object(raw.get("amino_acids_sid")));
        let energy = Self::energy(Self::nested_object(raw.get("energy")));
        let anti_nutritional_factors: AntiNutritionalFactors =
            Self::profile(Self::nested_object(raw.get("anti_nutritional_factors")));
        let max_inclusion_pct: MaxInclusionProfile =
            Self::profile(Self::nested_object(raw.get("max_inclusion_pct")));

        let name = Self::text(raw, "name").unwrap_or_default();

        IngredientRecord {
            id: Self::first_int(raw, ID_KEYS),
            standardized_name: name.clone(),
            name,
            standard_reference: None,
            is_standards_based: false,
            category_id: Self::first_int(raw, &["category_id"]),

            crude_protein: Self::float(raw, "crude_protein"),
            crude_fiber: Self::float(raw, "crude_fiber"),
            crude_fat: Self::float(raw, "crude_fat"),
            ash: Self::float(raw, "ash"),
            moisture: Self::float(raw, "moisture"),
            starch: Self::float(raw, "starch"),

            calcium: Self::float(raw, "calcium"),
            total_phosphorus: Self::first_float(raw, &["total_phosphorus", "phosphorus"]),
            available_phosphorus: Self::float(raw, "available_phosphorus"),
            phytate_phosphorus: Self::float(raw, "phytate_phosphorus"),

            lysine: Self::float(raw, "lysine").or(amino_acids_total.lysine),
            methionine: Self::float(raw, "methionine").or(amino_acids_total.methionine),

            me_growing_pig: Self::float(raw, "me_growing_pig").or(energy.me_pig),
            me_finishing_pig: Self::float(raw, "me_finishing_pig"),
            me_adult_pig: Self::float(raw, "me_adult_pig").or(energy.me_pig),
            me_poultry: Self::float(raw, "me_poultry").or(energy.me_poultry),
            me_ruminant: Self::float(raw, "me_ruminant").or(energy.me_ruminant),
            me_rabbit: Self::float(raw, "me_rabbit").or(energy.me_rabbit),
            de_salmonids: Self::float(raw, "de_salmonids").or(energy.de_salmonids),

            bulk_density: Self::float(raw, "bulk_density"),
            price_kg: Self::float(raw, "price_kg"),
            available_qty: Self::float(raw, "available_qty"),

            amino_acids_total,
            amino_acids_sid,
            energy,
            anti_nutritional_factors,
            max_inclusion_pct,

            warning: Self::text(raw, "warning"),
            regulatory_note: Self::text(raw, "regulatory_note"),
            notes: Self::text(raw, "notes"),

            favourite: Self::first_int(raw, &["favourite"]).unwrap_or(0),
            is_custom: Self::first_int(raw, &["is_custom"]).unwrap_or(0),
            created_by: Self::text(raw, "created_by"),
            created_date: Self::text(raw, "created_date"),

            source: source.to_string(),
            ..IngredientRecord::default()
        }
    }
}

/// Fallback normalizer for sources without a dedicated strategy
pub struct BaseNormalizer;

impl BaseNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BaseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for BaseNormalizer {
    fn normalize(&self, raw: &Map<String, Value>, source: &str) -> IngredientRecord {
        NormalizerUtils::build_record(raw, source)
    }

    fn strategy(&self) -> &'static str {
        "base"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_to_float_is_lenient() {
        assert_eq!(NormalizerUtils::to_float(&json!(8.5)), Some(8.5));
        assert_eq!(NormalizerUtils::to_float(&json!(" 12.0 ")), Some(12.0));
        assert_eq!(NormalizerUtils::to_float(&json!("n/a")), None);
        assert_eq!(NormalizerUtils::to_float(&json!(true)), None);
        assert_eq!(NormalizerUtils::to_float(&json!({"x": 1})), None);
        assert_eq!(NormalizerUtils::to_float(&Value::Null), None);
    }

    #[test]
    fn test_phosphorus_alias_prefers_total() {
        let raw = object(json!({"name": "Wheat", "total_phosphorus": 0.35, "phosphorus": 0.4}));
        let record = BaseNormalizer::new().normalize(&raw, "x");
        assert_eq!(record.total_phosphorus, Some(0.35));

        let raw = object(json!({"name": "Wheat", "total_phosphorus": null, "phosphorus": "0.4"}));
        let record = BaseNormalizer::new().normalize(&raw, "x");
        assert_eq!(record.total_phosphorus, Some(0.4));
    }

    #[test]
    fn test_nested_text_is_decoded_and_garbage_dropped() {
        let raw = object(json!({
            "name": "Barley",
            "energy": "{\"me_pig\": 3050, \"mePoultry\": \"2700\"}",
            "amino_acids_total": "{not json",
            "max_inclusion_pct": {"pig_grower": 40, "rabbit": "bad"}
        }));

        let record = BaseNormalizer::new().normalize(&raw, "x");

        assert_eq!(record.energy.me_pig, Some(3050.0));
        assert_eq!(record.energy.me_poultry, Some(2700.0));
        assert_eq!(record.me_growing_pig, Some(3050.0));
        assert_eq!(record.me_adult_pig, Some(3050.0));
        assert_eq!(record.amino_acids_total, AminoAcidProfile::default());
        assert_eq!(record.max_inclusion_pct.pig_grower, 40.0);
        assert_eq!(record.max_inclusion_pct.rabbit, 0.0);
    }

    #[test]
    fn test_camel_energy_key_wins_over_snake() {
        let energy = NormalizerUtils::energy(Some(object(json!({"mePig": 3300, "me_pig": 3100}))));
        assert_eq!(energy.me_pig, Some(3300.0));
    }

    #[test]
    fn test_legacy_amino_acids_fall_back_to_profile() {
        let raw = object(json!({
            "name": "Soybean meal",
            "methionine": 6.6,
            "amino_acids_total": {"lysine": 29.5, "methionine": 6.8}
        }));

        let record = BaseNormalizer::new().normalize(&raw, "x");

        assert_eq!(record.lysine, Some(29.5));
        assert_eq!(record.methionine, Some(6.6));
    }

    #[test]
    fn test_every_key_is_present_after_normalization() {
        let record = BaseNormalizer::new().normalize(&object(json!({"name": 42})), "x");
        let value = serde_json::to_value(&record).unwrap();
        let keys = value.as_object().unwrap();

        let expected = serde_json::to_value(IngredientRecord::default()).unwrap();
        for key in expected.as_object().unwrap().keys() {
            assert!(keys.contains_key(key), "missing key {}", key);
        }
        assert_eq!(record.name, "42");
    }
}
