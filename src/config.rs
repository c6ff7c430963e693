use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{MergeError, Result};

/// Run configuration, read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub merge: MergeConfig,
    pub remediate: RemediateConfig,
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// A source file and the tag its records carry through the pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceFile {
    pub tag: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Sources in load order; earlier sources win scalar conflicts
    pub sources: Vec<SourceFile>,
    pub output: PathBuf,
    pub report: PathBuf,
    pub policy: MatchPolicyKind,
    pub similarity_threshold: f64,
}

/// Which duplicate-matching policy the deduplicator runs.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicyKind {
    /// Normalized-edit-distance on qualifier-stripped names
    #[default]
    FuzzyName,
    /// Exact standardized name, vetoed by large nutrient differences
    StandardName,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemediateConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: PathBuf,
    pub separation_mode: SeparationMode,
}

/// How separation rules treat their condition predicates.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeparationMode {
    /// Every listed variant is emitted; predicate outcomes are only recorded
    #[default]
    EmitAll,
    /// Only variants whose predicate holds are emitted
    Conditional,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// JSON rule file replacing the built-in lookup tables
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Where to write a Prometheus text snapshot at the end of a run
    pub snapshot: Option<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            output: PathBuf::from("assets/raw/ingredients_merged.json"),
            report: PathBuf::from("doc/INGREDIENT_MERGE_REPORT.md"),
            policy: MatchPolicyKind::default(),
            similarity_threshold: constants::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Default for RemediateConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("assets/raw/ingredients_merged.json"),
            output: PathBuf::from("assets/raw/ingredients_standardized.json"),
            report: PathBuf::from("doc/REMEDIATION_REPORT.md"),
            separation_mode: SeparationMode::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Loads the configuration file, failing if it is missing or malformed.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            MergeError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.merge.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MergeError::Config(format!(
                "similarity_threshold must be within 0..=1, got {}",
                threshold
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for source in &self.merge.sources {
            if !seen.insert(source.tag.as_str()) {
                return Err(MergeError::Config(format!(
                    "source tag '{}' is listed more than once",
                    source.tag
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_parses_sources_in_order() {
        let raw = r#"
            [merge]
            policy = "standard_name"
            sources = [
                { tag = "ingredient", path = "raw/ingredient" },
                { tag = "new_regional.json", path = "raw/new_regional.json" },
            ]

            [remediate]
            separation_mode = "conditional"
        "#;

        let config: Config = toml::from_str(raw).unwrap();

        assert_eq!(config.merge.policy, MatchPolicyKind::StandardName);
        assert_eq!(config.merge.sources.len(), 2);
        assert_eq!(config.merge.sources[0].tag, "ingredient");
        assert_eq!(config.merge.similarity_threshold, 0.85);
        assert_eq!(config.remediate.separation_mode, SeparationMode::Conditional);
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_config_rejects_duplicate_tags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[merge]
sources = [{{ tag = "a", path = "x.json" }}, {{ tag = "a", path = "y.json" }}]"#
        )
        .unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(MergeError::Config(_))));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let result = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(result.is_err());
    }
}
