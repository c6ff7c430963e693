// Pipeline ingestion: reading source files into raw entries

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::config::SourceFile;
use crate::domain::IngredientRecord;
use crate::error::{MergeError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::normalize::NormalizationRegistry;

/// The raw entries of one source file, still in the source's own schema
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub tag: String,
    pub path: PathBuf,
    pub entries: Vec<Map<String, Value>>,
}

/// Reads source files, failing fast on the first missing or malformed one
pub struct Loader;

impl Loader {
    pub fn load_all(sources: &[SourceFile]) -> Result<Vec<SourceBatch>> {
        let span = info_span!("load", sources = sources.len());
        let _enter = span.enter();

        sources.iter().map(Self::load_source).collect()
    }

    pub fn load_source(source: &SourceFile) -> Result<SourceBatch> {
        let entries = read_entries(&source.path)?;
        info!(
            source = %source.tag,
            path = %source.path.display(),
            entries = entries.len(),
            "Loaded source"
        );
        metrics::ingestion::records_loaded(&source.tag, entries.len());

        Ok(SourceBatch {
            tag: source.tag.clone(),
            path: source.path.clone(),
            entries,
        })
    }
}

/// Reads a JSON document of ingredient entries.
///
/// The document is either an array of objects or a single object, which is
/// read as a one-element list.
pub fn read_entries(path: &Path) -> Result<Vec<Map<String, Value>>> {
    if !path.exists() {
        return Err(MergeError::MissingInput(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
    let document: Value = serde_json::from_str(&content).map_err(|e| MergeError::json(path, e))?;

    match document {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(MergeError::SourceShape {
                    path: path.to_path_buf(),
                    message: format!("entry {} is {} rather than an object", index, kind(&other)),
                }),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        other => Err(MergeError::SourceShape {
            path: path.to_path_buf(),
            message: format!("top-level value is {} rather than an array", kind(&other)),
        }),
    }
}

/// Reads a file of ingredient records, such as a previous merge output.
///
/// Entries go through the registry under the file's name, so target-schema
/// entries are kept as they are and anything else is normalized.
pub fn read_records(path: &Path, registry: &NormalizationRegistry) -> Result<Vec<IngredientRecord>> {
    let tag = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let records = read_entries(path)?
        .iter()
        .map(|entry| registry.normalize(entry, &tag))
        .collect::<Vec<_>>();

    info!(path = %path.display(), records = records.len(), "Read ingredient records");
    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
