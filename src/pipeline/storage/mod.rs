//! Output persistence for ingredient lists and reports.

pub mod in_memory;

pub use in_memory::InMemoryStorage;

use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::IngredientRecord;
use crate::error::{MergeError, Result};

/// Storage trait for persisting pipeline outputs
pub trait Storage: Send + Sync {
    /// Writes the list as a pretty-printed JSON array.
    fn write_records(&self, path: &Path, records: &[IngredientRecord]) -> Result<()>;

    fn write_report(&self, path: &Path, text: &str) -> Result<()>;
}

/// Writes outputs to the filesystem, creating parent directories as needed
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStorage;

impl FileStorage {
    fn write(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| MergeError::io(path, e))
    }
}

impl Storage for FileStorage {
    fn write_records(&self, path: &Path, records: &[IngredientRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        Self::write(path, &json)?;
        info!(path = %path.display(), records = records.len(), "Wrote ingredient list");
        Ok(())
    }

    fn write_report(&self, path: &Path, text: &str) -> Result<()> {
        Self::write(path, text)?;
        info!(path = %path.display(), "Wrote report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_creates_parents_and_keeps_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let records = vec![IngredientRecord::named("Niébé (cowpea)", "new_regional.json")];

        FileStorage.write_records(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"name\": \"Niébé (cowpea)\""));
        assert!(text.starts_with("[\n  {\n    \"ingredient_id\": null"));
    }

    #[test]
    fn test_file_storage_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc/REPORT.md");

        FileStorage.write_report(&path, "# Report").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# Report");
    }
}
