use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::Storage;
use crate::domain::IngredientRecord;
use crate::error::{MergeError, Result};

/// In-memory storage implementation for development/testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    records: Arc<Mutex<HashMap<PathBuf, Vec<IngredientRecord>>>>,
    reports: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, path: &Path) -> Option<Vec<IngredientRecord>> {
        self.records.lock().ok()?.get(path).cloned()
    }

    pub fn report(&self, path: &Path) -> Option<String> {
        self.reports.lock().ok()?.get(path).cloned()
    }

    /// Number of outputs written so far, lists and reports together.
    pub fn writes(&self) -> usize {
        let records = self.records.lock().map(|m| m.len()).unwrap_or(0);
        let reports = self.reports.lock().map(|m| m.len()).unwrap_or(0);
        records + reports
    }
}

fn poisoned(path: &Path) -> MergeError {
    MergeError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::Other, "in-memory store lock poisoned"),
    )
}

impl Storage for InMemoryStorage {
    fn write_records(&self, path: &Path, records: &[IngredientRecord]) -> Result<()> {
        let mut store = self.records.lock().map_err(|_| poisoned(path))?;
        store.insert(path.to_path_buf(), records.to_vec());
        debug!(path = %path.display(), records = records.len(), "Stored ingredient list");
        Ok(())
    }

    fn write_report(&self, path: &Path, text: &str) -> Result<()> {
        let mut store = self.reports.lock().map_err(|_| poisoned(path))?;
        store.insert(path.to_path_buf(), text.to_string());
        debug!(path = %path.display(), "Stored report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_storage_keeps_latest_write() {
        let storage = InMemoryStorage::new();
        let path = Path::new("out.json");

        storage
            .write_records(path, &[IngredientRecord::named("Corn", "a")])
            .unwrap();
        storage.write_records(path, &[]).unwrap();
        storage.write_report(Path::new("r.md"), "done").unwrap();

        assert_eq!(storage.records(path).unwrap().len(), 0);
        assert_eq!(storage.report(Path::new("r.md")).as_deref(), Some("done"));
        assert_eq!(storage.writes(), 2);
    }
}
