//! Test data files (JSON and YAML) with a per-loader cache.

use crate::result::{ProbeError, ProbeResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Key holding the record array when none is given
pub const DEFAULT_RECORDS_KEY: &str = "test_data";

/// Reads data files relative to a directory
#[derive(Debug)]
pub struct DataLoader {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Value>>,
}

impl DataLoader {
    /// Loader rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Data directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a file, choosing the parser by extension
    pub fn load(&self, file: &str) -> ProbeResult<Value> {
        if let Some(cached) = self.cached(file) {
            return Ok(cached);
        }
        let path = self.dir.join(file);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ProbeError::data(format!("cannot read {}: {e}", path.display())))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let value = match extension.as_deref() {
            Some("json") => serde_json::from_str(&text)?,
            Some("yaml" | "yml") => serde_yaml_ng::from_str(&text)?,
            _ => return Err(ProbeError::data(format!("unsupported data file type: {file}"))),
        };
        debug!(file, "Loaded test data");
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.to_string(), Value::clone(&value));
        Ok(value)
    }

    /// Deserialize a whole file
    pub fn load_as<T: DeserializeOwned>(&self, file: &str) -> ProbeResult<T> {
        Ok(serde_json::from_value(self.load(file)?)?)
    }

    /// Deserialize the array under `key` (default [`DEFAULT_RECORDS_KEY`])
    pub fn load_records<T: DeserializeOwned>(
        &self,
        file: &str,
        key: Option<&str>,
    ) -> ProbeResult<Vec<T>> {
        let key = key.unwrap_or(DEFAULT_RECORDS_KEY);
        let mut root = self.load(file)?;
        let records = root
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ProbeError::data(format!("{file}: no '{key}' key")))?;
        if !records.is_array() {
            return Err(ProbeError::data(format!("{file}: '{key}' is not a list")));
        }
        Ok(serde_json::from_value(records)?)
    }

    /// Forget cached files
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of cached files
    #[must_use]
    pub fn cached_files(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cached(&self, file: &str) -> Option<Value> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file)
            .cloned()
    }
}
