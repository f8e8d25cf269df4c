use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::PreferenceError;

pub const SPEECH_KEY: &str = "speech";
pub const LAST_SELECTED_CHAT_KEY: &str = "last_selected_chat";

fn cleanup_temp_file(temp_file: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp_file) {
        tracing::warn!(
            event = "core.preferences.temp_file_cleanup_failed",
            temp_file = %temp_file.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err
        );
    }
}

/// Persistent key-value preferences, stored as a JSON object on disk.
///
/// Every read goes to the file so that a change made by another `tether`
/// process (e.g. `tether speech on` while `tether watch` runs) is picked up.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all preferences.
    ///
    /// Returns an empty map if the file doesn't exist or is corrupted (with
    /// error logged).
    pub fn load(&self) -> BTreeMap<String, Value> {
        match self.read() {
            Ok(values) => values,
            Err(e) => {
                tracing::error!(
                    event = "core.preferences.load_failed",
                    path = %self.path.display(),
                    error = %e,
                    "Could not read preferences - using defaults"
                );
                BTreeMap::new()
            }
        }
    }

    /// Read the file, treating only a missing file as empty.
    fn read(&self) -> Result<BTreeMap<String, Value>, PreferenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PreferenceError::ReadFailed {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| PreferenceError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.load().remove(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Update one key, keeping the others.
    ///
    /// Refuses to write over a file it cannot parse, since that would drop
    /// every other key.
    pub fn set(&self, key: &str, value: Value) -> Result<(), PreferenceError> {
        let mut values = self.read()?;
        values.insert(key.to_string(), value);
        self.save(&values)
    }

    /// Write through a temp file and rename, so readers never see a partial file.
    fn save(&self, values: &BTreeMap<String, Value>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PreferenceError::SaveFailed {
                message: format!("Failed to create directory ({}): {}", parent.display(), e),
            })?;
        }

        let json = serde_json::to_string_pretty(values).map_err(|e| PreferenceError::SaveFailed {
            message: format!("Failed to serialize preferences: {}", e),
        })?;

        let temp_file = self.path.with_extension("json.tmp");

        if let Err(e) = fs::write(&temp_file, json) {
            cleanup_temp_file(&temp_file, &e);
            return Err(PreferenceError::SaveFailed {
                message: format!("Failed to write temp file ({}): {}", temp_file.display(), e),
            });
        }

        if let Err(e) = fs::rename(&temp_file, &self.path) {
            cleanup_temp_file(&temp_file, &e);
            return Err(PreferenceError::SaveFailed {
                message: format!(
                    "Failed to replace preferences file ({}): {}",
                    self.path.display(),
                    e
                ),
            });
        }

        tracing::info!(
            event = "core.preferences.saved",
            path = %self.path.display(),
            count = values.len()
        );

        Ok(())
    }

    pub fn speech_enabled(&self) -> bool {
        self.get_bool(SPEECH_KEY).unwrap_or(false)
    }

    pub fn set_speech_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.set(SPEECH_KEY, Value::Bool(enabled))
    }

    pub fn last_selected_chat(&self) -> Option<String> {
        self.get_string(LAST_SELECTED_CHAT_KEY)
    }

    pub fn set_last_selected_chat(&self, context: &str) -> Result<(), PreferenceError> {
        self.set(LAST_SELECTED_CHAT_KEY, Value::String(context.to_string()))
    }
}
