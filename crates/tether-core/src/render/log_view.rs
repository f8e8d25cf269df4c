use std::collections::HashMap;

use super::errors::RenderError;
use super::traits::LogSink;
use crate::protocol::{EntryKey, LogEntry, Progress};

/// Result of putting one entry into a [`LogView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// In-memory rendering of a conversation log.
///
/// Keeps first-seen order; an entry whose key was seen before replaces the
/// old one in place. Entries without any key cannot be matched and are
/// always appended.
#[derive(Debug, Default)]
pub struct LogView {
    entries: Vec<LogEntry>,
    index: HashMap<EntryKey, usize>,
    progress: Progress,
    connected: bool,
    clear_count: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, entry: &LogEntry) -> UpsertOutcome {
        let Some(key) = entry.key() else {
            self.entries.push(entry.clone());
            return UpsertOutcome::Inserted;
        };

        match self.index.get(&key) {
            Some(&pos) if self.entries[pos] == *entry => UpsertOutcome::Unchanged,
            Some(&pos) => {
                self.entries[pos] = entry.clone();
                UpsertOutcome::Updated
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry.clone());
                UpsertOutcome::Inserted
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.clear_count += 1;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn get(&self, key: &EntryKey) -> Option<&LogEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// How many times the view was cleared.
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }
}

impl LogSink for LogView {
    fn apply_entries(&mut self, entries: &[LogEntry]) -> Result<(), RenderError> {
        for entry in entries {
            self.upsert(entry);
        }
        Ok(())
    }

    fn clear_log(&mut self) -> Result<(), RenderError> {
        self.clear();
        Ok(())
    }

    fn set_connectivity(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn update_progress(&mut self, progress: &Progress) -> Result<(), RenderError> {
        self.progress = progress.clone();
        Ok(())
    }
}
