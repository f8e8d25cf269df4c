use crate::protocol::LogEntry;

/// Pick the entry to read aloud from a freshly applied batch.
///
/// Only the newest `response` entry whose sequence number is above
/// `last_spoken_no` qualifies; older unread responses in the same batch are
/// skipped, not queued. Entries without a sequence number are never spoken.
pub fn next_utterance(entries: &[LogEntry], last_spoken_no: u64) -> Option<(u64, &str)> {
    entries.iter().rev().find_map(|entry| match entry.no {
        Some(no) if entry.is_response() && no > last_spoken_no => {
            Some((no, entry.content.as_str()))
        }
        _ => None,
    })
}
