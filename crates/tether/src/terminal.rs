use std::io::Write;

use chrono::Local;
use tether_core::{LogEntry, LogSink, LogView, Progress, RenderError, UpsertOutcome};

/// Prints the conversation log as it grows.
///
/// A terminal cannot rewrite earlier lines, so an entry is printed again
/// whenever its content changes, marked with `~`.
pub struct TerminalSink<W> {
    view: LogView,
    out: W,
    connected: Option<bool>,
    last_progress: Option<Progress>,
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            view: LogView::new(),
            out,
            connected: None,
            last_progress: None,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_entry(&mut self, entry: &LogEntry, updated: bool) -> std::io::Result<()> {
        let marker = if updated { '~' } else { ' ' };
        let label = if entry.heading.is_empty() {
            entry.kind.as_str()
        } else {
            entry.heading.as_str()
        };

        writeln!(
            self.out,
            "{}{} {}:",
            marker,
            Local::now().format("%H:%M:%S"),
            label
        )?;
        for line in entry.content.lines() {
            writeln!(self.out, "    {}", line)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> LogSink for TerminalSink<W> {
    fn apply_entries(&mut self, entries: &[LogEntry]) -> Result<(), RenderError> {
        for entry in entries {
            match self.view.upsert(entry) {
                UpsertOutcome::Inserted => self.print_entry(entry, false)?,
                UpsertOutcome::Updated => self.print_entry(entry, true)?,
                UpsertOutcome::Unchanged => {}
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn clear_log(&mut self) -> Result<(), RenderError> {
        let had_entries = !self.view.is_empty();
        self.view.clear();
        self.last_progress = None;
        if had_entries {
            writeln!(self.out, "----")?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn set_connectivity(&mut self, connected: bool) {
        if self.connected == Some(connected) {
            return;
        }
        let first = self.connected.is_none();
        self.connected = Some(connected);

        // Only announce the first state when it is bad news.
        if first && connected {
            return;
        }
        let message = if connected {
            "[backend reachable]"
        } else {
            "[backend unreachable]"
        };
        // Nowhere to report a broken terminal from here.
        let _ = writeln!(self.out, "{}", message).and_then(|_| self.out.flush());
    }

    fn update_progress(&mut self, progress: &Progress) -> Result<(), RenderError> {
        if self.last_progress.as_ref() == Some(progress) {
            return Ok(());
        }
        self.last_progress = Some(progress.clone());

        if progress.active && !progress.message.is_empty() {
            writeln!(self.out, "  .. {}", progress.message)?;
            self.out.flush()?;
        }
        Ok(())
    }
}
