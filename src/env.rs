//! Run-scoped context shared by the pipelines of one program execution.

use std::collections::HashMap;
use std::fmt;

use crate::table::Table;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic message recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
}

/// Named results, user datasets and the log for one program execution.
///
/// Pipelines write their output tables straight into `results`; the
/// scheduler diffs the key set around each pipeline to find what is new.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Tables produced by pipelines, by result name
    pub results: HashMap<String, Table>,

    /// Datasets supplied by the user before the run
    pub user_data: HashMap<String, Table>,

    log: Vec<LogEntry>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a user dataset.
    pub fn with_user_data(mut self, name: impl Into<String>, table: Table) -> Self {
        self.user_data.insert(name.into(), table);
        self
    }

    pub fn result(&self, name: &str) -> Option<&Table> {
        self.results.get(name)
    }

    pub fn has_result(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    pub fn set_result(&mut self, name: impl Into<String>, table: Table) {
        self.results.insert(name.into(), table);
    }

    /// Append a log entry and mirror it to `tracing`.
    pub fn append_log(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
        self.log.push(LogEntry { severity, message });
    }

    pub fn append_error(&mut self, message: impl Into<String>) {
        self.append_log(Severity::Error, message);
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Entries of a single severity, in the order they were recorded.
    pub fn entries(&self, severity: Severity) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().filter(move |e| e.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.entries(Severity::Error).next().is_some()
    }
}
