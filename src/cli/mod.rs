//! CLI support for tidyblocks
//!
//! Provides programmatic access to the `tidyblocks` commands so other tools
//! can run saved programs without going through a subprocess.

mod check;
mod docs;
mod run;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use run::{RunOptions, RunOutcome, execute_run, parse_data_arg};

use std::io;

use crate::convert::ConvertError;
use crate::persist::PersistError;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// The saved program could not be loaded
    Persist(PersistError),
    /// A user dataset could not be read
    Dataset { name: String, err: ConvertError },
    /// IO error
    Io(io::Error),
    /// No program provided
    NoInput,
    /// `--data` argument not of the form NAME=FILE
    BadDataArg(String),
    /// Reloading a saved program gave a different program
    RoundTrip,
    /// Unknown documentation category
    UnknownCategory(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Persist(_) => write!(f, "Cannot load program"),
            CliError::Dataset { name, .. } => write!(f, "Cannot load dataset '{}'", name),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "No program provided. Pass a file or pipe program JSON to stdin.")
            }
            CliError::BadDataArg(arg) => {
                write!(f, "Invalid --data '{}': expected NAME=FILE", arg)
            }
            CliError::RoundTrip => write!(f, "Program does not survive a save/load round trip"),
            CliError::UnknownCategory(c) => write!(
                f,
                "Unknown category: '{}'\nRun 'tidyblocks docs' to see available categories.",
                c
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Persist(e) => Some(e),
            CliError::Dataset { err, .. } => Some(err),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistError> for CliError {
    fn from(e: PersistError) -> Self {
        CliError::Persist(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
