//! Validate a saved program without running it

use std::collections::BTreeSet;

use super::CliError;
use crate::Pipeline;
use crate::persist::{program_from_str, program_to_string};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Saved program JSON
    pub program: Option<String>,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Number of pipelines in the program
    pub pipelines: usize,
    /// Required names that no pipeline in the program saves
    pub unresolved: Vec<String>,
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Program is valid: {} pipeline(s)", self.pipelines)?;
        if !self.unresolved.is_empty() {
            write!(f, "; never produced: {}", self.unresolved.join(", "))?;
        }
        Ok(())
    }
}

/// Execute a check operation
///
/// Loads the program, saves it again and reloads the copy; the two must be
/// equal. Requirements nothing in the program produces are reported, not
/// rejected; running such a program ends with a warning.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let text = options.program.as_ref().ok_or(CliError::NoInput)?;
    let program = program_from_str(text)?;

    let copy = program_from_str(&program_to_string(&program, false))?;
    if copy != program {
        return Err(CliError::RoundTrip);
    }

    let produced: BTreeSet<String> = program
        .pipelines()
        .iter()
        .flat_map(|p| p.produces())
        .collect();
    let unresolved: BTreeSet<String> = program
        .pipelines()
        .iter()
        .flat_map(|p| p.requires())
        .filter(|name| !produced.contains(name))
        .collect();

    Ok(CheckResult {
        pipelines: program.len(),
        unresolved: unresolved.into_iter().collect(),
    })
}
