//! Run a saved program against user datasets

use super::CliError;
use crate::convert::table_from_str;
use crate::output::{to_json, to_json_pretty};
use crate::persist::program_from_str;
use crate::{Environment, RunSummary};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Saved program JSON
    pub program: Option<String>,
    /// User datasets as (name, JSON text) pairs, loaded before the run
    pub datasets: Vec<(String, String)>,
    /// Seed for every random value in the program
    pub seed: Option<u64>,
    /// Pretty-print the report
    pub pretty: bool,
}

/// Result of a run
#[derive(Debug)]
pub struct RunOutcome {
    /// JSON report of results and log
    pub report: String,
    pub summary: RunSummary,
    /// True if the log holds an error entry
    pub failed: bool,
}

/// Split a `NAME=FILE` argument.
pub fn parse_data_arg(arg: &str) -> Result<(String, String), CliError> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(CliError::BadDataArg(arg.to_string())),
    }
}

/// Execute a run operation
pub fn execute_run(options: &RunOptions) -> Result<RunOutcome, CliError> {
    let text = options.program.as_ref().ok_or(CliError::NoInput)?;
    let mut program = program_from_str(text)?;

    let mut env = Environment::new();
    for (name, json) in &options.datasets {
        let table = table_from_str(json).map_err(|err| CliError::Dataset {
            name: name.clone(),
            err,
        })?;
        env = env.with_user_data(name.clone(), table);
    }

    if let Some(seed) = options.seed {
        program.reseed(seed);
    }

    tracing::info!(pipelines = program.len(), "running program");
    let summary = program.run(env);
    let env = program.take_environment().unwrap_or_default();

    let report = if options.pretty {
        to_json_pretty(&env)
    } else {
        to_json(&env)
    };
    Ok(RunOutcome {
        report,
        summary,
        failed: env.has_errors(),
    })
}
