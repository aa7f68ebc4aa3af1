//! JSON report of a finished run.
//!
//! The report has two members: `results`, mapping each result name to its
//! rows, and `log`, the ordered list of `{severity, message}` entries.
//! Object keys are sorted, so output is deterministic apart from samples
//! drawn from unseeded random values.
//!
//! ```
//! use tidyblocks::Environment;
//! use tidyblocks::output::to_json;
//!
//! let env = Environment::new();
//! assert_eq!(to_json(&env), r#"{"log":[],"results":{}}"#);
//! ```

use serde_json::{Map, Value as Json, json};

use crate::convert::table_to_json;
use crate::env::Environment;

pub fn report(env: &Environment) -> Json {
    let results: Map<String, Json> = env
        .results
        .iter()
        .map(|(name, table)| (name.clone(), table_to_json(table)))
        .collect();
    let log: Vec<Json> = env
        .log()
        .iter()
        .map(|entry| json!({ "severity": entry.severity.as_str(), "message": entry.message }))
        .collect();
    json!({ "results": results, "log": log })
}

/// Compact JSON report.
pub fn to_json(env: &Environment) -> String {
    report(env).to_string()
}

/// Pretty JSON report with 2-space indentation.
pub fn to_json_pretty(env: &Environment) -> String {
    format!("{:#}", report(env))
}
