//! Documentation content for the tidyblocks CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Values,
    Steps,
    Programs,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "values" | "value" => Some(Self::Values),
            "steps" | "step" | "transforms" => Some(Self::Steps),
            "programs" | "program" | "pipelines" | "scheduling" => Some(Self::Programs),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"TIDYBLOCKS DOCUMENTATION

A program is a list of pipelines saved as JSON. Each pipeline is a list of
steps; steps that compute per-row data hold expression values.

CATEGORIES
  values     Expression values: constants, columns, row numbers, samplers
  steps      Pipeline steps and what each one does to the table
  programs   How pipelines are scheduled and how runs report problems

Run 'tidyblocks doc <category>' for details.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Values) => Ok(VALUES_DOC),
        Some(DocCategory::Steps) => Ok(STEPS_DOC),
        Some(DocCategory::Programs) => Ok(PROGRAMS_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const VALUES_DOC: &str = r#"EXPRESSION VALUES

Saved as ["@value", kind, ...payload]. null is the MISSING sentinel.

  ["@value", "absent"]              Unfilled slot; evaluating it is an error
  ["@value", "rownum"]              0-based row index
  ["@value", "column", "x"]         Value of column x; error if the row lacks it
  ["@value", "number", 3.5]         Finite constant number (or null)
  ["@value", "text", "abc"]         Constant text (or null)
  ["@value", "logical", true]       Constant logical (or null)
  ["@value", "datetime", "2020-01-02T00:00:00Z"]
                                    Constant ISO-8601 datetime (or null)
  ["@value", "exponential", 2]      Sample, rate > 0
  ["@value", "normal", 0, 1]        Sample, mean and std-dev >= 0
  ["@value", "uniform", 0, 1]       Sample in [low, high], low <= high

Samplers draw a fresh value every time they are evaluated. Use --seed to
make a run reproducible.
"#;

const STEPS_DOC: &str = r#"PIPELINE STEPS

Saved as ["@transform", kind, ...payload]. The first step of a pipeline must
produce a table.

  ["@transform", "data", "name"]          Start from a dataset given with --data
  ["@transform", "read", "label"]         Start from another pipeline's result
  ["@transform", "sequence", "n", 10]     Start from column n holding 1..10
  ["@transform", "create", "col", VALUE]  Set col to VALUE in every row
  ["@transform", "filter", VALUE]         Keep rows where VALUE is true
  ["@transform", "select", ["a", "b"]]    Keep only columns a and b
  ["@transform", "saveAs", "label"]       Publish the table as a result
"#;

const PROGRAMS_DOC: &str = r#"PROGRAMS AND SCHEDULING

Saved as ["@program", PIPELINE, ...] with PIPELINE = ["@pipeline", STEP, ...].

A pipeline that reads a result waits until some pipeline saves it. Ready
pipelines run first-in first-out in the order they appear in the program.

If a pipeline fails, the run stops and the error is added to the log.
Pipelines whose inputs are never saved are skipped and reported once as a
warning listing the missing names.
"#;
