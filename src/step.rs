use std::fmt;

use crate::env::Environment;
use crate::expr::{EvalError, ValueExpr};
use crate::table::Table;
use crate::value::{Row, Scalar};

/// Family tag shared by every step when persisted.
pub const FAMILY: &str = "@transform";

/// Errors that can occur while a pipeline step runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A transform step ran before any step produced a table
    NoInput(&'static str),

    /// `data` step named a dataset the user never loaded
    UnknownDataset(String),

    /// `read` step named a result that is not in the environment
    MissingResult(String),

    /// `select` step named a column the table does not have
    UnknownColumn(String),

    /// `filter` condition produced something other than a logical
    NotLogical { row: usize, found: &'static str },

    /// Expression evaluation failed
    Eval(EvalError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NoInput(step) => {
                write!(f, "Step \"{}\" has no input table; start with data, read or sequence", step)
            }
            PipelineError::UnknownDataset(name) => write!(f, "Unknown dataset \"{}\"", name),
            PipelineError::MissingResult(label) => {
                write!(f, "Result \"{}\" is not available", label)
            }
            PipelineError::UnknownColumn(name) => write!(f, "Unknown column \"{}\"", name),
            PipelineError::NotLogical { row, found } => {
                write!(f, "Filter condition in row {} must be logical, got {}", row, found)
            }
            PipelineError::Eval(_) => write!(f, "Evaluation failed"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Eval(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EvalError> for PipelineError {
    fn from(e: EvalError) -> Self {
        PipelineError::Eval(e)
    }
}

/// One transformation inside a [`StepPipeline`](crate::StepPipeline).
///
/// Source steps (`Data`, `Read`, `Sequence`) replace the current table;
/// the rest transform it.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Start from a user-loaded dataset
    Data { name: String },

    /// Start from a result produced by another pipeline
    ///
    /// This is the only step that adds to a pipeline's requirements.
    Read { label: String },

    /// Start from a single integer column holding `1..=count`
    Sequence { column: String, count: usize },

    /// Add or overwrite a column with a per-row value
    Create { column: String, value: ValueExpr },

    /// Keep rows where the value is logical true
    ///
    /// `false` and MISSING both drop the row.
    Filter { value: ValueExpr },

    /// Keep only the named columns, in the given order
    Select { columns: Vec<String> },

    /// Publish the current table as a named result
    SaveAs { label: String },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Data { .. } => "data",
            Step::Read { .. } => "read",
            Step::Sequence { .. } => "sequence",
            Step::Create { .. } => "create",
            Step::Filter { .. } => "filter",
            Step::Select { .. } => "select",
            Step::SaveAs { .. } => "saveAs",
        }
    }

    /// The expression value held by this step, if any.
    pub fn value_mut(&mut self) -> Option<&mut ValueExpr> {
        match self {
            Step::Create { value, .. } | Step::Filter { value } => Some(value),
            _ => None,
        }
    }

    /// Run this step on the table produced by the previous one.
    pub fn run(
        &mut self,
        env: &mut Environment,
        data: Option<Table>,
    ) -> Result<Option<Table>, PipelineError> {
        let kind = self.kind();
        match self {
            Step::Data { name } => env
                .user_data
                .get(name.as_str())
                .cloned()
                .map(Some)
                .ok_or_else(|| PipelineError::UnknownDataset(name.clone())),

            Step::Read { label } => env
                .result(label)
                .cloned()
                .map(Some)
                .ok_or_else(|| PipelineError::MissingResult(label.clone())),

            Step::Sequence { column, count } => {
                let rows = (1..=*count)
                    .map(|i| {
                        let mut row = Row::new();
                        row.insert(column.clone(), Scalar::Integer(i as i64));
                        row
                    })
                    .collect();
                Ok(Some(Table::new(vec![column.clone()], rows)))
            }

            Step::Create { column, value } => {
                let mut table = data.ok_or(PipelineError::NoInput(kind))?;
                for (i, row) in table.rows.iter_mut().enumerate() {
                    let result = value.run(row, i)?;
                    row.insert(column.clone(), result);
                }
                table.add_column(column);
                Ok(Some(table))
            }

            Step::Filter { value } => {
                let table = data.ok_or(PipelineError::NoInput(kind))?;
                let mut kept = Vec::with_capacity(table.rows.len());
                for (i, row) in table.rows.into_iter().enumerate() {
                    match value.run(&row, i)? {
                        Scalar::Logical(true) => kept.push(row),
                        Scalar::Logical(false) | Scalar::Missing => {}
                        other => {
                            return Err(PipelineError::NotLogical {
                                row: i,
                                found: other.type_name(),
                            });
                        }
                    }
                }
                Ok(Some(Table::new(table.columns, kept)))
            }

            Step::Select { columns } => {
                let table = data.ok_or(PipelineError::NoInput(kind))?;
                if let Some(unknown) = columns.iter().find(|c| !table.has_column(c)) {
                    return Err(PipelineError::UnknownColumn(unknown.clone()));
                }
                let rows = table
                    .rows
                    .into_iter()
                    .map(|mut row| {
                        row.retain(|k, _| columns.contains(k));
                        row
                    })
                    .collect();
                Ok(Some(Table::new(columns.clone(), rows)))
            }

            Step::SaveAs { label } => {
                let table = data.ok_or(PipelineError::NoInput(kind))?;
                env.set_result(label.clone(), table.clone());
                Ok(Some(table))
            }
        }
    }
}
