pub mod cli;
pub mod convert;
pub mod datetime;
pub mod env;
pub mod expr;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod program;
pub mod step;
pub mod table;
pub mod value;

pub use datetime::{Datetime, DatetimeError};
pub use env::{Environment, LogEntry, Severity};
pub use expr::{EvalError, ValueError, ValueExpr, ValueKind};
pub use persist::PersistError;
pub use pipeline::{Pipeline, StepPipeline};
pub use program::{Program, RunSummary, ScheduleError};
pub use step::{PipelineError, Step};
pub use table::Table;
pub use value::{Row, Scalar};
