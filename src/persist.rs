//! Save and load values, steps, pipelines and programs as JSON.
//!
//! Every persisted object is an array that starts with its family tag.
//! Values and steps follow it with a kind tag and their payload:
//!
//! ```text
//! ["@value", "uniform", 0, 1]
//! ["@transform", "create", "noise", ["@value", "normal", 0, 1]]
//! ["@pipeline", ["@transform", "sequence", "n", 10], ["@transform", "saveAs", "numbers"]]
//! ["@program", <pipeline>, <pipeline>, ...]
//! ```
//!
//! Loading goes through the same constructors as hand-built objects, so a
//! persisted `["@value", "uniform", 5, 1]` is rejected exactly like
//! `ValueExpr::uniform(5.0, 1.0)`.

use std::fmt;

use serde_json::Value as Json;

use crate::expr::{self, Node, ValueError, ValueExpr, ValueKind};
use crate::pipeline::{self, StepPipeline};
use crate::program::{self, Program};
use crate::step::{self, Step};

/// Errors that can occur while loading persisted JSON.
#[derive(Debug)]
pub enum PersistError {
    /// Input was not valid JSON
    Json(serde_json::Error),

    /// The family tag was missing or not the one expected here
    WrongFamily { expected: &'static str, found: String },

    /// The kind tag is not known for this family
    UnknownKind { family: &'static str, kind: String },

    /// Structure or payload types are wrong
    Malformed(String),

    /// Payload was well-formed but failed value validation
    Value(ValueError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Json(e) => write!(f, "Invalid JSON: {}", e),
            PersistError::WrongFamily { expected, found } => {
                write!(f, "Expected {} but found {}", expected, found)
            }
            PersistError::UnknownKind { family, kind } => {
                write!(f, "Unknown {} kind \"{}\"", family, kind)
            }
            PersistError::Malformed(msg) => write!(f, "Malformed persisted data: {}", msg),
            PersistError::Value(_) => write!(f, "Invalid value"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Json(e) => Some(e),
            PersistError::Value(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Json(e)
    }
}

impl From<ValueError> for PersistError {
    fn from(e: ValueError) -> Self {
        PersistError::Value(e)
    }
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

fn number(n: f64) -> Json {
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

fn tagged(family: &str, kind: &str, payload: Vec<Json>) -> Json {
    let mut items = vec![Json::from(family), Json::from(kind)];
    items.extend(payload);
    Json::Array(items)
}

pub fn value_to_json(value: &ValueExpr) -> Json {
    let payload = match value.node() {
        Node::Absent | Node::RowNum => vec![],
        Node::Column(name) => vec![Json::from(name.as_str())],
        Node::Datetime(v) => vec![v.map_or(Json::Null, |dt| Json::from(dt.to_string()))],
        Node::Logical(v) => vec![v.map_or(Json::Null, Json::Bool)],
        Node::Number(v) => vec![v.map_or(Json::Null, number)],
        Node::Text(v) => vec![v.as_deref().map_or(Json::Null, Json::from)],
        Node::Exponential { rate, .. } => vec![number(*rate)],
        Node::Normal { mean, std_dev, .. } => vec![number(*mean), number(*std_dev)],
        Node::Uniform { low, high, .. } => vec![number(*low), number(*high)],
    };
    tagged(expr::FAMILY, value.kind().as_str(), payload)
}

pub fn step_to_json(step: &Step) -> Json {
    let payload = match step {
        Step::Data { name } => vec![Json::from(name.as_str())],
        Step::Read { label } => vec![Json::from(label.as_str())],
        Step::Sequence { column, count } => vec![Json::from(column.as_str()), Json::from(*count)],
        Step::Create { column, value } => vec![Json::from(column.as_str()), value_to_json(value)],
        Step::Filter { value } => vec![value_to_json(value)],
        Step::Select { columns } => vec![Json::Array(
            columns.iter().map(|c| Json::from(c.as_str())).collect(),
        )],
        Step::SaveAs { label } => vec![Json::from(label.as_str())],
    };
    tagged(step::FAMILY, step.kind(), payload)
}

pub fn pipeline_to_json(pipeline: &StepPipeline) -> Json {
    let mut items = vec![Json::from(pipeline::FAMILY)];
    items.extend(pipeline.steps.iter().map(step_to_json));
    Json::Array(items)
}

pub fn program_to_json(program: &Program<StepPipeline>) -> Json {
    let mut items = vec![Json::from(program::FAMILY)];
    items.extend(program.pipelines().iter().map(pipeline_to_json));
    Json::Array(items)
}

/// Serialize a program to JSON text.
pub fn program_to_string(program: &Program<StepPipeline>, pretty: bool) -> String {
    let json = program_to_json(program);
    if pretty {
        format!("{:#}", json)
    } else {
        json.to_string()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Check the family tag and return the elements after it.
fn members<'a>(json: &'a Json, family: &'static str) -> Result<&'a [Json], PersistError> {
    let items = json.as_array().ok_or_else(|| PersistError::WrongFamily {
        expected: family,
        found: json.to_string(),
    })?;
    match items.first().and_then(Json::as_str) {
        Some(tag) if tag == family => Ok(&items[1..]),
        Some(tag) => Err(PersistError::WrongFamily {
            expected: family,
            found: tag.to_string(),
        }),
        None => Err(PersistError::WrongFamily {
            expected: family,
            found: json.to_string(),
        }),
    }
}

/// Check the family tag, then split off the kind tag and the payload.
fn kind_and_payload<'a>(
    json: &'a Json,
    family: &'static str,
) -> Result<(&'a str, &'a [Json]), PersistError> {
    let rest = members(json, family)?;
    let kind = rest
        .first()
        .and_then(Json::as_str)
        .ok_or_else(|| PersistError::Malformed(format!("{} without a kind: {}", family, json)))?;
    Ok((kind, &rest[1..]))
}

fn expect_arity(kind: &str, payload: &[Json], n: usize) -> Result<(), PersistError> {
    if payload.len() != n {
        return Err(PersistError::Malformed(format!(
            "\"{}\" takes {} argument(s), got {}",
            kind,
            n,
            payload.len()
        )));
    }
    Ok(())
}

fn as_text<'a>(kind: &str, json: &'a Json) -> Result<&'a str, PersistError> {
    json.as_str().ok_or_else(|| {
        PersistError::Malformed(format!("\"{}\" expects text, got {}", kind, json))
    })
}

fn text_owned(kind: &str, json: &Json) -> Result<String, PersistError> {
    as_text(kind, json).map(str::to_string)
}

fn as_number(kind: &str, json: &Json) -> Result<f64, PersistError> {
    json.as_f64().ok_or_else(|| {
        PersistError::Malformed(format!("\"{}\" expects a number, got {}", kind, json))
    })
}

/// `null` is the missing sentinel; anything else goes through `read`.
fn optional<T>(
    json: &Json,
    read: impl FnOnce(&Json) -> Result<T, PersistError>,
) -> Result<Option<T>, PersistError> {
    if json.is_null() { Ok(None) } else { read(json).map(Some) }
}

pub fn value_from_json(json: &Json) -> Result<ValueExpr, PersistError> {
    let (name, payload) = kind_and_payload(json, expr::FAMILY)?;
    let kind = ValueKind::from_name(name).ok_or_else(|| PersistError::UnknownKind {
        family: expr::FAMILY,
        kind: name.to_string(),
    })?;

    let arity = match kind {
        ValueKind::Absent | ValueKind::RowNum => 0,
        ValueKind::Normal | ValueKind::Uniform => 2,
        _ => 1,
    };
    expect_arity(name, payload, arity)?;

    let value = match kind {
        ValueKind::Absent => ValueExpr::absent(),
        ValueKind::RowNum => ValueExpr::rownum(),
        ValueKind::Column => ValueExpr::column(as_text(name, &payload[0])?)?,
        ValueKind::Datetime => match optional(&payload[0], |j| text_owned(name, j))? {
            Some(text) => ValueExpr::datetime_text(&text)?,
            None => ValueExpr::missing(kind)?,
        },
        ValueKind::Logical => match optional(&payload[0], |j| {
            j.as_bool().ok_or_else(|| {
                PersistError::Malformed(format!("\"{}\" expects true/false, got {}", name, j))
            })
        })? {
            Some(b) => ValueExpr::logical(b),
            None => ValueExpr::missing(kind)?,
        },
        ValueKind::Number => match optional(&payload[0], |j| as_number(name, j))? {
            Some(n) => ValueExpr::number(n)?,
            None => ValueExpr::missing(kind)?,
        },
        ValueKind::Text => match optional(&payload[0], |j| text_owned(name, j))? {
            Some(text) => ValueExpr::text(text),
            None => ValueExpr::missing(kind)?,
        },
        ValueKind::Exponential => ValueExpr::exponential(as_number(name, &payload[0])?)?,
        ValueKind::Normal => {
            ValueExpr::normal(as_number(name, &payload[0])?, as_number(name, &payload[1])?)?
        }
        ValueKind::Uniform => {
            ValueExpr::uniform(as_number(name, &payload[0])?, as_number(name, &payload[1])?)?
        }
    };
    Ok(value)
}

pub fn step_from_json(json: &Json) -> Result<Step, PersistError> {
    let (kind, payload) = kind_and_payload(json, step::FAMILY)?;
    let step = match kind {
        "data" => {
            expect_arity(kind, payload, 1)?;
            Step::Data {
                name: as_text(kind, &payload[0])?.to_string(),
            }
        }
        "read" => {
            expect_arity(kind, payload, 1)?;
            Step::Read {
                label: as_text(kind, &payload[0])?.to_string(),
            }
        }
        "sequence" => {
            expect_arity(kind, payload, 2)?;
            let count = payload[1].as_u64().ok_or_else(|| {
                PersistError::Malformed(format!(
                    "\"sequence\" expects a non-negative integer count, got {}",
                    payload[1]
                ))
            })?;
            Step::Sequence {
                column: as_text(kind, &payload[0])?.to_string(),
                count: count as usize,
            }
        }
        "create" => {
            expect_arity(kind, payload, 2)?;
            Step::Create {
                column: as_text(kind, &payload[0])?.to_string(),
                value: value_from_json(&payload[1])?,
            }
        }
        "filter" => {
            expect_arity(kind, payload, 1)?;
            Step::Filter {
                value: value_from_json(&payload[0])?,
            }
        }
        "select" => {
            expect_arity(kind, payload, 1)?;
            let columns = payload[0]
                .as_array()
                .ok_or_else(|| {
                    PersistError::Malformed(format!(
                        "\"select\" expects a list of columns, got {}",
                        payload[0]
                    ))
                })?
                .iter()
                .map(|c| as_text(kind, c).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Step::Select { columns }
        }
        "saveAs" => {
            expect_arity(kind, payload, 1)?;
            Step::SaveAs {
                label: as_text(kind, &payload[0])?.to_string(),
            }
        }
        other => {
            return Err(PersistError::UnknownKind {
                family: step::FAMILY,
                kind: other.to_string(),
            });
        }
    };
    Ok(step)
}

pub fn pipeline_from_json(json: &Json) -> Result<StepPipeline, PersistError> {
    let steps = members(json, pipeline::FAMILY)?
        .iter()
        .map(step_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StepPipeline::new(steps))
}

pub fn program_from_json(json: &Json) -> Result<Program<StepPipeline>, PersistError> {
    let pipelines = members(json, program::FAMILY)?
        .iter()
        .map(pipeline_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program::with_pipelines(pipelines))
}

/// Parse JSON text into a program ready to run.
pub fn program_from_str(text: &str) -> Result<Program<StepPipeline>, PersistError> {
    let json: Json = serde_json::from_str(text)?;
    program_from_json(&json)
}
