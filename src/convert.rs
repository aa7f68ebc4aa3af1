//! JSON <-> table conversion for user datasets and run results.

use std::fmt;

use serde_json::Value as Json;

use crate::table::Table;
use crate::value::{Row, Scalar};

/// Errors that can occur while reading a table from JSON.
#[derive(Debug)]
pub enum ConvertError {
    /// Input was not valid JSON
    Json(serde_json::Error),
    /// Top level was not an array of records
    NotArray,
    /// A record was not a JSON object
    RowNotObject { row: usize },
    /// A cell held an array or object
    NotScalar { row: usize, column: String },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Json(e) => write!(f, "Invalid JSON: {}", e),
            ConvertError::NotArray => write!(f, "Table must be a JSON array of objects"),
            ConvertError::RowNotObject { row } => write!(f, "Row {} must be object", row),
            ConvertError::NotScalar { row, column } => {
                write!(f, "Cell \"{}\" in row {} must be a scalar", column, row)
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        ConvertError::Json(e)
    }
}

/// Convert a JSON scalar to a [`Scalar`]; `None` for arrays and objects.
///
/// Text is never guessed to be a datetime.
pub fn json_to_scalar(v: Json) -> Option<Scalar> {
    match v {
        Json::Null => Some(Scalar::Missing),
        Json::Bool(b) => Some(Scalar::Logical(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(Scalar::Integer(i)),
            None => n.as_f64().map(Scalar::Number),
        },
        Json::String(s) => Some(Scalar::Text(s)),
        Json::Array(_) | Json::Object(_) => None,
    }
}

/// Convert a [`Scalar`] to JSON. Non-finite numbers become `null` and
/// datetimes become ISO-8601 text.
pub fn scalar_to_json(v: &Scalar) -> Json {
    match v {
        Scalar::Missing => Json::Null,
        Scalar::Logical(b) => Json::Bool(*b),
        Scalar::Integer(i) => Json::Number((*i).into()),
        Scalar::Number(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Scalar::Text(s) => Json::String(s.clone()),
        Scalar::Datetime(dt) => Json::String(dt.to_string()),
    }
}

pub fn json_to_row(v: Json, index: usize) -> Result<Row, ConvertError> {
    let Json::Object(obj) = v else {
        return Err(ConvertError::RowNotObject { row: index });
    };
    obj.into_iter()
        .map(|(k, v)| match json_to_scalar(v) {
            Some(s) => Ok((k, s)),
            None => Err(ConvertError::NotScalar {
                row: index,
                column: k,
            }),
        })
        .collect()
}

pub fn json_to_table(v: Json) -> Result<Table, ConvertError> {
    let Json::Array(records) = v else {
        return Err(ConvertError::NotArray);
    };
    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| json_to_row(r, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::from_rows(rows))
}

/// Parse JSON text holding an array of records.
pub fn table_from_str(text: &str) -> Result<Table, ConvertError> {
    json_to_table(serde_json::from_str(text)?)
}

/// Render a table as an array of records. Cells a row lacks are `null`.
pub fn table_to_json(table: &Table) -> Json {
    Json::Array(
        table
            .rows
            .iter()
            .map(|row| {
                let obj = table
                    .columns
                    .iter()
                    .map(|c| {
                        let cell = row.get(c).map_or(Json::Null, scalar_to_json);
                        (c.clone(), cell)
                    })
                    .collect();
                Json::Object(obj)
            })
            .collect(),
    )
}
