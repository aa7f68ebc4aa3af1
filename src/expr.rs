//! Row-evaluable expression values.
//!
//! A [`ValueExpr`] is a leaf of a block expression: a constant, a structural
//! accessor (column lookup or row number), or a sampler drawing from a random
//! distribution. Pipeline steps evaluate them once per row with
//! [`ValueExpr::run`].

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp, Normal, Uniform};

use crate::datetime::{Datetime, DatetimeError};
use crate::value::{Row, Scalar};

/// Family tag shared by every expression value when persisted.
pub const FAMILY: &str = "@value";

/// The kind tag of an expression value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Absent,
    RowNum,
    Column,
    Datetime,
    Logical,
    Number,
    Text,
    Exponential,
    Normal,
    Uniform,
}

impl ValueKind {
    pub const ALL: [ValueKind; 10] = [
        ValueKind::Absent,
        ValueKind::RowNum,
        ValueKind::Column,
        ValueKind::Datetime,
        ValueKind::Logical,
        ValueKind::Number,
        ValueKind::Text,
        ValueKind::Exponential,
        ValueKind::Normal,
        ValueKind::Uniform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Absent => "absent",
            ValueKind::RowNum => "rownum",
            ValueKind::Column => "column",
            ValueKind::Datetime => "datetime",
            ValueKind::Logical => "logical",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Exponential => "exponential",
            ValueKind::Normal => "normal",
            ValueKind::Uniform => "uniform",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Errors raised while constructing an expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Column name was empty
    EmptyColumnName,

    /// Datetime constant could not be parsed
    Datetime(DatetimeError),

    /// Number constant was NaN or infinite
    BadNumber(f64),

    /// Only constant kinds have a MISSING form
    NotConstant(ValueKind),

    /// Exponential rate was not a positive finite number
    BadRate(f64),

    /// Normal mean was not finite
    BadMean(f64),

    /// Normal standard deviation was negative or not finite
    BadStdDev(f64),

    /// Uniform bound was not finite, or the range is too wide to sample
    BadBound(f64),

    /// Uniform low end above high end
    InvertedRange { low: f64, high: f64 },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::EmptyColumnName => write!(f, "Column name must be a non-empty string"),
            ValueError::Datetime(_) => write!(f, "Datetime value must be MISSING or a date"),
            ValueError::BadNumber(n) => write!(f, "Number \"{}\" must be finite", n),
            ValueError::NotConstant(kind) => {
                write!(f, "\"{}\" values cannot be MISSING", kind)
            }
            ValueError::BadRate(rate) => write!(f, "Rate \"{}\" must be positive number", rate),
            ValueError::BadMean(mean) => write!(f, "Mean \"{}\" must be a finite number", mean),
            ValueError::BadStdDev(sd) => write!(
                f,
                "Standard deviation \"{}\" must be a non-negative number",
                sd
            ),
            ValueError::BadBound(b) => write!(f, "Bound \"{}\" must be a finite number", b),
            ValueError::InvertedRange { low, high } => write!(
                f,
                "Low end \"{}\" must not be greater than high end \"{}\"",
                low, high
            ),
        }
    }
}

impl std::error::Error for ValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValueError::Datetime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DatetimeError> for ValueError {
    fn from(e: DatetimeError) -> Self {
        ValueError::Datetime(e)
    }
}

/// Errors raised while evaluating an expression value against a row.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An `absent` placeholder was evaluated
    Incomplete,

    /// The row has no column with this name
    MissingColumn { column: String, row: usize },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Incomplete => write!(f, "Missing expression"),
            EvalError::MissingColumn { column, row } => {
                write!(f, "Column \"{}\" not in row {}", column, row)
            }
        }
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Clone)]
enum Dist {
    Exponential(Exp<f64>),
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
}

/// A private pseudo-random stream bound to one stochastic value.
///
/// Samplers never take part in equality or persistence; only the
/// distribution parameters next to them do.
#[derive(Debug, Clone)]
pub(crate) struct Sampler {
    dist: Dist,
    rng: StdRng,
}

impl Sampler {
    fn new(dist: Dist) -> Self {
        Sampler {
            dist,
            rng: StdRng::from_entropy(),
        }
    }

    fn draw(&mut self) -> f64 {
        match &self.dist {
            Dist::Exponential(d) => d.sample(&mut self.rng),
            Dist::Normal(d) => d.sample(&mut self.rng),
            Dist::Uniform(d) => d.sample(&mut self.rng),
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Payload of a [`ValueExpr`]. Only the validating constructors build one,
/// so parameters and sampler always agree.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Absent,
    RowNum,
    Column(String),
    Datetime(Option<Datetime>),
    Logical(Option<bool>),
    Number(Option<f64>),
    Text(Option<String>),
    Exponential {
        rate: f64,
        sampler: Sampler,
    },
    Normal {
        mean: f64,
        std_dev: f64,
        sampler: Sampler,
    },
    Uniform {
        low: f64,
        high: f64,
        sampler: Sampler,
    },
}

/// An expression value: the closed set of leaf expressions a block can hold.
///
/// Values are built only through constructors that validate their
/// parameters; constants use [`ValueExpr::missing`] for the MISSING sentinel.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tidyblocks::{Scalar, ValueExpr};
///
/// let mut row = HashMap::new();
/// row.insert("x".to_string(), Scalar::Integer(5));
///
/// let mut col = ValueExpr::column("x").unwrap();
/// assert_eq!(col.run(&row, 0).unwrap(), Scalar::Integer(5));
///
/// let mut n = ValueExpr::rownum();
/// assert_eq!(n.run(&row, 7).unwrap(), Scalar::Integer(7));
/// ```
///
/// The payload is not reachable from outside, so an unchecked value cannot
/// be assembled:
///
/// ```compile_fail
/// let bad = tidyblocks::ValueExpr::Column(String::new());
/// ```
#[derive(Debug, Clone)]
pub struct ValueExpr {
    node: Node,
}

impl ValueExpr {
    fn from_node(node: Node) -> Self {
        ValueExpr { node }
    }

    /// Placeholder for an unfilled expression slot.
    pub fn absent() -> Self {
        Self::from_node(Node::Absent)
    }

    /// The 0-based row index.
    pub fn rownum() -> Self {
        Self::from_node(Node::RowNum)
    }

    pub fn column(name: &str) -> Result<Self, ValueError> {
        if name.is_empty() {
            return Err(ValueError::EmptyColumnName);
        }
        Ok(Self::from_node(Node::Column(name.to_string())))
    }

    pub fn datetime(value: Datetime) -> Self {
        Self::from_node(Node::Datetime(Some(value)))
    }

    /// Datetime constant from ISO-8601 text.
    pub fn datetime_text(text: &str) -> Result<Self, ValueError> {
        Ok(Self::datetime(Datetime::parse(text)?))
    }

    pub fn logical(value: bool) -> Self {
        Self::from_node(Node::Logical(Some(value)))
    }

    /// Number constant. Must be finite.
    pub fn number(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::BadNumber(value));
        }
        Ok(Self::from_node(Node::Number(Some(value))))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::from_node(Node::Text(Some(value.into())))
    }

    /// The MISSING constant of a constant kind.
    pub fn missing(kind: ValueKind) -> Result<Self, ValueError> {
        let node = match kind {
            ValueKind::Datetime => Node::Datetime(None),
            ValueKind::Logical => Node::Logical(None),
            ValueKind::Number => Node::Number(None),
            ValueKind::Text => Node::Text(None),
            other => return Err(ValueError::NotConstant(other)),
        };
        Ok(Self::from_node(node))
    }

    pub fn exponential(rate: f64) -> Result<Self, ValueError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ValueError::BadRate(rate));
        }
        let dist = Exp::new(rate).map_err(|_| ValueError::BadRate(rate))?;
        Ok(Self::from_node(Node::Exponential {
            rate,
            sampler: Sampler::new(Dist::Exponential(dist)),
        }))
    }

    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, ValueError> {
        if !mean.is_finite() {
            return Err(ValueError::BadMean(mean));
        }
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(ValueError::BadStdDev(std_dev));
        }
        let dist = Normal::new(mean, std_dev).map_err(|_| ValueError::BadStdDev(std_dev))?;
        Ok(Self::from_node(Node::Normal {
            mean,
            std_dev,
            sampler: Sampler::new(Dist::Normal(dist)),
        }))
    }

    pub fn uniform(low: f64, high: f64) -> Result<Self, ValueError> {
        for bound in [low, high] {
            if !bound.is_finite() {
                return Err(ValueError::BadBound(bound));
            }
        }
        if low > high {
            return Err(ValueError::InvertedRange { low, high });
        }
        if !(high - low).is_finite() {
            return Err(ValueError::BadBound(high));
        }
        Ok(Self::from_node(Node::Uniform {
            low,
            high,
            sampler: Sampler::new(Dist::Uniform(Uniform::new_inclusive(low, high))),
        }))
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    pub fn kind(&self) -> ValueKind {
        match &self.node {
            Node::Absent => ValueKind::Absent,
            Node::RowNum => ValueKind::RowNum,
            Node::Column(_) => ValueKind::Column,
            Node::Datetime(_) => ValueKind::Datetime,
            Node::Logical(_) => ValueKind::Logical,
            Node::Number(_) => ValueKind::Number,
            Node::Text(_) => ValueKind::Text,
            Node::Exponential { .. } => ValueKind::Exponential,
            Node::Normal { .. } => ValueKind::Normal,
            Node::Uniform { .. } => ValueKind::Uniform,
        }
    }

    pub fn family(&self) -> &'static str {
        FAMILY
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(
            self.node,
            Node::Exponential { .. } | Node::Normal { .. } | Node::Uniform { .. }
        )
    }

    /// Restart this value's random stream from `seed`. No-op for
    /// deterministic kinds.
    pub fn reseed(&mut self, seed: u64) {
        match &mut self.node {
            Node::Exponential { sampler, .. }
            | Node::Normal { sampler, .. }
            | Node::Uniform { sampler, .. } => sampler.reseed(seed),
            _ => {}
        }
    }

    /// Evaluate against one row.
    ///
    /// Constants ignore the row. Samplers advance their stream, so calling
    /// this twice on the same row gives two different draws.
    pub fn run(&mut self, row: &Row, index: usize) -> Result<Scalar, EvalError> {
        match &mut self.node {
            Node::Absent => Err(EvalError::Incomplete),
            Node::RowNum => Ok(Scalar::Integer(index as i64)),
            Node::Column(name) => {
                row.get(name.as_str())
                    .cloned()
                    .ok_or_else(|| EvalError::MissingColumn {
                        column: name.clone(),
                        row: index,
                    })
            }
            Node::Datetime(v) => Ok(v.map_or(Scalar::Missing, Scalar::Datetime)),
            Node::Logical(v) => Ok(v.map_or(Scalar::Missing, Scalar::Logical)),
            Node::Number(v) => Ok(v.map_or(Scalar::Missing, Scalar::Number)),
            Node::Text(v) => Ok(v.clone().map_or(Scalar::Missing, Scalar::Text)),
            Node::Exponential { sampler, .. }
            | Node::Normal { sampler, .. }
            | Node::Uniform { sampler, .. } => Ok(Scalar::Number(sampler.draw())),
        }
    }
}

impl PartialEq for ValueExpr {
    fn eq(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (Node::Absent, Node::Absent) | (Node::RowNum, Node::RowNum) => true,
            (Node::Column(a), Node::Column(b)) => a == b,
            (Node::Datetime(a), Node::Datetime(b)) => a == b,
            (Node::Logical(a), Node::Logical(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Exponential { rate: a, .. }, Node::Exponential { rate: b, .. }) => a == b,
            (
                Node::Normal {
                    mean: m1,
                    std_dev: s1,
                    ..
                },
                Node::Normal {
                    mean: m2,
                    std_dev: s2,
                    ..
                },
            ) => m1 == m2 && s1 == s2,
            (
                Node::Uniform {
                    low: l1, high: h1, ..
                },
                Node::Uniform {
                    low: l2, high: h2, ..
                },
            ) => l1 == l2 && h1 == h2,
            _ => false,
        }
    }
}
