//! Branch conditions and their evaluation against a [`RuntimeSample`].
//!
//! Evaluation is fail-closed: anything the evaluator does not understand
//! (unknown field, unknown operator, unreadable threshold, text operators on
//! numeric fields) resolves to "condition not met".

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value};

use crate::sample::{parse_leading_int, RuntimeSample};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
    Contains,
    NotContains,
}

impl Operator {
    /// Parse the editor's symbol, accepting ASCII spellings of `≠ ≥ ≤`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            ">"                  => Some(Self::Gt),
            "<"                  => Some(Self::Lt),
            "=" | "=="           => Some(Self::Eq),
            "≠" | "!="           => Some(Self::Ne),
            "≥" | ">="           => Some(Self::Ge),
            "≤" | "<="           => Some(Self::Le),
            "Contains"           => Some(Self::Contains),
            "Not Contains"       => Some(Self::NotContains),
            _                    => None,
        }
    }

    /// Ordinal comparison of `actual` against `expected`.
    ///
    /// Text operators have no ordinal meaning and never match.
    fn compare(self, actual: i64, expected: i64) -> bool {
        let ord = actual.cmp(&expected);
        match self {
            Self::Gt => ord == Ordering::Greater,
            Self::Lt => ord == Ordering::Less,
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Ge => ord != Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Contains | Self::NotContains => false,
        }
    }

    fn is_upper_bound(self) -> bool {
        matches!(self, Self::Lt | Self::Le)
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordinal severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Minor = 1,
    Moderate = 2,
    Major = 3,
    Critical = 4,
}

impl Severity {
    /// Case-insensitive lookup by name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor"    => Some(Self::Minor),
            "moderate" => Some(Self::Moderate),
            "major"    => Some(Self::Major),
            "critical" => Some(Self::Critical),
            _          => None,
        }
    }

    fn rank(self) -> i64 {
        self as i64
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The sample fields a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    RiskScore,
    TotalScore,
    ValidationConfidence,
    Severity,
}

impl SampleField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Risk Score"            => Some(Self::RiskScore),
            "Total Score"           => Some(Self::TotalScore),
            "Validation Confidence" => Some(Self::ValidationConfidence),
            "Severity"              => Some(Self::Severity),
            _                       => None,
        }
    }

    /// Threshold assumed when the condition's value is left blank.
    ///
    /// Upper-bound tests on percentage fields default to the top of the
    /// scale; everything else defaults to zero.
    fn blank_threshold(self, op: Operator) -> i64 {
        match self {
            Self::RiskScore | Self::ValidationConfidence if op.is_upper_bound() => 100,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// One stored `{field, operator, value}` test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { field: field.into(), operator: operator.into(), value: value.into() }
    }

    /// First entry of a node's `conditions` array, if any.
    ///
    /// Values may be stored as strings or numbers; both are read as text.
    pub fn from_config(config: &Map<String, Value>) -> Option<Self> {
        let first = config.get("conditions")?.as_array()?.first()?.as_object()?;
        let text = |key: &str| match first.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Some(Self::new(text("field"), text("operator"), text("value")))
    }

    /// Whether the condition holds for `sample`.
    pub fn evaluate(&self, sample: &RuntimeSample) -> bool {
        let (Some(field), Some(op)) = (SampleField::parse(&self.field), Operator::parse(&self.operator))
        else {
            return false;
        };

        match field {
            SampleField::Severity => {
                let actual = Severity::parse(&sample.severity).unwrap_or(Severity::Minor);
                let expected = Severity::parse(&self.value).unwrap_or(Severity::Moderate);
                op.compare(actual.rank(), expected.rank())
            }
            numeric => {
                let actual = match numeric {
                    SampleField::RiskScore => sample.risk_score,
                    SampleField::TotalScore => sample.total_inspection_score(),
                    _ => sample.validation_confidence,
                };
                let threshold = if self.value.trim().is_empty() {
                    numeric.blank_threshold(op)
                } else {
                    match parse_leading_int(&self.value) {
                        Some(n) => n,
                        None => return false,
                    }
                };
                op.compare(actual, threshold)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}
