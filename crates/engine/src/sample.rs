//! Runtime sample: the operator-supplied stand-ins for upstream system state
//! that a dry run needs in order to pick branches.

use serde::{Deserialize, Serialize};

/// Risk score used when the operator's input is not a number.
pub const DEFAULT_RISK_SCORE: i64 = 85;
/// Validation confidence used when the operator's input is not a number.
pub const DEFAULT_VALIDATION_CONFIDENCE: i64 = 40;
/// Severity used when none is given.
pub const DEFAULT_SEVERITY: &str = "major";

/// Scalar inputs a live execution would only learn at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSample {
    /// Severity name (`minor`, `moderate`, `major`, `critical`).
    pub severity: String,
    pub risk_score: i64,
    /// Per-question inspection scores; their sum is the total score.
    pub inspection_scores: Vec<i64>,
    /// Percentage.
    pub validation_confidence: i64,
}

impl Default for RuntimeSample {
    fn default() -> Self {
        Self {
            severity: DEFAULT_SEVERITY.to_owned(),
            risk_score: DEFAULT_RISK_SCORE,
            inspection_scores: Vec::new(),
            validation_confidence: DEFAULT_VALIDATION_CONFIDENCE,
        }
    }
}

impl RuntimeSample {
    /// Build a sample from raw operator input.
    ///
    /// Numbers are read with leading-integer semantics (`"85%"` is 85).
    /// Anything unreadable falls back instead of failing: risk score to
    /// [`DEFAULT_RISK_SCORE`], validation confidence to
    /// [`DEFAULT_VALIDATION_CONFIDENCE`], each inspection score to 0.
    pub fn from_raw<I, S>(
        severity: &str,
        risk_score: &str,
        inspection_scores: I,
        validation_confidence: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let severity = severity.trim();
        Self {
            severity: if severity.is_empty() { DEFAULT_SEVERITY.to_owned() } else { severity.to_owned() },
            risk_score: parse_leading_int(risk_score).unwrap_or(DEFAULT_RISK_SCORE),
            inspection_scores: inspection_scores
                .into_iter()
                .map(|s| parse_leading_int(s.as_ref()).unwrap_or(0))
                .collect(),
            validation_confidence: parse_leading_int(validation_confidence)
                .unwrap_or(DEFAULT_VALIDATION_CONFIDENCE),
        }
    }

    /// Sum of the inspection sub-scores.
    pub fn total_inspection_score(&self) -> i64 {
        self.inspection_scores
            .iter()
            .fold(0i64, |acc, s| acc.saturating_add(*s))
    }
}

/// Parse the leading integer of `s`: optional whitespace, optional sign,
/// then digits. Trailing text is ignored; no digits at all is `None`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude = rest[..digits]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));

    Some(if negative { -magnitude } else { magnitude })
}
