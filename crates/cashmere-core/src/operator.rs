use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CashmereError;

/// Comparison operator a `ValueCondition` evaluates against a context
/// feature. The fixed set mirrors the reference model's validated
/// operator field; anything outside it is rejected at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    Equals,
    NotEquals,
}

impl Operator {
    pub fn evaluate(&self, actual: f64, expected: f64) -> bool {
        match self {
            Operator::GreaterThan => actual > expected,
            Operator::LessThan => actual < expected,
            Operator::GreaterEqual => actual >= expected,
            Operator::LessEqual => actual <= expected,
            Operator::Equals => (actual - expected).abs() < f64::EPSILON,
            Operator::NotEquals => (actual - expected).abs() >= f64::EPSILON,
        }
    }

    /// Human-readable phrase used in SSE violation messages, e.g.
    /// "Expected value to be greater than 10000, but got 5000".
    pub fn as_human_text(&self) -> &'static str {
        match self {
            Operator::GreaterThan => "greater than",
            Operator::LessThan => "less than",
            Operator::GreaterEqual => "greater than or equal to",
            Operator::LessEqual => "less than or equal to",
            Operator::Equals => "equal to",
            Operator::NotEquals => "not equal to",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::GreaterEqual => "greaterEqual",
            Operator::LessEqual => "lessEqual",
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Operator {
    type Err = CashmereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greaterThan" => Ok(Operator::GreaterThan),
            "lessThan" => Ok(Operator::LessThan),
            "greaterEqual" => Ok(Operator::GreaterEqual),
            "lessEqual" => Ok(Operator::LessEqual),
            "equals" => Ok(Operator::Equals),
            "notEquals" => Ok(Operator::NotEquals),
            other => Err(CashmereError::InvalidInput(format!(
                "unknown operator: {other}"
            ))),
        }
    }
}
