use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar condition value or context feature value.
///
/// Matches the JSON scalar shapes a structured condition or context
/// property may hold: integer, floating point, boolean, or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl ScalarValue {
    /// Numeric view used by the Structured Subsumption Engine's operator
    /// evaluation. Booleans coerce to 0.0/1.0; strings do not coerce here
    /// (that coercion, when enabled, is the SSE's job, not this type's).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Integer(i) => Some(*i as f64),
            ScalarValue::Float(f) => Some(*f),
            ScalarValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ScalarValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The XSD datatype this value maps to in an RDF context graph, per
    /// the context-builder conversion rules.
    pub fn xsd_datatype(&self) -> &'static str {
        match self {
            ScalarValue::Bool(_) => "http://www.w3.org/2001/XMLSchema#boolean",
            ScalarValue::Integer(_) => "http://www.w3.org/2001/XMLSchema#integer",
            ScalarValue::Float(_) => "http://www.w3.org/2001/XMLSchema#double",
            ScalarValue::String(_) => "http://www.w3.org/2001/XMLSchema#string",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Integer(i) => write!(f, "{i}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<serde_json::Value> for ScalarValue {
    /// Anything that doesn't cleanly map (null, array, object) becomes its
    /// stringified form, mirroring the context builder's "else -> stringify
    /// with a warning" rule. This conversion itself does not warn; callers
    /// that care about the warning do so at the call site.
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => ScalarValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ScalarValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ScalarValue::Float(f)
                } else {
                    ScalarValue::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => ScalarValue::String(s),
            other => ScalarValue::String(other.to_string()),
        }
    }
}
