use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CashmereError;
use crate::operator::Operator;
use crate::value::ScalarValue;

/// Lifecycle status of a signifier version. Toggling this does not bump
/// `version` — it is an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignifierStatus {
    Active,
    Deprecated,
}

/// A single numeric comparison within a `StructuredCondition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCondition {
    pub operator: Operator,
    pub value: ScalarValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// One artifact/property target plus the (conjoined) conditions on its
/// value that must hold for this signifier to be a structural match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredCondition {
    pub artifact: String,
    pub property_affordance: String,
    pub value_conditions: Vec<ValueCondition>,
}

/// Recommended context: the structural prefilter (`structured_conditions`)
/// plus an optional SHACL shapes graph and free-text description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentContext {
    #[serde(default)]
    pub structured_conditions: Vec<StructuredCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shacl_shapes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nl_description: Option<String>,
}

impl IntentContext {
    pub fn has_shapes(&self) -> bool {
        self.shacl_shapes
            .as_ref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Natural-language intent plus an optional structured gloss (typically a
/// short verb/object pair, e.g. `{"intent": "raise the blinds"}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentionDescription {
    pub nl_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Map<String, serde_json::Value>>,
}

impl IntentionDescription {
    /// Text the embedding matcher encodes: `nl_text` plus
    /// `structured["intent"]` when present, joined with a space.
    pub fn combined_text(&self) -> String {
        let mut parts = vec![self.nl_text.clone()];
        if let Some(structured) = &self.structured {
            if let Some(serde_json::Value::String(intent)) = structured.get("intent") {
                if !intent.is_empty() {
                    parts.push(intent.clone());
                }
            }
        }
        let combined = parts.join(" ").trim().to_string();
        if combined.is_empty() {
            "unknown intent".to_string()
        } else {
            combined
        }
    }
}

/// Who/what/how a signifier came to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "manual".to_string()
}

impl Default for Provenance {
    fn default() -> Self {
        Provenance {
            created_at: Utc::now(),
            created_by: String::new(),
            source: default_source(),
        }
    }
}

/// A declarative, pre-authored affordance description: the unit this
/// whole system retrieves and ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signifier {
    pub signifier_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_status")]
    pub status: SignifierStatus,
    pub intent: IntentionDescription,
    #[serde(default)]
    pub context: IntentContext,
    pub affordance_uri: String,
    pub provenance: Provenance,
    /// System-generated metadata (e.g. index bookkeeping). Free-form by
    /// design; never authored directly.
    #[serde(default)]
    pub indexes: serde_json::Map<String, serde_json::Value>,
}

fn default_version() -> u32 {
    1
}

fn default_status() -> SignifierStatus {
    SignifierStatus::Active
}

impl Signifier {
    /// Validates the required-nonempty-field invariants from the data
    /// model (§3): signifier_id, affordance_uri, provenance.created_by,
    /// intent.nl_text must all be non-empty; version must be >= 1.
    pub fn validate(&self) -> Result<(), CashmereError> {
        if self.signifier_id.trim().is_empty() {
            return Err(CashmereError::InvalidInput(
                "signifier_id must not be empty".into(),
            ));
        }
        if self.affordance_uri.trim().is_empty() {
            return Err(CashmereError::InvalidInput(
                "affordance_uri must not be empty".into(),
            ));
        }
        if self.intent.nl_text.trim().is_empty() {
            return Err(CashmereError::InvalidInput(
                "intent.nl_text must not be empty".into(),
            ));
        }
        if self.provenance.created_by.trim().is_empty() {
            return Err(CashmereError::InvalidInput(
                "provenance.created_by must not be empty".into(),
            ));
        }
        if self.version < 1 {
            return Err(CashmereError::InvalidInput(
                "version must be >= 1".into(),
            ));
        }
        for condition in &self.context.structured_conditions {
            if condition.artifact.trim().is_empty()
                || condition.property_affordance.trim().is_empty()
            {
                return Err(CashmereError::InvalidInput(
                    "structured_condition artifact/property_affordance must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// The `(artifact_uri, property_uri)` pairs this signifier's
    /// structured conditions reference, used to update the registry's
    /// inverted property index.
    pub fn property_keys(&self) -> Vec<(String, String)> {
        self.context
            .structured_conditions
            .iter()
            .map(|c| (c.artifact.clone(), c.property_affordance.clone()))
            .collect()
    }

    /// The canonical JSON document representation persisted by the
    /// registry (mirrors `to_json_doc()` in the reference model).
    pub fn to_json_doc(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Signifier always serializes")
    }
}

/// A flat `(artifact_uri, property_uri) -> value` view of a context
/// snapshot, as produced by the Context Builder and consumed by the SSE.
pub type ContextFeatures = HashMap<(String, String), ScalarValue>;
