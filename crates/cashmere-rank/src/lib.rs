//! Ranker & Policy (RP): combines per-candidate signals into a final
//! score, enforces hard gates, and produces human-readable explanations.

use std::cmp::Ordering;
use std::collections::HashMap;

use cashmere_core::CashmereError;
use serde::Serialize;

/// SHACL validation outcome for one candidate, present only when the
/// Shape Validator stage ran for it.
#[derive(Debug, Clone, Copy)]
pub struct ShaclSignal {
    pub conforms: bool,
    pub has_shapes: bool,
}

/// Raw per-candidate inputs the ranker consumes. A `None` field means
/// the corresponding pipeline stage did not run (disabled or skipped),
/// not that it ran and produced a negative result.
#[derive(Debug, Clone)]
pub struct CandidateSignals {
    pub signifier_id: String,
    pub intent_similarity: f64,
    pub shacl: Option<ShaclSignal>,
    pub sse_pass: Option<bool>,
    pub constraint_count: usize,
}

#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub weights: HashMap<String, f64>,
    pub enable_shacl_gate: bool,
    pub enable_sse_gate: bool,
    pub specificity_boost: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        let mut weights = HashMap::new();
        weights.insert("intent_similarity".to_string(), 0.7);
        weights.insert("shacl".to_string(), 0.2);
        weights.insert("sse".to_string(), 0.1);
        RankerConfig {
            weights,
            enable_shacl_gate: true,
            enable_sse_gate: false,
            specificity_boost: 0.01,
        }
    }
}

impl RankerConfig {
    /// Applies a per-request weight override without disturbing the
    /// configured gates or specificity boost — a request can retune
    /// relative signal importance without also silently reopening or
    /// closing a hard gate.
    pub fn with_weight_overrides(mut self, overrides: &HashMap<String, f64>) -> Self {
        for (name, value) in overrides {
            self.weights.insert(name.clone(), *value);
        }
        self
    }

    fn weight(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub is_gate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub signifier_id: String,
    pub final_score: f64,
    pub signals: Vec<Signal>,
    pub passed_gates: bool,
    pub explanation: Vec<String>,
    pub metadata: serde_json::Value,
}

/// Ranks `candidates` in place, returning them sorted by `final_score`
/// descending, then `signifier_id` ascending for a stable tie-break.
/// Never fails: a candidate that cannot be scored meaningfully still
/// gets a result with an explanatory signal, never an error.
pub fn rank(candidates: &[CandidateSignals], config: &RankerConfig) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = candidates.iter().map(|c| rank_one(c, config)).collect();

    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.signifier_id.cmp(&b.signifier_id))
    });

    results
}

fn rank_one(candidate: &CandidateSignals, config: &RankerConfig) -> RankedResult {
    let mut signals = vec![Signal {
        name: "intent_similarity".to_string(),
        value: candidate.intent_similarity,
        weight: config.weight("intent_similarity"),
        is_gate: false,
    }];

    let mut shacl_conforms_value: Option<f64> = None;
    let has_shapes = candidate.shacl.map(|s| s.has_shapes).unwrap_or(false);
    if let Some(shacl) = candidate.shacl {
        shacl_conforms_value = Some(if shacl.conforms { 1.0 } else { 0.0 });
        signals.push(Signal {
            name: "shacl".to_string(),
            value: shacl_conforms_value.unwrap(),
            weight: config.weight("shacl"),
            is_gate: config.enable_shacl_gate,
        });
    }

    let mut sse_value: Option<f64> = None;
    if let Some(sse_pass) = candidate.sse_pass {
        sse_value = Some(if sse_pass { 1.0 } else { 0.0 });
        signals.push(Signal {
            name: "sse".to_string(),
            value: sse_value.unwrap(),
            weight: config.weight("sse"),
            is_gate: config.enable_sse_gate,
        });
    }

    let mut explanation = Vec::new();
    let mut passed_gates = true;

    if config.enable_shacl_gate && has_shapes {
        if let Some(shacl) = candidate.shacl {
            if !shacl.conforms {
                passed_gates = false;
                explanation.push(format!(
                    "SHACL shape FAIL (hard gate): candidate {} does not conform to its shape constraints",
                    candidate.signifier_id
                ));
            }
        }
    }
    if config.enable_sse_gate {
        if candidate.sse_pass == Some(false) {
            passed_gates = false;
            explanation.push(format!(
                "SSE FAIL (hard gate): candidate {} violates one or more structured conditions",
                candidate.signifier_id
            ));
        }
    }

    let final_score = if !passed_gates {
        0.0
    } else {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        weighted_sum += config.weight("intent_similarity") * candidate.intent_similarity;
        weight_total += config.weight("intent_similarity");

        if let Some(v) = shacl_conforms_value {
            weighted_sum += config.weight("shacl") * v;
            weight_total += config.weight("shacl");
        }
        if let Some(v) = sse_value {
            weighted_sum += config.weight("sse") * v;
            weight_total += config.weight("sse");
        }

        let base_score = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };

        let boosted = base_score + config.specificity_boost * candidate.constraint_count as f64;
        boosted.min(1.0)
    };

    if passed_gates {
        explanation.push(format!(
            "intent_similarity={:.3}, final_score={:.3}",
            candidate.intent_similarity, final_score
        ));
    }

    RankedResult {
        signifier_id: candidate.signifier_id.clone(),
        final_score,
        signals,
        passed_gates,
        explanation,
        metadata: serde_json::json!({
            "constraint_count": candidate.constraint_count,
            "shacl_has_shapes": has_shapes,
        }),
    }
}

/// Validates that a weight-override map uses recognized signal names,
/// surfaced so callers can reject a malformed per-request override
/// before it silently no-ops.
pub fn validate_weight_names(overrides: &HashMap<String, f64>) -> Result<(), CashmereError> {
    const KNOWN: [&str; 3] = ["intent_similarity", "shacl", "sse"];
    for name in overrides.keys() {
        if !KNOWN.contains(&name.as_str()) {
            return Err(CashmereError::InvalidInput(format!(
                "unknown ranking weight signal: {name}"
            )));
        }
    }
    Ok(())
}
