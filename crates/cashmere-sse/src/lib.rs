//! Structured Subsumption Engine (SSE): a stateless, purely numeric
//! prefilter over a signifier's structured conditions against the raw
//! context feature map.

use cashmere_core::{ContextFeatures, ScalarValue, StructuredCondition, ValueCondition};
use serde::Serialize;

/// How a missing context property is handled. `Ignore` and `Pass` are
/// behaviorally identical — no violation recorded, the condition's
/// value conditions are skipped entirely — kept as distinct variants
/// because callers reason about them as separate named policies even
/// though they evaluate the same way today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValuePolicy {
    Fail,
    Ignore,
    Pass,
}

#[derive(Debug, Clone)]
pub struct SseConfig {
    pub missing_value_policy: MissingValuePolicy,
    pub enable_type_coercion: bool,
}

impl Default for SseConfig {
    fn default() -> Self {
        SseConfig {
            missing_value_policy: MissingValuePolicy::Fail,
            enable_type_coercion: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SseViolation {
    pub artifact: String,
    pub property_affordance: String,
    pub operator: String,
    pub expected_value: ScalarValue,
    pub actual_value: Option<ScalarValue>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SseResult {
    pub sse_pass: bool,
    pub violations: Vec<SseViolation>,
    pub conditions_checked: usize,
    pub missing_properties: Vec<(String, String)>,
}

/// Evaluates every `StructuredCondition` against `context_features`. No
/// conditions trivially passes. Never raises: a signifier with
/// conditions the context cannot satisfy simply fails the gate.
pub fn evaluate(
    conditions: &[StructuredCondition],
    context_features: &ContextFeatures,
    config: &SseConfig,
) -> SseResult {
    let mut violations = Vec::new();
    let mut missing_properties = Vec::new();
    let mut conditions_checked = 0usize;

    for condition in conditions {
        conditions_checked += 1;
        let key = (
            condition.artifact.clone(),
            condition.property_affordance.clone(),
        );
        let actual = context_features.get(&key);

        let Some(actual) = actual else {
            missing_properties.push(key.clone());
            if config.missing_value_policy == MissingValuePolicy::Fail {
                violations.push(SseViolation {
                    artifact: condition.artifact.clone(),
                    property_affordance: condition.property_affordance.clone(),
                    operator: "missing".to_string(),
                    expected_value: ScalarValue::String(String::new()),
                    actual_value: None,
                    message: format!(
                        "Property {} on {} is missing from context",
                        condition.property_affordance, condition.artifact
                    ),
                });
            }
            continue;
        };

        for vc in &condition.value_conditions {
            evaluate_value_condition(condition, vc, actual, config, &mut violations);
        }
    }

    SseResult {
        sse_pass: violations.is_empty(),
        violations,
        conditions_checked,
        missing_properties,
    }
}

fn evaluate_value_condition(
    condition: &StructuredCondition,
    vc: &ValueCondition,
    actual: &ScalarValue,
    config: &SseConfig,
    violations: &mut Vec<SseViolation>,
) {
    let actual_num = numeric(actual, config.enable_type_coercion);
    let expected_num = numeric(&vc.value, config.enable_type_coercion);

    // A coercion failure falls through to the comparison the same way an
    // uncaught TypeError would: it can't be evaluated, so it's a failed
    // comparison, not a pass. Treat the missing numeric side as a
    // violation rather than skipping the condition.
    let passed = match (actual_num, expected_num) {
        (Some(a), Some(e)) => vc.operator.evaluate(a, e),
        _ => false,
    };

    if !passed {
        violations.push(SseViolation {
            artifact: condition.artifact.clone(),
            property_affordance: condition.property_affordance.clone(),
            operator: vc.operator.to_string(),
            expected_value: vc.value.clone(),
            actual_value: Some(actual.clone()),
            message: format!(
                "Expected value to be {} {}, but got {}",
                vc.operator.as_human_text(),
                vc.value,
                actual
            ),
        });
    }
}

fn numeric(value: &ScalarValue, coerce: bool) -> Option<f64> {
    match value.as_f64() {
        Some(v) => Some(v),
        None if coerce => value.as_str().and_then(|s| s.parse::<f64>().ok()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashmere_core::Operator;
    use std::collections::HashMap;

    fn condition(artifact: &str, property: &str, op: Operator, value: ScalarValue) -> StructuredCondition {
        StructuredCondition {
            artifact: artifact.to_string(),
            property_affordance: property.to_string(),
            value_conditions: vec![ValueCondition {
                operator: op,
                value,
                datatype: None,
            }],
        }
    }

    #[test]
    fn empty_conditions_trivially_pass() {
        let result = evaluate(&[], &HashMap::new(), &SseConfig::default());
        assert!(result.sse_pass);
        assert_eq!(result.conditions_checked, 0);
    }

    #[test]
    fn passes_when_condition_holds() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        let mut features = HashMap::new();
        features.insert(
            ("sensor1".to_string(), "lum".to_string()),
            ScalarValue::Integer(5000),
        );
        let result = evaluate(&conditions, &features, &SseConfig::default());
        assert!(result.sse_pass);
    }

    #[test]
    fn boundary_min_inclusive_like_comparison() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::GreaterEqual,
            ScalarValue::Integer(10000),
        )];
        let mut features = HashMap::new();
        features.insert(
            ("sensor1".to_string(), "lum".to_string()),
            ScalarValue::Integer(10000),
        );
        let result = evaluate(&conditions, &features, &SseConfig::default());
        assert!(result.sse_pass, "boundary value 10000 should satisfy >= 10000");
    }

    #[test]
    fn fails_when_condition_violated() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        let mut features = HashMap::new();
        features.insert(
            ("sensor1".to_string(), "lum".to_string()),
            ScalarValue::Integer(15000),
        );
        let result = evaluate(&conditions, &features, &SseConfig::default());
        assert!(!result.sse_pass);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn missing_policy_fail_records_violation() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        let config = SseConfig {
            missing_value_policy: MissingValuePolicy::Fail,
            ..Default::default()
        };
        let result = evaluate(&conditions, &HashMap::new(), &config);
        assert!(!result.sse_pass);
        assert_eq!(result.missing_properties.len(), 1);
    }

    #[test]
    fn missing_policy_ignore_and_pass_are_equivalent() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        for policy in [MissingValuePolicy::Ignore, MissingValuePolicy::Pass] {
            let config = SseConfig {
                missing_value_policy: policy,
                ..Default::default()
            };
            let result = evaluate(&conditions, &HashMap::new(), &config);
            assert!(result.sse_pass);
            assert!(result.violations.is_empty());
            assert_eq!(result.missing_properties.len(), 1);
        }
    }

    #[test]
    fn type_coercion_allows_string_numeric_comparison() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        let mut features = HashMap::new();
        features.insert(
            ("sensor1".to_string(), "lum".to_string()),
            ScalarValue::String("5000".to_string()),
        );
        let config = SseConfig {
            enable_type_coercion: true,
            ..Default::default()
        };
        let result = evaluate(&conditions, &features, &config);
        assert!(result.sse_pass);
    }

    #[test]
    fn coercion_failure_is_recorded_as_a_violation() {
        let conditions = vec![condition(
            "sensor1",
            "lum",
            Operator::LessThan,
            ScalarValue::Integer(10000),
        )];
        let mut features = HashMap::new();
        features.insert(
            ("sensor1".to_string(), "lum".to_string()),
            ScalarValue::String("not-a-number".to_string()),
        );
        let config = SseConfig {
            enable_type_coercion: true,
            ..Default::default()
        };
        let result = evaluate(&conditions, &features, &config);
        assert!(!result.sse_pass);
        assert_eq!(result.violations.len(), 1);
    }
}
