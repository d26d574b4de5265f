//! Property checks for the SSE's two documented algorithmic laws: the
//! `Ignore`/`Pass` missing-value policies are behaviorally identical for
//! any condition set, and a condition set with zero conditions always
//! passes regardless of context.

use cashmere_core::{Operator, ScalarValue, StructuredCondition, ValueCondition};
use cashmere_sse::{evaluate, MissingValuePolicy, SseConfig};
use proptest::prelude::*;
use std::collections::HashMap;

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::GreaterThan),
        Just(Operator::LessThan),
        Just(Operator::GreaterEqual),
        Just(Operator::LessEqual),
        Just(Operator::Equals),
        Just(Operator::NotEquals),
    ]
}

fn condition() -> impl Strategy<Value = StructuredCondition> {
    (0usize..4, operator(), -10000i64..10000).prop_map(|(artifact_idx, op, value)| {
        StructuredCondition {
            artifact: format!("http://example.org/artifacts/a{artifact_idx}"),
            property_affordance: "http://example.org/sensors#lum".to_string(),
            value_conditions: vec![ValueCondition {
                operator: op,
                value: ScalarValue::Integer(value),
                datatype: None,
            }],
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    /// `Ignore` and `Pass` missing-value policies always produce the
    /// identical `SseResult` (modulo nothing — they're the same result)
    /// for any set of conditions evaluated against an empty context.
    #[test]
    fn ignore_and_pass_are_equivalent_for_any_conditions(
        conditions in prop::collection::vec(condition(), 0..=6),
    ) {
        let empty = HashMap::new();
        let ignore_config = SseConfig { missing_value_policy: MissingValuePolicy::Ignore, ..Default::default() };
        let pass_config = SseConfig { missing_value_policy: MissingValuePolicy::Pass, ..Default::default() };

        let ignore_result = evaluate(&conditions, &empty, &ignore_config);
        let pass_result = evaluate(&conditions, &empty, &pass_config);

        prop_assert_eq!(ignore_result.sse_pass, pass_result.sse_pass);
        prop_assert_eq!(ignore_result.violations.len(), pass_result.violations.len());
        prop_assert_eq!(ignore_result.missing_properties, pass_result.missing_properties);
    }

    /// An empty condition set trivially passes no matter what the
    /// context features or policy are.
    #[test]
    fn no_conditions_always_pass(
        policy in prop_oneof![
            Just(MissingValuePolicy::Fail),
            Just(MissingValuePolicy::Ignore),
            Just(MissingValuePolicy::Pass),
        ],
        lum in -10000i64..10000,
    ) {
        let mut features = HashMap::new();
        features.insert(
            ("http://example.org/artifacts/a0".to_string(), "http://example.org/sensors#lum".to_string()),
            ScalarValue::Integer(lum),
        );
        let config = SseConfig { missing_value_policy: policy, ..Default::default() };
        let result = evaluate(&[], &features, &config);
        prop_assert!(result.sse_pass);
        prop_assert_eq!(result.conditions_checked, 0);
    }

    /// When the context feature is present, `Fail` and `Pass`/`Ignore`
    /// agree exactly with the operator's own evaluation: the SSE is never
    /// the source of a different verdict than `Operator::evaluate`.
    #[test]
    fn present_value_outcome_matches_operator_semantics(
        cond in condition(),
        actual in -10000i64..10000,
    ) {
        let mut features = HashMap::new();
        features.insert(
            (cond.artifact.clone(), cond.property_affordance.clone()),
            ScalarValue::Integer(actual),
        );
        let result = evaluate(&[cond.clone()], &features, &SseConfig::default());
        let expected_pass = cond.value_conditions[0]
            .operator
            .evaluate(actual as f64, cond.value_conditions[0].value.as_f64().unwrap());
        prop_assert_eq!(result.sse_pass, expected_pass);
    }
}
