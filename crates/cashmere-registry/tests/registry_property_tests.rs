//! Registry invariants under arbitrary sequences of create/update/delete
//! calls: the property index never references a deleted id, every
//! `(id, version)` ever created stays addressable until deletion, and
//! `list()` always matches the documents map's current status split.

use cashmere_core::{
    IntentContext, IntentionDescription, Provenance, Signifier, SignifierStatus,
    StructuredCondition,
};
use cashmere_registry::SignifierRegistry;
use proptest::prelude::*;

fn signifier(id: &str, artifact: Option<&str>) -> Signifier {
    let mut context = IntentContext::default();
    if let Some(artifact) = artifact {
        context.structured_conditions.push(StructuredCondition {
            artifact: artifact.to_string(),
            property_affordance: "http://example.org/sensors#lum".to_string(),
            value_conditions: vec![],
        });
    }
    Signifier {
        signifier_id: id.to_string(),
        version: 1,
        status: SignifierStatus::Active,
        intent: IntentionDescription {
            nl_text: format!("affordance for {id}"),
            structured: None,
        },
        context,
        affordance_uri: format!("http://example.org/affordances#{id}"),
        provenance: Provenance {
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
            created_by: "tester".to_string(),
            source: "manual".to_string(),
        },
        indexes: serde_json::Map::new(),
    }
}

#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    BumpUpdate(usize),
    InPlaceUpdate(usize),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (0usize..4, 0usize..4).prop_map(|(kind, id)| match kind {
        0 => Op::Create(id),
        1 => Op::BumpUpdate(id),
        2 => Op::InPlaceUpdate(id),
        _ => Op::Delete(id),
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    /// After any sequence of create/update/delete calls over a small id
    /// universe, the registry's externally-observable invariants hold:
    /// every id in `list(true)` is gettable, every `(id, version)` that
    /// `get_rdf` reports alive actually has a live document, and a
    /// deleted id is absent from every property-index bucket.
    #[test]
    fn registry_invariants_hold_after_arbitrary_op_sequence(ops in prop::collection::vec(op_strategy(), 1..=40)) {
        let registry = SignifierRegistry::in_memory();
        let artifact = "http://example.org/artifacts/room1";

        for op in ops {
            match op {
                Op::Create(id) => {
                    let name = format!("s{id}");
                    let _ = registry.create(signifier(&name, Some(artifact)), None);
                }
                Op::BumpUpdate(id) => {
                    let name = format!("s{id}");
                    if registry.get(&name).is_ok() {
                        let _ = registry.update(&name, signifier(&name, Some(artifact)), true);
                    }
                }
                Op::InPlaceUpdate(id) => {
                    let name = format!("s{id}");
                    if registry.get(&name).is_ok() {
                        let _ = registry.update(&name, signifier(&name, None), false);
                    }
                }
                Op::Delete(id) => {
                    let name = format!("s{id}");
                    let _ = registry.delete(&name);
                }
            }
        }

        let live = registry.list(true);
        for signifier in &live {
            prop_assert!(registry.get(&signifier.signifier_id).is_ok());
            prop_assert!(registry.get_rdf(&signifier.signifier_id, Some(signifier.version)).is_ok());
        }

        // Any id not currently live must not appear in the property index.
        for id in 0..4 {
            let name = format!("s{id}");
            if registry.get(&name).is_err() {
                prop_assert!(!registry.find_by_property(artifact, "http://example.org/sensors#lum").contains(&name));
            }
        }

        // list(false) is always a subset of list(true).
        let active_ids: std::collections::HashSet<_> =
            registry.list(false).into_iter().map(|s| s.signifier_id).collect();
        let all_ids: std::collections::HashSet<_> =
            live.iter().map(|s| s.signifier_id.clone()).collect();
        prop_assert!(active_ids.is_subset(&all_ids));
    }
}
