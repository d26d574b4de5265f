//! Concrete end-to-end retrieval scenarios: three signifiers sharing a
//! luminosity/occupancy context, exercised through the full pipeline.

use cashmere_core::{
    IntentContext, IntentionDescription, Provenance, Signifier, SignifierStatus,
};
use cashmere_matching::MatcherRegistry;
use cashmere_orchestrator::{Orchestrator, RetrievalRequest};
use cashmere_registry::SignifierRegistry;
use cashmere_shacl::{ShaclValidator, ValidationOptions};

const LUM: &str = "http://example.org/artifacts/lum308";
const LUM_PROP: &str = "http://example.org/sensors#luminosity";
const OCC: &str = "http://example.org/artifacts/occupancy";
const OCC_PROP: &str = "http://example.org/sensors#occupancy";

fn shape(target: &str, path: &str, constraint: &str) -> String {
    format!(
        r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
ex:Shape a sh:NodeShape ;
    sh:targetNode <{target}> ;
    sh:property [
        sh:path <{path}> ;
        {constraint}
    ] .
"#
    )
    .replace("ex:Shape", "<http://example.org/shapes#shape>")
}

fn signifier(id: &str, nl_text: &str, shapes_text: Option<String>) -> Signifier {
    Signifier {
        signifier_id: id.to_string(),
        version: 1,
        status: SignifierStatus::Active,
        intent: IntentionDescription {
            nl_text: nl_text.to_string(),
            structured: None,
        },
        context: IntentContext {
            structured_conditions: vec![],
            shacl_shapes: shapes_text,
            nl_description: None,
        },
        affordance_uri: format!("http://example.org/affordances#{id}"),
        provenance: Provenance {
            created_at: chrono::Utc::now(),
            created_by: "tester".to_string(),
            source: "manual".to_string(),
        },
        indexes: serde_json::Map::new(),
    }
}

fn setup_registry() -> SignifierRegistry {
    let registry = SignifierRegistry::in_memory();

    registry
        .create(
            signifier(
                "raise-blinds-signifier",
                "increase luminosity by raising the blinds",
                Some(shape(LUM, LUM_PROP, "sh:minInclusive 10000")),
            ),
            None,
        )
        .unwrap();

    registry
        .create(
            signifier(
                "turn-light-on-signifier",
                "make it bright by turning the light on",
                Some(format!(
                    "{}{}",
                    shape(LUM, LUM_PROP, "sh:maxExclusive 5000"),
                    shape(OCC, OCC_PROP, "sh:minInclusive 1")
                )),
            ),
            None,
        )
        .unwrap();

    registry
        .create(
            signifier(
                "lower-blinds-signifier",
                "reduce luminosity by lowering the blinds",
                Some(shape(LUM, LUM_PROP, "sh:minExclusive 20000")),
            ),
            None,
        )
        .unwrap();

    registry
}

fn orchestrator_pieces() -> (SignifierRegistry, MatcherRegistry, ShaclValidator) {
    (
        setup_registry(),
        MatcherRegistry::with_defaults("unavailable-model"),
        ShaclValidator::new(ValidationOptions::default()),
    )
}

fn context(lum: i64, occupancy: Option<i64>) -> serde_json::Map<String, serde_json::Value> {
    let mut obj = serde_json::json!({
        LUM: { LUM_PROP: lum }
    });
    if let Some(occ) = occupancy {
        obj.as_object_mut().unwrap().insert(
            OCC.to_string(),
            serde_json::json!({ OCC_PROP: occ }),
        );
    }
    obj.as_object().unwrap().clone()
}

#[test]
fn scenario_1_bright_room_ranks_raise_blinds_first() {
    let (registry, matchers, shacl) = orchestrator_pieces();
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    let mut request = RetrievalRequest::new("increase luminosity");
    request.context_input = context(15000, None);
    let response = orchestrator.retrieve(&request).unwrap();

    let raise = response
        .results
        .iter()
        .find(|r| r.signifier_id == "raise-blinds-signifier")
        .expect("raise-blinds-signifier present");
    assert!(raise.passed_gates);

    let turn_light = response
        .results
        .iter()
        .find(|r| r.signifier_id == "turn-light-on-signifier")
        .unwrap();
    assert!(!turn_light.passed_gates, "luminosity 15000 is not < 5000");

    let lower = response
        .results
        .iter()
        .find(|r| r.signifier_id == "lower-blinds-signifier")
        .unwrap();
    assert!(!lower.passed_gates, "luminosity 15000 is not > 20000");
}

#[test]
fn scenario_2_dark_room_with_people_ranks_turn_light_on_first() {
    let (registry, matchers, shacl) = orchestrator_pieces();
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    let mut request = RetrievalRequest::new("make it bright");
    request.context_input = context(3000, Some(3));
    let response = orchestrator.retrieve(&request).unwrap();

    let turn_light = response
        .results
        .iter()
        .find(|r| r.signifier_id == "turn-light-on-signifier")
        .unwrap();
    assert!(turn_light.passed_gates);

    let raise = response
        .results
        .iter()
        .find(|r| r.signifier_id == "raise-blinds-signifier")
        .unwrap();
    assert!(!raise.passed_gates, "luminosity 3000 is not >= 10000");
}

#[test]
fn scenario_3_edge_threshold_boundary_conforms() {
    let (registry, matchers, shacl) = orchestrator_pieces();
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    let mut request = RetrievalRequest::new("raise blinds");
    request.context_input = context(10000, None);
    let response = orchestrator.retrieve(&request).unwrap();

    let raise = response
        .results
        .iter()
        .find(|r| r.signifier_id == "raise-blinds-signifier")
        .unwrap();
    assert!(raise.passed_gates, "10000 satisfies minInclusive 10000");
}

#[test]
fn scenario_4_no_match_query_returns_empty_with_nonzero_latency() {
    let (registry, matchers, shacl) = orchestrator_pieces();
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    let mut request = RetrievalRequest::new("brew coffee");
    request.context_input = context(15000, None);
    let response = orchestrator.retrieve(&request).unwrap();

    assert!(response.results.is_empty());
    // total_latency_ms is wall-clock; it may legitimately round to 0 on
    // a fast machine, so we only assert the pipeline actually ran.
    assert_eq!(response.module_results.len(), 4);
}

#[test]
fn scenario_5_tie_break_by_specificity() {
    let registry = SignifierRegistry::in_memory();
    registry
        .create(
            signifier(
                "plain-signifier",
                "turn on the device",
                Some(shape(LUM, LUM_PROP, "sh:minInclusive 0")),
            ),
            None,
        )
        .unwrap();
    registry
        .create(
            signifier(
                "specific-signifier",
                "turn on the device",
                Some(format!(
                    "{}{}",
                    shape(LUM, LUM_PROP, "sh:minInclusive 0"),
                    shape(OCC, OCC_PROP, "sh:minInclusive 0")
                )),
            ),
            None,
        )
        .unwrap();

    let matchers = MatcherRegistry::with_defaults("unavailable-model");
    let shacl = ShaclValidator::new(ValidationOptions::default());
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    // Identical intent text for both signifiers neutralizes the IM
    // signal (a partial match, so the weighted base score stays below
    // 1.0 and leaves room for the boost to matter); both shapes conform
    // against this context (every `minInclusive 0` constraint is
    // vacuously or actually satisfied). The only remaining difference
    // is that `specific-signifier` has two `sh:property` sub-shapes to
    // `plain-signifier`'s one, so the 0.01 specificity boost must be
    // what ranks it first.
    let mut request = RetrievalRequest::new("turn on the device right now");
    request.context_input = context(15000, Some(1));
    let response = orchestrator.retrieve(&request).unwrap();

    let plain = response
        .results
        .iter()
        .find(|r| r.signifier_id == "plain-signifier")
        .unwrap();
    let specific = response
        .results
        .iter()
        .find(|r| r.signifier_id == "specific-signifier")
        .unwrap();

    assert!(plain.passed_gates);
    assert!(specific.passed_gates);
    assert!(
        specific.final_score > plain.final_score,
        "more-constrained shape should rank first on tie: specific={} plain={}",
        specific.final_score,
        plain.final_score
    );
    assert_eq!(response.results[0].signifier_id, "specific-signifier");
}

#[test]
fn scenario_6_gate_forced_zero_reports_fail_hard_gate_explanation() {
    let (registry, matchers, shacl) = orchestrator_pieces();
    let orchestrator = Orchestrator::new(&registry, &matchers, &shacl);

    // Luminosity far below raise-blinds' minInclusive 10000, but intent
    // text still matches strongly.
    let mut request = RetrievalRequest::new("increase luminosity by raising the blinds");
    request.context_input = context(100, None);
    let response = orchestrator.retrieve(&request).unwrap();

    let raise = response
        .results
        .iter()
        .find(|r| r.signifier_id == "raise-blinds-signifier")
        .unwrap();
    assert_eq!(raise.final_score, 0.0);
    assert!(!raise.passed_gates);
    assert!(raise
        .explanation
        .iter()
        .any(|e| e.contains("FAIL (hard gate)")));
}
