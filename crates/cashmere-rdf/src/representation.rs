use cashmere_core::{
    CashmereError, IntentContext, IntentionDescription, Operator, Provenance, ScalarValue,
    Signifier, SignifierStatus, StructuredCondition, ValueCondition,
};
use chrono::Utc;
use regex::{Captures, Regex};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::term::RdfTerm;
use crate::triple_store::{subject_key, TripleStore};

pub const CASHMERE_NS: &str = "https://aimas.cs.pub.ro/ont/cashmere#";
pub const SH_NS: &str = "http://www.w3.org/ns/shacl#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

fn pred(local: &str) -> String {
    format!("{CASHMERE_NS}{local}")
}

/// Default prefixes injected into authored signifier RDF that does not
/// already declare them. `hmas` intentionally resolves to the same
/// namespace as `cashmere` — both vocabularies describe the same
/// affordance concepts and authors may use either spelling.
const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("cashmere", CASHMERE_NS),
    ("hmas", CASHMERE_NS),
    ("sh", SH_NS),
    ("xsd", XSD_NS),
    ("rdf", RDF_NS),
];

fn structured_description_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)cashmere:hasStructuredDescription\s+"(.*?)"(?:\^\^xsd:string)?"#)
            .expect("static pattern is valid")
    })
}

fn embedded_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<(http[^>]+)>").expect("static pattern is valid"))
}

/// Rewrites a single-double-quoted `cashmere:hasStructuredDescription`
/// value into a triple-quoted, explicitly `xsd:string`-typed literal,
/// single-quoting any bare `<…>` URI found inside it. Authors sometimes
/// write a structured-description value that spans multiple lines or
/// embeds a raw URI; neither parses as a legal single-quoted Turtle
/// string, so this normalizes both before the document reaches the
/// Turtle parser.
fn rewrite_structured_description_uris(text: &str) -> String {
    structured_description_pattern()
        .replace_all(text, |caps: &Captures| {
            let content = caps[1].trim();
            let content_fixed = embedded_uri_pattern().replace_all(content, "'$1'");
            format!(r#"cashmere:hasStructuredDescription """{content_fixed}"""^^xsd:string"#)
        })
        .into_owned()
}

/// Strips full-line `//` comments (a line whose trimmed content starts
/// with `//`), rewrites `cashmere:hasStructuredDescription` values that
/// embed bare URIs or span multiple lines, and injects any default
/// prefix not already declared. Authoring RDF is allowed to omit
/// boilerplate `@prefix` lines for the vocabularies this system
/// understands.
pub fn preprocess_rdf(raw: &str) -> String {
    let without_comments: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n");

    let rewritten = rewrite_structured_description_uris(&without_comments);

    let mut out = String::new();
    for (prefix, uri) in DEFAULT_PREFIXES {
        let declared = rewritten.contains(&format!("@prefix {prefix}:"));
        if !declared {
            out.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
        }
    }
    out.push_str(&rewritten);
    out
}

/// Parses a preprocessed, authored RDF signifier document into a
/// `Signifier`. Required predicates per the RDF signifier authoring
/// contract: `cashmere:Signifier` typing, `cashmere:signifies`,
/// `cashmere:hasIntentionDescription` -> node with
/// `cashmere:hasStructuredDescription`, optional
/// `cashmere:recommendsContext` -> node with optional
/// `cashmere:hasStructuredDescription` and `cashmere:hasShaclCondition`
/// pointers into `sh:NodeShape` nodes.
pub fn parse_signifier(raw: &str) -> Result<Signifier, CashmereError> {
    // Text that already declares its prefixes is treated as already
    // well-formed Turtle (this is always true of our own `generate_rdf`
    // output) and skips preprocessing entirely, so the structured-
    // description rewrite never runs against an already-triple-quoted
    // literal it would otherwise mangle.
    let preprocessed = if raw.contains("@prefix") {
        raw.to_string()
    } else {
        preprocess_rdf(raw)
    };
    let store = TripleStore::parse_turtle(&preprocessed)
        .map_err(|e| CashmereError::InvalidRdf(e.to_string()))?;

    let signifier_type = RdfTerm::Iri(pred("Signifier"));
    let mut signifier_subjects = store.subjects_with(RDF_TYPE, &signifier_type);
    if signifier_subjects.is_empty() {
        return Err(CashmereError::InvalidRdf(
            "no cashmere:Signifier node found".to_string(),
        ));
    }
    let signifier_subject = signifier_subjects.remove(0);

    let signifier_id = signifier_subject
        .rsplit('#')
        .next()
        .unwrap_or(&signifier_subject)
        .to_string();
    if signifier_id.is_empty() {
        return Err(CashmereError::InvalidRdf(
            "could not derive signifier_id from subject IRI".to_string(),
        ));
    }

    let affordance_uri = store
        .value(&signifier_subject, &pred("signifies"))
        .and_then(|t| t.as_iri())
        .ok_or_else(|| {
            CashmereError::InvalidRdf("missing cashmere:signifies".to_string())
        })?
        .to_string();

    let intent_node = store
        .value(&signifier_subject, &pred("hasIntentionDescription"))
        .ok_or_else(|| {
            CashmereError::InvalidRdf("missing cashmere:hasIntentionDescription".to_string())
        })?;
    let intent_key = subject_key(intent_node);
    let intent_json_text = store
        .value(&intent_key, &pred("hasStructuredDescription"))
        .and_then(|t| t.lexical())
        .ok_or_else(|| {
            CashmereError::InvalidRdf(
                "intent node missing cashmere:hasStructuredDescription".to_string(),
            )
        })?;
    let intent_json: serde_json::Value = serde_json::from_str(intent_json_text)
        .map_err(|e| CashmereError::InvalidRdf(format!("invalid intent JSON: {e}")))?;
    let nl_text = intent_json
        .get("intent")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let structured = intent_json.as_object().cloned();

    let context = match store.value(&signifier_subject, &pred("recommendsContext")) {
        Some(context_node) => {
            let context_key = subject_key(context_node);
            let structured_conditions = match store
                .value(&context_key, &pred("hasStructuredDescription"))
                .and_then(|t| t.lexical())
            {
                Some(text) => {
                    let parsed: serde_json::Value = serde_json::from_str(text).map_err(|e| {
                        CashmereError::InvalidRdf(format!("invalid context JSON: {e}"))
                    })?;
                    parse_conditions(&parsed)?
                }
                None => Vec::new(),
            };

            let shape_pointers = store.objects(&context_key, &pred("hasShaclCondition"));
            let shacl_shapes = if shape_pointers.is_empty() {
                None
            } else {
                Some(render_shape_subgraph(&store, &shape_pointers))
            };

            IntentContext {
                structured_conditions,
                shacl_shapes,
                nl_description: None,
            }
        }
        None => IntentContext::default(),
    };

    let signifier = Signifier {
        signifier_id,
        version: 1,
        status: SignifierStatus::Active,
        intent: IntentionDescription { nl_text, structured },
        context,
        affordance_uri,
        provenance: Provenance {
            created_at: Utc::now(),
            created_by: "system".to_string(),
            source: "rdf_import".to_string(),
        },
        indexes: serde_json::Map::new(),
    };
    signifier.validate()?;
    Ok(signifier)
}

fn parse_conditions(
    parsed: &serde_json::Value,
) -> Result<Vec<StructuredCondition>, CashmereError> {
    let conditions = match parsed.get("conditions").and_then(|v| v.as_array()) {
        Some(arr) => arr,
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::with_capacity(conditions.len());
    for c in conditions {
        let artifact = c
            .get("artifact")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CashmereError::InvalidRdf("condition missing artifact".to_string()))?
            .to_string();
        let property_affordance = c
            .get("property_affordance")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CashmereError::InvalidRdf("condition missing property_affordance".to_string())
            })?
            .to_string();
        let value_conditions = match c.get("value_conditions").and_then(|v| v.as_array()) {
            Some(vcs) => {
                let mut parsed_vcs = Vec::with_capacity(vcs.len());
                for vc in vcs {
                    let operator_str = vc
                        .get("operator")
                        .and_then(|v| v.as_str())
                        .ok_or_else(|| {
                            CashmereError::InvalidRdf("value_condition missing operator".to_string())
                        })?;
                    let operator = Operator::from_str(operator_str)?;
                    let value: ScalarValue = vc
                        .get("value")
                        .cloned()
                        .ok_or_else(|| {
                            CashmereError::InvalidRdf("value_condition missing value".to_string())
                        })?
                        .into();
                    let datatype = vc
                        .get("datatype")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    parsed_vcs.push(ValueCondition {
                        operator,
                        value,
                        datatype,
                    });
                }
                parsed_vcs
            }
            None => Vec::new(),
        };
        out.push(StructuredCondition {
            artifact,
            property_affordance,
            value_conditions,
        });
    }
    Ok(out)
}

/// Re-renders a `sh:NodeShape` node and its `sh:property` sub-shapes as a
/// standalone Turtle-ish triple text, the form stored as
/// `IntentContext::shacl_shapes`.
fn render_shape_subgraph(store: &TripleStore, shape_nodes: &[&RdfTerm]) -> String {
    let mut lines = Vec::new();
    for shape in shape_nodes {
        let Some(iri) = shape.as_iri() else { continue };
        render_subject_triples(store, iri, &mut lines);
        for prop_shape in store.objects(iri, &format!("{SH_NS}property")) {
            if let Some(prop_iri) = prop_shape.as_iri() {
                render_subject_triples(store, prop_iri, &mut lines);
            }
        }
    }
    lines.join("\n")
}

fn render_subject_triples(store: &TripleStore, subject: &str, lines: &mut Vec<String>) {
    for (predicate, object) in store.all_predicates(subject) {
        lines.push(format!(
            "<{subject}> <{predicate}> {} .",
            object.to_nt()
        ));
    }
}

/// Generates an authored-style RDF Turtle document for a signifier,
/// following the node-URI scheme `{base_uri}#{id}` /
/// `{base_uri}#{id}-intent` / `{base_uri}#{id}-context`.
pub fn generate_rdf(signifier: &Signifier, base_uri: Option<&str>) -> Result<String, CashmereError> {
    let base = base_uri.unwrap_or("http://example.org/signifiers");
    let signifier_uri = format!("{base}#{}", signifier.signifier_id);
    let intent_uri = format!("{base}#{}-intent", signifier.signifier_id);
    let context_uri = format!("{base}#{}-context", signifier.signifier_id);

    let mut out = String::new();
    for (prefix, uri) in DEFAULT_PREFIXES {
        out.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "<{signifier_uri}> a cashmere:Signifier ;\n    cashmere:signifies <{}> ;\n    cashmere:hasIntentionDescription <{intent_uri}> ;\n    cashmere:recommendsContext <{context_uri}> .\n\n",
        signifier.affordance_uri
    ));

    let intent_json = intent_to_json(&signifier.intent);
    out.push_str(&format!(
        "<{intent_uri}> cashmere:hasStructuredDescription \"\"\"{}\"\"\" .\n\n",
        intent_json
    ));

    let conditions_json = conditions_to_json(&signifier.context.structured_conditions);
    out.push_str(&format!(
        "<{context_uri}> cashmere:hasStructuredDescription \"\"\"{}\"\"\" .\n",
        conditions_json
    ));

    if let Some(shapes) = &signifier.context.shacl_shapes {
        if !shapes.trim().is_empty() {
            let shapes_store = TripleStore::parse_turtle(&ensure_shape_prefixes(shapes))
                .map_err(|e| CashmereError::InvalidShapes(e.to_string()))?;
            let node_shape_type = RdfTerm::Iri(format!("{SH_NS}NodeShape"));
            for node_shape in shapes_store.subjects_with(RDF_TYPE, &node_shape_type) {
                out.push_str(&format!(
                    "<{context_uri}> cashmere:hasShaclCondition <{node_shape}> .\n"
                ));
            }
            out.push('\n');
            out.push_str(shapes);
            out.push('\n');
        }
    }

    Ok(out)
}

fn ensure_shape_prefixes(shapes: &str) -> String {
    let mut out = String::new();
    for (prefix, uri) in DEFAULT_PREFIXES {
        if !shapes.contains(&format!("@prefix {prefix}:")) {
            out.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
        }
    }
    out.push_str(shapes);
    out
}

fn intent_to_json(intent: &IntentionDescription) -> String {
    let mut obj = intent.structured.clone().unwrap_or_default();
    obj.insert(
        "intent".to_string(),
        serde_json::Value::String(intent.nl_text.clone()),
    );
    serde_json::to_string(&obj).unwrap_or_default()
}

fn conditions_to_json(conditions: &[StructuredCondition]) -> String {
    let value = serde_json::json!({ "conditions": conditions });
    serde_json::to_string(&value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNIFIER_TTL: &str = r#"
<http://example.org/signifiers#raise-blinds-signifier> a cashmere:Signifier ;
    cashmere:signifies <http://example.org/affordances#RaiseBlinds> ;
    cashmere:hasIntentionDescription <http://example.org/signifiers#raise-blinds-signifier-intent> ;
    cashmere:recommendsContext <http://example.org/signifiers#raise-blinds-signifier-context> .

<http://example.org/signifiers#raise-blinds-signifier-intent>
    cashmere:hasStructuredDescription "{\"intent\": \"raise the blinds to let more light in\"}" .

<http://example.org/signifiers#raise-blinds-signifier-context>
    cashmere:hasStructuredDescription "{\"conditions\": [{\"artifact\": \"http://example.org/artifacts/sensor1\", \"property_affordance\": \"http://example.org/LightSensor#hasLuminosityLevel\", \"value_conditions\": [{\"operator\": \"lessThan\", \"value\": 10000}]}]}" .
"#;

    #[test]
    fn parses_minimal_signifier() {
        let s = parse_signifier(SIGNIFIER_TTL).unwrap();
        assert_eq!(s.signifier_id, "raise-blinds-signifier");
        assert_eq!(
            s.affordance_uri,
            "http://example.org/affordances#RaiseBlinds"
        );
        assert_eq!(
            s.intent.nl_text,
            "raise the blinds to let more light in"
        );
        assert_eq!(s.context.structured_conditions.len(), 1);
        assert_eq!(
            s.context.structured_conditions[0].artifact,
            "http://example.org/artifacts/sensor1"
        );
    }

    #[test]
    fn strips_full_line_comments_without_touching_uris() {
        let raw = "// a comment\n@prefix ex: <http://example.org/> .\nex:a ex:b \"c\" .\n";
        let processed = preprocess_rdf(raw);
        assert!(!processed.contains("a comment"));
        assert!(processed.contains("http://example.org/"));
    }

    #[test]
    fn rewrites_embedded_uri_in_structured_description() {
        let raw = r#"<http://example.org/signifiers#s-context> cashmere:hasStructuredDescription "see <http://example.org/artifacts/sensor1> for details" ."#;
        let processed = preprocess_rdf(raw);
        assert!(processed.contains(r#"cashmere:hasStructuredDescription """see 'http://example.org/artifacts/sensor1' for details"""^^xsd:string"#));
        assert!(!processed.contains("<http://example.org/artifacts/sensor1>"));
    }

    #[test]
    fn injects_missing_default_prefixes() {
        let processed = preprocess_rdf("ex:a ex:b \"c\" .");
        assert!(processed.contains("@prefix cashmere:"));
        assert!(processed.contains("@prefix sh:"));
    }

    #[test]
    fn generate_then_parse_round_trips_core_fields() {
        let original = parse_signifier(SIGNIFIER_TTL).unwrap();
        let generated = generate_rdf(&original, None).unwrap();
        let reparsed = parse_signifier(&generated).unwrap();
        assert_eq!(reparsed.signifier_id, original.signifier_id);
        assert_eq!(reparsed.affordance_uri, original.affordance_uri);
        assert_eq!(reparsed.intent.nl_text, original.intent.nl_text);
        assert_eq!(
            reparsed.context.structured_conditions,
            original.context.structured_conditions
        );
    }
}
