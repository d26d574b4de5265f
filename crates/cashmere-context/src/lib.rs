//! Context Builder: normalizes a context snapshot (nested map, flat map,
//! or an already-built RDF graph) into a `(graph, features)` pair
//! consumed by the Shape Validator and the Structured Subsumption
//! Engine.

use cashmere_core::{CashmereError, ContextFeatures, ScalarValue};
use cashmere_rdf::{RdfTerm, TripleStore};
use std::collections::HashMap;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// The accepted shapes of a raw context snapshot.
pub enum ContextInput {
    /// `{artifact_uri: {property_uri: value}}`
    Nested(serde_json::Map<String, serde_json::Value>),
    /// `{"artifact_uri::property_uri": value}`
    Flat(serde_json::Map<String, serde_json::Value>),
    /// Already-built RDF graph; features are extracted by a direct
    /// triple scan instead of being computed during construction.
    Graph(TripleStore),
}

impl ContextInput {
    /// Dispatches a generic JSON object the way the reference
    /// implementation does: any key containing `"::"` means this is the
    /// flat form, otherwise it is the nested form.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        if map.keys().any(|k| k.contains("::")) {
            ContextInput::Flat(map)
        } else {
            ContextInput::Nested(map)
        }
    }
}

/// Normalizes any supported context input into `(graph, features)`.
pub fn normalize_context(
    input: ContextInput,
) -> Result<(TripleStore, ContextFeatures), CashmereError> {
    match input {
        ContextInput::Graph(store) => {
            let features = extract_features_from_graph(&store);
            Ok((store, features))
        }
        ContextInput::Nested(nested) => build_from_kv(&nested),
        ContextInput::Flat(flat) => build_from_flat_dict(&flat),
    }
}

/// Builds an RDF graph and feature map from a nested
/// `{artifact: {property: value}}` map.
pub fn build_from_kv(
    context_features: &serde_json::Map<String, serde_json::Value>,
) -> Result<(TripleStore, ContextFeatures), CashmereError> {
    let mut graph = TripleStore::new();
    let mut extracted: ContextFeatures = HashMap::new();

    for (artifact_uri, properties) in context_features {
        let Some(properties) = properties.as_object() else {
            tracing::warn!(artifact_uri, "skipping non-object properties");
            continue;
        };

        for (property_uri, value) in properties {
            let scalar: ScalarValue = value.clone().into();
            let literal = RdfTerm::Literal {
                lexical: scalar.to_string(),
                datatype: Some(scalar.xsd_datatype().to_string()),
                language: None,
            };
            graph.add(artifact_uri.clone(), property_uri.clone(), literal);
            extracted.insert((artifact_uri.clone(), property_uri.clone()), scalar);
        }
    }

    tracing::info!(
        triples = extracted.len(),
        "built context graph from nested map"
    );
    Ok((graph, extracted))
}

/// Builds an RDF graph and feature map from a flat
/// `"artifact::property" -> value` map.
pub fn build_from_flat_dict(
    context_snapshot: &serde_json::Map<String, serde_json::Value>,
) -> Result<(TripleStore, ContextFeatures), CashmereError> {
    let mut nested: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();

    for (key, value) in context_snapshot {
        let Some((artifact_uri, property_uri)) = key.split_once("::") else {
            tracing::warn!(key, "skipping key without '::' separator");
            continue;
        };

        let entry = nested
            .entry(artifact_uri.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(obj) = entry {
            obj.insert(property_uri.to_string(), value.clone());
        }
    }

    build_from_kv(&nested)
}

/// Extracts `(artifact, property) -> value` features from an
/// already-built graph by scanning every `(subject, predicate, literal)`
/// triple.
pub fn extract_features_from_graph(store: &TripleStore) -> ContextFeatures {
    let mut features = HashMap::new();
    for (subject, predicate, object) in store.all_triples() {
        if let RdfTerm::Literal { lexical, datatype, .. } = &object {
            let value = literal_to_scalar(lexical, datatype.as_deref());
            features.insert((subject, predicate), value);
        }
    }
    features
}

fn literal_to_scalar(lexical: &str, datatype: Option<&str>) -> ScalarValue {
    match datatype {
        Some(dt) if dt.ends_with("boolean") => lexical
            .parse::<bool>()
            .map(ScalarValue::Bool)
            .unwrap_or_else(|_| ScalarValue::String(lexical.to_string())),
        Some(dt) if dt.ends_with("integer") || dt.ends_with("int") => lexical
            .parse::<i64>()
            .map(ScalarValue::Integer)
            .unwrap_or_else(|_| ScalarValue::String(lexical.to_string())),
        Some(dt) if dt.ends_with("double") || dt.ends_with("float") || dt.ends_with("decimal") => {
            lexical
                .parse::<f64>()
                .map(ScalarValue::Float)
                .unwrap_or_else(|_| ScalarValue::String(lexical.to_string()))
        }
        _ => ScalarValue::String(lexical.to_string()),
    }
}

/// Appends `rdf:type` triples for each `(artifact_uri -> type_uri)` pair,
/// enabling shape targeting by class.
pub fn add_type_information(graph: &mut TripleStore, artifact_types: &HashMap<String, String>) {
    for (artifact_uri, type_uri) in artifact_types {
        graph.add(
            artifact_uri.clone(),
            RDF_TYPE.to_string(),
            RdfTerm::Iri(type_uri.clone()),
        );
    }
    tracing::debug!(count = artifact_types.len(), "added type information");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_from_nested_map() {
        let nested = json!({
            "http://example.org/artifacts/sensor1": {
                "http://example.org/LightSensor#hasLuminosityLevel": 15000
            }
        });
        let (graph, features) =
            normalize_context(ContextInput::from_json_map(nested.as_object().unwrap().clone()))
                .unwrap();
        assert!(!graph.is_empty());
        let value = features
            .get(&(
                "http://example.org/artifacts/sensor1".to_string(),
                "http://example.org/LightSensor#hasLuminosityLevel".to_string(),
            ))
            .unwrap();
        assert_eq!(*value, ScalarValue::Integer(15000));
    }

    #[test]
    fn builds_from_flat_map() {
        let flat = json!({
            "http://example.org/artifacts/sensor1::http://example.org/LightSensor#hasLuminosityLevel": 15000
        });
        let (_, features) =
            normalize_context(ContextInput::from_json_map(flat.as_object().unwrap().clone()))
                .unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn skips_keys_without_separator_in_flat_form() {
        let flat = json!({ "no-separator": 1, "a::b": 2 });
        let (_, features) =
            normalize_context(ContextInput::from_json_map(flat.as_object().unwrap().clone()))
                .unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn add_type_information_appends_rdf_type_triple() {
        let mut graph = TripleStore::new();
        let mut types = HashMap::new();
        types.insert(
            "http://example.org/artifacts/sensor1".to_string(),
            "http://example.org/LightSensor".to_string(),
        );
        add_type_information(&mut graph, &types);
        let objects = graph.objects("http://example.org/artifacts/sensor1", RDF_TYPE);
        assert_eq!(objects.len(), 1);
    }
}
