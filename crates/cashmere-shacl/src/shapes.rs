use cashmere_core::CashmereError;
use cashmere_rdf::{RdfTerm, TripleStore};

const SH: &str = "http://www.w3.org/ns/shacl#";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyShape {
    pub path: String,
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,
    pub min_inclusive: Option<f64>,
    pub max_inclusive: Option<f64>,
    pub min_exclusive: Option<f64>,
    pub max_exclusive: Option<f64>,
    pub datatype: Option<String>,
    pub class: Option<String>,
    pub pattern: Option<String>,
    pub node_kind: Option<NodeKind>,
    pub in_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeShape {
    pub iri: String,
    pub target_class: Vec<String>,
    pub target_node: Vec<String>,
    pub target_subjects_of: Vec<String>,
    pub properties: Vec<PropertyShape>,
}

#[derive(Debug, Clone, Default)]
pub struct ShapesGraph {
    pub node_shapes: Vec<NodeShape>,
}

impl ShapesGraph {
    pub fn parse(text: &str) -> Result<Self, CashmereError> {
        let store =
            TripleStore::parse_turtle(text).map_err(|e| CashmereError::InvalidShapes(e.to_string()))?;
        Self::from_store(&store)
    }

    pub fn from_store(store: &TripleStore) -> Result<Self, CashmereError> {
        let node_shape_type = RdfTerm::Iri(format!("{SH}NodeShape"));
        let mut node_shapes = Vec::new();

        for iri in store.subjects_with(RDF_TYPE, &node_shape_type) {
            let target_class = store
                .objects(&iri, &format!("{SH}targetClass"))
                .into_iter()
                .filter_map(|t| t.as_iri().map(str::to_string))
                .collect();
            let target_node = store
                .objects(&iri, &format!("{SH}targetNode"))
                .into_iter()
                .filter_map(|t| t.as_iri().map(str::to_string))
                .collect();
            let target_subjects_of = store
                .objects(&iri, &format!("{SH}targetSubjectsOf"))
                .into_iter()
                .filter_map(|t| t.as_iri().map(str::to_string))
                .collect();

            let mut properties = Vec::new();
            for prop_term in store.objects(&iri, &format!("{SH}property")) {
                let prop_key = cashmere_rdf::triple_store::subject_key(prop_term);
                properties.push(parse_property_shape(store, &prop_key)?);
            }

            node_shapes.push(NodeShape {
                iri,
                target_class,
                target_node,
                target_subjects_of,
                properties,
            });
        }

        Ok(ShapesGraph { node_shapes })
    }
}

fn parse_property_shape(store: &TripleStore, subject: &str) -> Result<PropertyShape, CashmereError> {
    let path = store
        .value(subject, &format!("{SH}path"))
        .and_then(|t| t.as_iri())
        .ok_or_else(|| {
            CashmereError::InvalidShapes(format!("property shape {subject} missing sh:path"))
        })?
        .to_string();

    let min_count = numeric_literal(store, subject, "minCount").map(|v| v as u64);
    let max_count = numeric_literal(store, subject, "maxCount").map(|v| v as u64);
    let min_inclusive = numeric_literal(store, subject, "minInclusive");
    let max_inclusive = numeric_literal(store, subject, "maxInclusive");
    let min_exclusive = numeric_literal(store, subject, "minExclusive");
    let max_exclusive = numeric_literal(store, subject, "maxExclusive");

    let datatype = store
        .value(subject, &format!("{SH}datatype"))
        .and_then(|t| t.as_iri())
        .map(str::to_string);
    let class = store
        .value(subject, &format!("{SH}class"))
        .and_then(|t| t.as_iri())
        .map(str::to_string);
    let pattern = store
        .value(subject, &format!("{SH}pattern"))
        .and_then(|t| t.lexical())
        .map(str::to_string);
    let node_kind = store
        .value(subject, &format!("{SH}nodeKind"))
        .and_then(|t| t.as_iri())
        .and_then(|iri| match iri.rsplit('#').next() {
            Some("IRI") => Some(NodeKind::Iri),
            Some("BlankNode") => Some(NodeKind::BlankNode),
            Some("Literal") => Some(NodeKind::Literal),
            _ => None,
        });

    let in_values = store
        .value(subject, &format!("{SH}in"))
        .map(|head| collect_rdf_list(store, head));

    Ok(PropertyShape {
        path,
        min_count,
        max_count,
        min_inclusive,
        max_inclusive,
        min_exclusive,
        max_exclusive,
        datatype,
        class,
        pattern,
        node_kind,
        in_values,
    })
}

fn numeric_literal(store: &TripleStore, subject: &str, local: &str) -> Option<f64> {
    store
        .value(subject, &format!("{SH}{local}"))
        .and_then(|t| t.lexical())
        .and_then(|s| s.parse::<f64>().ok())
}

/// Walks a standard RDF collection (`rdf:first`/`rdf:rest` chain) into
/// a flat list of lexical/IRI string forms, used for `sh:in`.
fn collect_rdf_list(store: &TripleStore, head: &RdfTerm) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = cashmere_rdf::triple_store::subject_key(head);
    loop {
        if current == RDF_NIL {
            break;
        }
        let Some(first) = store.value(&current, RDF_FIRST) else {
            break;
        };
        out.push(term_text(first));
        let Some(rest) = store.value(&current, RDF_REST) else {
            break;
        };
        if rest.as_iri() == Some(RDF_NIL) {
            break;
        }
        current = cashmere_rdf::triple_store::subject_key(rest);
    }
    out
}

fn term_text(term: &RdfTerm) -> String {
    match term {
        RdfTerm::Iri(s) => s.clone(),
        RdfTerm::BlankNode(s) => s.clone(),
        RdfTerm::Literal { lexical, .. } => lexical.clone(),
    }
}

/// Lexical occurrence count of `sh:property` + `sh:class` substrings in
/// the raw shapes text, used by the Ranker's specificity boost.
/// Intentionally syntactic, not a semantic shape-graph property.
pub fn constraint_count(shapes_text: &str) -> usize {
    shapes_text.matches("sh:property").count() + shapes_text.matches("sh:class").count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE_TTL: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://example.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:LightShape a sh:NodeShape ;
    sh:targetClass ex:LightSensor ;
    sh:property [
        sh:path ex:hasLuminosityLevel ;
        sh:minInclusive 10000 ;
        sh:datatype xsd:integer ;
    ] .
"#;

    #[test]
    fn parses_node_shape_and_property_shape() {
        let graph = ShapesGraph::parse(SHAPE_TTL).unwrap();
        assert_eq!(graph.node_shapes.len(), 1);
        let shape = &graph.node_shapes[0];
        assert_eq!(shape.target_class, vec!["http://example.org/LightSensor".to_string()]);
        assert_eq!(shape.properties.len(), 1);
        assert_eq!(shape.properties[0].min_inclusive, Some(10000.0));
    }

    #[test]
    fn constraint_count_counts_lexical_occurrences() {
        assert_eq!(constraint_count(SHAPE_TTL), 1);
    }
}
