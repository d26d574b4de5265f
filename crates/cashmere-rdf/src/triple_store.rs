use anyhow::{anyhow, Result};
use sophia::api::prelude::*;
use std::collections::HashMap;

use crate::term::{parse_node_term_display, parse_term_display, RdfTerm};

/// Subject-indexed in-memory triple store, used both by the signifier
/// RDF parser and the SHACL shape-graph walker. Parsing always goes
/// through Turtle (the only serialization signifier authoring or SHACL
/// shape text uses in this workspace).
#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    by_subject: HashMap<String, Vec<(String, RdfTerm)>>,
    subjects_order: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SinkError(String);

impl From<anyhow::Error> for SinkError {
    fn from(e: anyhow::Error) -> Self {
        SinkError(e.to_string())
    }
}

impl TripleStore {
    pub fn parse_turtle(text: &str) -> Result<Self> {
        let mut store = TripleStore::default();
        let reader = std::io::BufReader::new(std::io::Cursor::new(text.as_bytes()));
        let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
        parser
            .try_for_each_triple(|t| -> std::result::Result<(), SinkError> {
                let subject = parse_node_term_display(&t.s().to_string())?;
                let predicate = parse_node_term_display(&t.p().to_string())?;
                let object = parse_term_display(&t.o().to_string())?;
                let predicate_iri = predicate
                    .as_iri()
                    .ok_or_else(|| SinkError("predicate must be an IRI".to_string()))?
                    .to_string();
                store.insert(subject_key(&subject), predicate_iri, object);
                Ok(())
            })
            .map_err(|e| anyhow!("failed to parse Turtle: {e}"))?;
        Ok(store)
    }

    /// Builds an empty store, for callers constructing a graph
    /// programmatically rather than by parsing Turtle (e.g. the context
    /// builder).
    pub fn new() -> Self {
        TripleStore::default()
    }

    /// Adds a single triple. Public so graphs can be built
    /// programmatically (not just by parsing Turtle).
    pub fn add(&mut self, subject_key: String, predicate_iri: String, object: RdfTerm) {
        self.insert(subject_key, predicate_iri, object)
    }

    fn insert(&mut self, subject_key: String, predicate_iri: String, object: RdfTerm) {
        if !self.by_subject.contains_key(&subject_key) {
            self.subjects_order.push(subject_key.clone());
        }
        self.by_subject
            .entry(subject_key)
            .or_default()
            .push((predicate_iri, object));
    }

    /// All objects of `predicate` for `subject`, in insertion order.
    pub fn objects(&self, subject: &str, predicate: &str) -> Vec<&RdfTerm> {
        self.by_subject
            .get(subject)
            .map(|props| {
                props
                    .iter()
                    .filter(|(p, _)| p == predicate)
                    .map(|(_, o)| o)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First object of `predicate` for `subject`, if any.
    pub fn value<'a>(&'a self, subject: &str, predicate: &str) -> Option<&'a RdfTerm> {
        self.objects(subject, predicate).into_iter().next()
    }

    pub fn has_predicate(&self, subject: &str, predicate: &str) -> bool {
        !self.objects(subject, predicate).is_empty()
    }

    /// All triples `(subject, predicate, object_iri_or_bnode)` where
    /// `object` equals the given term (used for `?s rdf:type sh:NodeShape`
    /// style lookups).
    pub fn subjects_with(&self, predicate: &str, object: &RdfTerm) -> Vec<String> {
        self.subjects_order
            .iter()
            .filter(|s| {
                self.by_subject
                    .get(s.as_str())
                    .map(|props| props.iter().any(|(p, o)| p == predicate && o == object))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn all_predicates(&self, subject: &str) -> Vec<&(String, RdfTerm)> {
        self.by_subject
            .get(subject)
            .map(|v| v.iter().collect())
            .unwrap_or_default()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects_order.iter().map(|s| s.as_str())
    }

    /// All triples as owned `(subject, predicate, object)` tuples, used
    /// for exporting/hashing the whole graph.
    pub fn all_triples(&self) -> Vec<(String, String, RdfTerm)> {
        let mut out = Vec::new();
        for subject in &self.subjects_order {
            if let Some(props) = self.by_subject.get(subject) {
                for (p, o) in props {
                    out.push((subject.clone(), p.clone(), o.clone()));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty()
    }
}

/// The subject key a term maps to: `<iri>` form for IRIs, `_:id` for
/// blank nodes.
pub fn subject_key(term: &RdfTerm) -> String {
    match term {
        RdfTerm::Iri(iri) => iri.clone(),
        RdfTerm::BlankNode(id) => format!("_:{id}"),
        RdfTerm::Literal { .. } => unreachable!("subjects are never literals"),
    }
}
