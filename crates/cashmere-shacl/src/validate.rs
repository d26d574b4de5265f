use std::collections::{HashMap, HashSet};

use cashmere_rdf::{RdfTerm, TripleStore};
use regex::Regex;
use serde::Serialize;

use crate::shapes::{NodeKind, NodeShape, PropertyShape, ShapesGraph};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Violation,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShaclViolation {
    pub focus_node: String,
    pub path: String,
    pub constraint_component: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    // Clone is required for cache retrieval (ValidationCache::get returns an owned copy).
    pub conforms: bool,
    /// Only `sh:Violation`-severity results. Info/Warning results are
    /// computed internally but excluded here, matching how the
    /// reference validator reports conformance.
    pub violations: Vec<ShaclViolation>,
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    pub infer_rdfs: bool,
}

impl Default for ValidationOptions {
    /// RDFS inference runs unconditionally; `infer_rdfs` is only a knob
    /// to turn it off for a caller that has a reason to skip it.
    fn default() -> Self {
        ValidationOptions { infer_rdfs: true }
    }
}

/// `rdfs:subClassOf`/`rdf:type` transitive closure, built from whatever
/// `subClassOf` triples appear in either the data or the shapes graph.
/// Returns, per subject in the data graph, the full set of classes it
/// is a (possibly indirect) instance of.
fn class_closure(data: &TripleStore, shapes: &TripleStore) -> HashMap<String, HashSet<String>> {
    let mut super_of: HashMap<String, Vec<String>> = HashMap::new();
    for (s, p, o) in data.all_triples().into_iter().chain(shapes.all_triples()) {
        if p == RDFS_SUBCLASS_OF {
            if let Some(parent) = o.as_iri() {
                super_of.entry(s).or_default().push(parent.to_string());
            }
        }
    }

    let mut closure: HashMap<String, HashSet<String>> = HashMap::new();
    for subject in data.subjects() {
        let mut classes = HashSet::new();
        for t in data.objects(subject, RDF_TYPE) {
            if let Some(c) = t.as_iri() {
                classes.insert(c.to_string());
            }
        }
        let mut frontier: Vec<String> = classes.iter().cloned().collect();
        while let Some(c) = frontier.pop() {
            if let Some(parents) = super_of.get(&c) {
                for parent in parents {
                    if classes.insert(parent.clone()) {
                        frontier.push(parent.clone());
                    }
                }
            }
        }
        closure.insert(subject.to_string(), classes);
    }
    closure
}

fn node_has_class(
    node: &str,
    class: &str,
    data: &TripleStore,
    closure: &HashMap<String, HashSet<String>>,
) -> bool {
    if data
        .objects(node, RDF_TYPE)
        .iter()
        .any(|t| t.as_iri() == Some(class))
    {
        return true;
    }
    closure
        .get(node)
        .map(|classes| classes.contains(class))
        .unwrap_or(false)
}

fn resolve_targets(
    shape: &NodeShape,
    data: &TripleStore,
    closure: &HashMap<String, HashSet<String>>,
) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for node in &shape.target_node {
        if seen.insert(node.clone()) {
            targets.push(node.clone());
        }
    }

    if !shape.target_class.is_empty() {
        for subject in data.subjects() {
            let in_class = shape
                .target_class
                .iter()
                .any(|class| node_has_class(subject, class, data, closure));
            if in_class && seen.insert(subject.to_string()) {
                targets.push(subject.to_string());
            }
        }
    }

    for predicate in &shape.target_subjects_of {
        for subject in data.subjects() {
            if data.has_predicate(subject, predicate) && seen.insert(subject.to_string()) {
                targets.push(subject.to_string());
            }
        }
    }

    targets
}

/// Validates `data` against `shapes`, matching the constraint
/// components this system exercises: `minCount`, `maxCount`,
/// `minInclusive`, `maxInclusive`, `minExclusive`, `maxExclusive`,
/// `datatype`, `class`, `pattern`, `nodeKind`, `in`. Logical
/// constraints (`sh:and`/`or`/`not`), SPARQL-based constraints, and
/// qualified value shapes are out of scope.
pub fn validate(
    data: &TripleStore,
    shapes: &ShapesGraph,
    shapes_store: &TripleStore,
    options: ValidationOptions,
) -> ValidationReport {
    let closure = if options.infer_rdfs {
        class_closure(data, shapes_store)
    } else {
        HashMap::new()
    };

    let mut violations = Vec::new();

    for shape in &shapes.node_shapes {
        let targets = resolve_targets(shape, data, &closure);
        for focus_node in &targets {
            for property in &shape.properties {
                check_property_shape(focus_node, property, data, &closure, &mut violations);
            }
        }
    }

    ValidationReport {
        conforms: violations
            .iter()
            .all(|v: &ShaclViolation| v.severity != Severity::Violation),
        violations: violations
            .into_iter()
            .filter(|v| v.severity == Severity::Violation)
            .collect(),
    }
}

fn check_property_shape(
    focus_node: &str,
    shape: &PropertyShape,
    data: &TripleStore,
    closure: &HashMap<String, HashSet<String>>,
    violations: &mut Vec<ShaclViolation>,
) {
    let values = data.objects(focus_node, &shape.path);
    let count = values.len();

    if let Some(min) = shape.min_count {
        if (count as u64) < min {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MinCount",
                format!("expected at least {min} value(s), got {count}"),
            ));
        }
    }
    if let Some(max) = shape.max_count {
        if (count as u64) > max {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MaxCount",
                format!("expected at most {max} value(s), got {count}"),
            ));
        }
    }

    for value in &values {
        check_value_constraints(focus_node, shape, value, data, closure, violations);
    }
}

fn check_value_constraints(
    focus_node: &str,
    shape: &PropertyShape,
    value: &RdfTerm,
    data: &TripleStore,
    closure: &HashMap<String, HashSet<String>>,
    violations: &mut Vec<ShaclViolation>,
) {
    let numeric = value.lexical().and_then(|s| s.parse::<f64>().ok());

    if let Some(min) = shape.min_inclusive {
        if numeric.map(|v| v < min).unwrap_or(false) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MinInclusive",
                format!("value must be >= {min}"),
            ));
        }
    }
    if let Some(max) = shape.max_inclusive {
        if numeric.map(|v| v > max).unwrap_or(false) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MaxInclusive",
                format!("value must be <= {max}"),
            ));
        }
    }
    if let Some(min) = shape.min_exclusive {
        if numeric.map(|v| v <= min).unwrap_or(false) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MinExclusive",
                format!("value must be > {min}"),
            ));
        }
    }
    if let Some(max) = shape.max_exclusive {
        if numeric.map(|v| v >= max).unwrap_or(false) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "MaxExclusive",
                format!("value must be < {max}"),
            ));
        }
    }

    if let Some(datatype) = &shape.datatype {
        let actual = match value {
            RdfTerm::Literal { datatype, .. } => datatype.as_deref(),
            _ => None,
        };
        if actual != Some(datatype.as_str()) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "Datatype",
                format!("expected datatype {datatype}, got {actual:?}"),
            ));
        }
    }

    if let Some(class) = &shape.class {
        let is_member = value
            .as_iri()
            .map(|iri| node_has_class(iri, class, data, closure))
            .unwrap_or(false);
        if !is_member {
            violations.push(violation(
                focus_node,
                &shape.path,
                "Class",
                format!("value is not a member of class {class}"),
            ));
        }
    }

    if let Some(pattern) = &shape.pattern {
        let lexical = value.lexical().unwrap_or_default();
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(lexical) => violations.push(violation(
                focus_node,
                &shape.path,
                "Pattern",
                format!("value does not match pattern {pattern}"),
            )),
            Err(_) => violations.push(violation(
                focus_node,
                &shape.path,
                "Pattern",
                format!("invalid sh:pattern regex: {pattern}"),
            )),
            _ => {}
        }
    }

    if let Some(kind) = shape.node_kind {
        let matches = match (kind, value) {
            (NodeKind::Iri, RdfTerm::Iri(_)) => true,
            (NodeKind::BlankNode, RdfTerm::BlankNode(_)) => true,
            (NodeKind::Literal, RdfTerm::Literal { .. }) => true,
            _ => false,
        };
        if !matches {
            violations.push(violation(
                focus_node,
                &shape.path,
                "NodeKind",
                "value does not match required node kind".to_string(),
            ));
        }
    }

    if let Some(allowed) = &shape.in_values {
        let lexical = match value {
            RdfTerm::Iri(iri) => iri.clone(),
            RdfTerm::BlankNode(id) => id.clone(),
            RdfTerm::Literal { lexical, .. } => lexical.clone(),
        };
        if !allowed.contains(&lexical) {
            violations.push(violation(
                focus_node,
                &shape.path,
                "In",
                format!("value {lexical} is not in the allowed set"),
            ));
        }
    }
}

fn violation(focus_node: &str, path: &str, component: &str, message: String) -> ShaclViolation {
    ShaclViolation {
        focus_node: focus_node.to_string(),
        path: path.to_string(),
        constraint_component: component.to_string(),
        message,
        severity: Severity::Violation,
    }
}
