use dashmap::DashMap;
use sha2::{Digest, Sha256};

use cashmere_rdf::TripleStore;

use crate::validate::ValidationReport;

/// Canonical cache key for a `(data, shapes)` pair: sorted N-Triples-like
/// lines of both graphs, hashed together. Canonicalizing by sorting
/// fixes the non-determinism of hashing raw, as-authored Turtle text
/// (whitespace/ordering differences would otherwise produce distinct
/// keys for semantically identical graphs).
pub fn cache_key(data: &TripleStore, shapes: &TripleStore) -> String {
    let mut lines = render_sorted_lines(data);
    lines.push("---".to_string());
    lines.extend(render_sorted_lines(shapes));

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn render_sorted_lines(store: &TripleStore) -> Vec<String> {
    let mut lines: Vec<String> = store
        .all_triples()
        .into_iter()
        .map(|(s, p, o)| format!("<{s}> <{p}> {}", o.to_nt()))
        .collect();
    lines.sort();
    lines
}

/// Memoizes validation reports by graph-pair cache key. SHACL
/// validation cost scales with shape and data size; the same shapes
/// graph is typically re-validated against many candidate contexts
/// within a single retrieval request.
#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: DashMap<String, ValidationReport>,
}

impl ValidationCache {
    pub fn new() -> Self {
        ValidationCache {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<ValidationReport> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    pub fn insert(&self, key: String, report: ValidationReport) {
        self.entries.insert(key, report);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_across_whitespace_differences() {
        let a = TripleStore::parse_turtle(
            "@prefix ex: <http://example.org/> .\nex:s ex:p \"v\" .",
        )
        .unwrap();
        let b = TripleStore::parse_turtle(
            "@prefix ex: <http://example.org/> .\n\nex:s   ex:p    \"v\" .\n",
        )
        .unwrap();
        let shapes = TripleStore::default();
        assert_eq!(cache_key(&a, &shapes), cache_key(&b, &shapes));
    }

    #[test]
    fn cache_key_differs_for_different_data() {
        let a = TripleStore::parse_turtle(
            "@prefix ex: <http://example.org/> .\nex:s ex:p \"v1\" .",
        )
        .unwrap();
        let b = TripleStore::parse_turtle(
            "@prefix ex: <http://example.org/> .\nex:s ex:p \"v2\" .",
        )
        .unwrap();
        let shapes = TripleStore::default();
        assert_ne!(cache_key(&a, &shapes), cache_key(&b, &shapes));
    }
}
