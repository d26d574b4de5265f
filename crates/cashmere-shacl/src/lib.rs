//! SHACL Core subset validator: shapes-graph parsing, target resolution,
//! `rdfs:subClassOf`/`rdf:type` inference, and the constraint components
//! this system exercises. Logical constraints (`sh:and`/`or`/`not`),
//! SPARQL-based constraints, and qualified value shapes are out of scope.

pub mod cache;
pub mod shapes;
pub mod validate;

pub use cache::{cache_key, ValidationCache};
pub use shapes::{constraint_count, NodeKind, NodeShape, PropertyShape, ShapesGraph};
pub use validate::{validate, Severity, ShaclViolation, ValidationOptions, ValidationReport};

use cashmere_core::CashmereError;
use cashmere_rdf::TripleStore;

/// Parses a shapes graph and validates `data` against it, memoizing the
/// result by the `(data, shapes)` pair's canonical cache key.
pub struct ShaclValidator {
    cache: ValidationCache,
    options: ValidationOptions,
}

impl ShaclValidator {
    pub fn new(options: ValidationOptions) -> Self {
        ShaclValidator {
            cache: ValidationCache::new(),
            options,
        }
    }

    pub fn validate_text(
        &self,
        data: &TripleStore,
        shapes_text: &str,
    ) -> Result<ValidationReport, CashmereError> {
        let shapes_store =
            TripleStore::parse_turtle(shapes_text).map_err(|e| CashmereError::InvalidShapes(e.to_string()))?;
        let shapes = ShapesGraph::from_store(&shapes_store)?;

        let key = cache_key(data, &shapes_store);
        if let Some(report) = self.cache.get(&key) {
            return Ok(report);
        }

        let report = validate(data, &shapes, &shapes_store, self.options);
        self.cache.insert(key, report.clone());
        Ok(report)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ShaclValidator {
    fn default() -> Self {
        ShaclValidator::new(ValidationOptions::default())
    }
}
