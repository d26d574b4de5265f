use cashmere_core::{CashmereError, Signifier};

use crate::representation::{RDF_NS, SH_NS};
use crate::term::RdfTerm;
use crate::triple_store::TripleStore;

/// Optional ingest-time structural validation, off by default.
/// Required-field checks always run; SHACL shape well-formedness
/// checks run only when shapes are present; optional/recommended-field
/// warnings run only in strict mode.
pub struct AuthoringValidator {
    strict_mode: bool,
}

impl AuthoringValidator {
    pub fn new(strict_mode: bool) -> Self {
        AuthoringValidator { strict_mode }
    }

    /// Returns the list of validation messages (empty if the signifier
    /// is valid). In strict mode, a non-empty list is also raised as
    /// `CashmereError::InvalidInput` from `validate_and_raise`.
    pub fn validate_signifier(
        &self,
        signifier: &Signifier,
        enable_shacl_check: bool,
    ) -> Vec<String> {
        let mut errors = self.check_required_fields(signifier);

        if enable_shacl_check {
            if let Some(shapes) = &signifier.context.shacl_shapes {
                if !shapes.trim().is_empty() {
                    errors.extend(self.check_shacl_shapes(shapes));
                }
            }
        }

        if self.strict_mode {
            errors.extend(self.check_optional_fields(signifier));
        }

        errors
    }

    pub fn validate_and_raise(
        &self,
        signifier: &Signifier,
        enable_shacl_check: bool,
    ) -> Result<(), CashmereError> {
        let errors = self.validate_signifier(signifier, enable_shacl_check);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CashmereError::InvalidInput(format!(
                "signifier validation failed: {}",
                errors.join("; ")
            )))
        }
    }

    fn check_required_fields(&self, signifier: &Signifier) -> Vec<String> {
        let mut errors = Vec::new();
        if signifier.signifier_id.trim().is_empty() {
            errors.push("Missing signifier_id".to_string());
        }
        if signifier.affordance_uri.trim().is_empty() {
            errors.push("Missing affordance_uri (cashmere:signifies)".to_string());
        }
        if signifier.intent.nl_text.trim().is_empty() {
            errors.push("Missing intent.nl_text".to_string());
        }
        errors
    }

    fn check_optional_fields(&self, signifier: &Signifier) -> Vec<String> {
        let mut warnings = Vec::new();
        if !signifier.context.has_shapes() && signifier.context.structured_conditions.is_empty() {
            warnings.push("No SHACL shapes or structured conditions defined".to_string());
        }
        if signifier.provenance.created_by.trim().is_empty() {
            warnings.push("Missing provenance information".to_string());
        }
        warnings
    }

    fn check_shacl_shapes(&self, shapes: &str) -> Vec<String> {
        let store = match TripleStore::parse_turtle(shapes) {
            Ok(s) => s,
            Err(e) => return vec![format!("Failed to parse SHACL shapes: {e}")],
        };

        let node_shape_type = RdfTerm::Iri(format!("{SH_NS}NodeShape"));
        let node_shapes = store.subjects_with(&format!("{RDF_NS}type"), &node_shape_type);
        if node_shapes.is_empty() {
            return vec!["No sh:NodeShape found in SHACL shapes".to_string()];
        }

        let mut errors = Vec::new();
        for shape in &node_shapes {
            errors.extend(self.validate_node_shape(&store, shape));
        }
        errors
    }

    fn validate_node_shape(&self, store: &TripleStore, shape: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let has_target = [
            format!("{SH_NS}targetNode"),
            format!("{SH_NS}targetClass"),
            format!("{SH_NS}targetSubjectsOf"),
        ]
        .iter()
        .any(|p| store.has_predicate(shape, p));

        if !has_target {
            errors.push(format!(
                "NodeShape {shape} has no target (sh:targetNode, sh:targetClass, etc.)"
            ));
        }

        for prop_shape in store.objects(shape, &format!("{SH_NS}property")) {
            let Some(prop_iri) = prop_shape.as_iri() else {
                continue;
            };
            match store.value(prop_iri, &format!("{SH_NS}path")) {
                None => errors.push(format!("Property shape {prop_iri} missing sh:path")),
                Some(path) => {
                    if path.as_iri().is_none() {
                        errors.push(format!("sh:path must be a valid IRI, got: {:?}", path));
                    }
                }
            }
        }

        errors
    }
}
