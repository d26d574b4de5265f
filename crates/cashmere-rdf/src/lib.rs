//! RDF representation services: parsing authored signifier Turtle into
//! the canonical data model, generating Turtle back out, and an optional
//! authoring-time structural validator.

pub mod authoring;
pub mod representation;
pub mod term;
pub mod triple_store;

pub use authoring::AuthoringValidator;
pub use representation::{generate_rdf, parse_signifier, preprocess_rdf, CASHMERE_NS, RDF_NS, SH_NS, XSD_NS};
pub use term::RdfTerm;
pub use triple_store::TripleStore;
