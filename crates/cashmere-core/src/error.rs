use thiserror::Error;

/// Error kinds shared across every `cashmere-*` crate boundary.
///
/// Ingest-path operations (registry create/update, RDF parsing, authoring
/// validation) surface these synchronously. Retrieval-path operations never
/// raise them for per-candidate failure; a candidate that would otherwise
/// trigger one of these is instead annotated and skipped.
#[derive(Debug, Error)]
pub enum CashmereError {
    #[error("signifier already exists: {0}")]
    AlreadyExists(String),

    #[error("signifier not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid RDF: {0}")]
    InvalidRdf(String),

    #[error("unknown matcher version: {0}")]
    UnknownVersion(String),

    #[error("invalid SHACL shapes: {0}")]
    InvalidShapes(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CashmereError>;
