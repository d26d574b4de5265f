//! Intent Matcher (IM): pluggable, versioned natural-language similarity
//! scoring between an intent query and a signifier's intent text.

pub mod embedding;
pub mod lexical;
pub mod registry;
pub mod tokenize;

use cashmere_core::{CashmereError, Signifier};

/// A single matched signifier and its similarity score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub signifier_id: String,
    pub similarity: f64,
    pub metadata: serde_json::Value,
}

/// Call-time parameters shared across matcher versions. Fields a given
/// matcher does not use are simply ignored by it.
#[derive(Debug, Clone)]
pub struct MatchParams {
    pub min_similarity: f64,
    pub case_sensitive: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        MatchParams {
            min_similarity: 0.0,
            case_sensitive: false,
        }
    }
}

/// Implemented by each matcher version. `k` bounds the number of
/// results returned, sorted by similarity descending (ties broken by
/// `signifier_id` ascending).
pub trait IntentMatcher: Send + Sync {
    fn version(&self) -> &str;

    fn match_query(
        &self,
        intent_query: &str,
        signifiers: &[Signifier],
        k: usize,
        params: &MatchParams,
    ) -> Result<Vec<MatchResult>, CashmereError>;

    fn info(&self) -> serde_json::Value;
}

pub use embedding::EmbeddingMatcher;
pub use lexical::LexicalMatcher;
pub use registry::MatcherRegistry;
