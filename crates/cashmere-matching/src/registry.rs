use cashmere_core::{CashmereError, Signifier};
use std::collections::HashMap;

use crate::{EmbeddingMatcher, IntentMatcher, LexicalMatcher, MatchParams, MatchResult};

/// Versioned dispatch over registered `IntentMatcher` implementations.
/// Requesting an unregistered version is an error rather than a panic —
/// in particular, v1 may simply not be present if its backend failed to
/// load at construction time.
pub struct MatcherRegistry {
    matchers: HashMap<String, Box<dyn IntentMatcher>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        MatcherRegistry {
            matchers: HashMap::new(),
        }
    }

    /// Registers v0 (always available) and attempts to register v1
    /// against `embedding_model_name`; if that backend fails to load,
    /// v1 is silently absent rather than the registry failing to
    /// construct.
    pub fn with_defaults(embedding_model_name: &str) -> Self {
        let mut registry = MatcherRegistry::new();
        registry.register(Box::new(LexicalMatcher::new()));
        match EmbeddingMatcher::try_new(embedding_model_name) {
            Some(matcher) => registry.register(Box::new(matcher)),
            None => tracing::warn!(
                model = embedding_model_name,
                "embedding matcher backend unavailable, v1 not registered"
            ),
        }
        registry
    }

    pub fn register(&mut self, matcher: Box<dyn IntentMatcher>) {
        self.matchers
            .insert(matcher.version().to_string(), matcher);
    }

    pub fn get(&self, version: &str) -> Result<&dyn IntentMatcher, CashmereError> {
        self.matchers
            .get(version)
            .map(|m| m.as_ref())
            .ok_or_else(|| CashmereError::UnknownVersion(version.to_string()))
    }

    pub fn has(&self, version: &str) -> bool {
        self.matchers.contains_key(version)
    }

    pub fn match_query(
        &self,
        version: &str,
        intent_query: &str,
        signifiers: &[Signifier],
        k: usize,
        params: &MatchParams,
    ) -> Result<Vec<MatchResult>, CashmereError> {
        self.get(version)?
            .match_query(intent_query, signifiers, k, params)
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        MatcherRegistry::new()
    }
}
