use cashmere_core::{CashmereError, Signifier};

use crate::tokenize::{tokenize, tokenize_set};
use crate::{IntentMatcher, MatchParams, MatchResult};

/// Intent Matcher v0: lexical containment. Similarity is the fraction of
/// query tokens also present in the signifier's text (`nl_text` plus the
/// string form of `structured`).
#[derive(Debug, Default)]
pub struct LexicalMatcher;

impl LexicalMatcher {
    pub fn new() -> Self {
        LexicalMatcher
    }

    fn signifier_text(signifier: &Signifier) -> String {
        let mut text = signifier.intent.nl_text.clone();
        if let Some(structured) = &signifier.intent.structured {
            text.push(' ');
            text.push_str(&serde_json::Value::Object(structured.clone()).to_string());
        }
        text
    }
}

impl IntentMatcher for LexicalMatcher {
    fn version(&self) -> &str {
        "v0"
    }

    fn match_query(
        &self,
        intent_query: &str,
        signifiers: &[Signifier],
        k: usize,
        params: &MatchParams,
    ) -> Result<Vec<MatchResult>, CashmereError> {
        if intent_query.trim().is_empty() {
            return Err(CashmereError::InvalidInput(
                "intent_query cannot be empty".to_string(),
            ));
        }
        if signifiers.is_empty() {
            return Ok(Vec::new());
        }

        let query_tokens = tokenize(intent_query, params.case_sensitive);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let query_len = query_tokens.len() as f64;

        let mut results: Vec<MatchResult> = signifiers
            .iter()
            .filter_map(|signifier| {
                let text = Self::signifier_text(signifier);
                let signifier_tokens = tokenize_set(&text, params.case_sensitive);
                let matched: Vec<&String> = query_tokens
                    .iter()
                    .filter(|t| signifier_tokens.contains(*t))
                    .collect();
                let similarity = matched.len() as f64 / query_len;
                if similarity <= 0.0 {
                    return None;
                }
                Some(MatchResult {
                    signifier_id: signifier.signifier_id.clone(),
                    similarity,
                    metadata: serde_json::json!({
                        "matcher_version": "v0",
                        "matched_tokens": matched,
                    }),
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.signifier_id.cmp(&b.signifier_id))
        });
        results.truncate(k);
        Ok(results)
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "version": "v0",
            "name": "Lexical Containment Matcher",
            "description": "Fraction of query tokens present in signifier text",
            "latency_budget_ms": 30,
        })
    }
}
