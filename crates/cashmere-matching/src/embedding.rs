use cashmere_core::{CashmereError, Signifier};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::tokenize::tokenize;
use crate::{IntentMatcher, MatchParams, MatchResult};

const EMBEDDING_DIM: usize = 32;

/// Models this matcher recognizes. There is no bundled sentence-transformer
/// runtime in this workspace, so `try_new` only "loads" a deterministic
/// hashing embedding — but it still fails for an unrecognized name,
/// preserving the interface contract that v1 registration can fail.
const KNOWN_MODELS: &[&str] = &["all-MiniLM-L6-v2"];

/// Intent Matcher v1: vector similarity over a deterministic
/// bag-of-hashed-tokens embedding. This is not a trained semantic model —
/// no such model ships with this workspace — but it satisfies the same
/// contract a real sentence-embedding backend would: a fixed-width
/// vector per text, cosine similarity normalized to `[0, 1]`, and
/// per-signifier memoization.
pub struct EmbeddingMatcher {
    model_name: String,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl EmbeddingMatcher {
    /// Attempts to "load" `model_name`. Returns `None` for an
    /// unrecognized model, mirroring the reference's
    /// `ImportError`-on-missing-backend failure mode; callers should
    /// skip registering v1 rather than panic when this returns `None`.
    pub fn try_new(model_name: &str) -> Option<Self> {
        if !KNOWN_MODELS.contains(&model_name) {
            return None;
        }
        Some(EmbeddingMatcher {
            model_name: model_name.to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn embed(&self, id: &str, text: &str) -> Vec<f32> {
        let key = cache_key(id, text);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }
        let embedding = hashing_embed(text);
        self.cache.lock().insert(key, embedding.clone());
        embedding
    }
}

fn cache_key(id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(b":");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic bag-of-hashed-tokens embedding: each token's SHA-256
/// digest spreads signed energy across `EMBEDDING_DIM` accumulator
/// slots, then the vector is L2-normalized.
pub fn hashing_embed(text: &str) -> Vec<f32> {
    let tokens = tokenize(text, false);
    let mut acc = vec![0f32; EMBEDDING_DIM];
    for token in &tokens {
        let digest = Sha256::digest(token.as_bytes());
        for (i, slot) in acc.iter_mut().enumerate() {
            let byte = digest[i % digest.len()];
            let sign = if byte & 0x80 != 0 { -1.0 } else { 1.0 };
            *slot += sign * ((byte as f32 % 31.0) + 1.0);
        }
    }
    l2_normalize(&mut acc);
    acc
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity normalized into `[0, 1]` via `(cos + 1) / 2`,
/// clamped — a zero vector has similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cos = (dot / (norm_a * norm_b)) as f64;
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

impl IntentMatcher for EmbeddingMatcher {
    fn version(&self) -> &str {
        "v1"
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

        let query_embedding = hashing_embed(intent_query);

        let mut results: Vec<MatchResult> = signifiers
            .iter()
            .filter_map(|signifier| {
                let text = signifier.intent.combined_text();
                let embedding = self.embed(&signifier.signifier_id, &text);
                let similarity = cosine_similarity(&query_embedding, &embedding);
                if similarity < params.min_similarity {
                    return None;
                }
                Some(MatchResult {
                    signifier_id: signifier.signifier_id.clone(),
                    similarity,
                    metadata: serde_json::json!({
                        "matcher_version": "v1",
                        "model_name": self.model_name,
                        "embedding_dim": EMBEDDING_DIM,
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
            "version": "v1",
            "name": "Embedding Similarity Matcher",
            "description": "Semantic similarity using a deterministic hashed-token embedding",
            "model": self.model_name,
            "embedding_dim": EMBEDDING_DIM,
            "parameters": {
                "min_similarity": { "type": "float", "default": 0.0 }
            },
            "latency_budget_ms": 30,
        })
    }
}
