//! Retrieval Orchestrator: sequences the Intent Matcher, Structured
//! Subsumption Engine, Shape Validator, and Ranker & Policy stages,
//! measuring per-stage latency and composing the final response.

mod request;
mod response;

pub use request::{PipelineStage, RetrievalRequest};
pub use response::{RetrievalResponse, StageMetrics, Summary};

use std::time::Instant;

use cashmere_context::{normalize_context, ContextInput};
use cashmere_core::{CashmereError, ContextFeatures, Signifier};
use cashmere_matching::{MatchParams, MatcherRegistry};
use cashmere_rank::{rank, CandidateSignals, RankerConfig, ShaclSignal};
use cashmere_registry::SignifierRegistry;
use cashmere_rdf::TripleStore;
use cashmere_sse::{evaluate as sse_evaluate, SseConfig};
use rayon::prelude::*;

/// Per-candidate working state threaded through the pipeline. A
/// candidate is never dropped mid-pipeline; failures are recorded as
/// annotations and resolved by the Ranker's gates.
#[derive(Debug, Clone)]
struct Candidate {
    signifier: Signifier,
    intent_similarity: f64,
    sse_pass: Option<bool>,
    shacl: Option<ShaclSignal>,
    constraint_count: usize,
}

pub struct Orchestrator<'a> {
    pub registry: &'a SignifierRegistry,
    pub matchers: &'a MatcherRegistry,
    pub shacl: &'a cashmere_shacl::ShaclValidator,
    ranker_config: RankerConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a SignifierRegistry,
        matchers: &'a MatcherRegistry,
        shacl: &'a cashmere_shacl::ShaclValidator,
    ) -> Self {
        Orchestrator {
            registry,
            matchers,
            shacl,
            ranker_config: RankerConfig::default(),
        }
    }

    /// Overrides the ranker's configured gates/weights/specificity boost
    /// at construction time, independent of any per-request weights
    /// override passed later in `RetrievalRequest.ranking_weights`.
    pub fn with_ranker_config(mut self, config: RankerConfig) -> Self {
        self.ranker_config = config;
        self
    }

    /// Runs a single retrieval request through the configured pipeline.
    /// Never raises on a per-candidate failure; only infrastructure
    /// failures (e.g. an unknown matcher version) propagate.
    pub fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, CashmereError> {
        let total_start = Instant::now();
        let mut module_results = Vec::new();

        let (graph, features) = normalize_context(ContextInput::from_json_map(
            request.context_input.clone(),
        ))?;
        let graph = if let Some(types) = &request.artifact_types {
            let mut graph = graph;
            cashmere_context::add_type_information(&mut graph, types);
            graph
        } else {
            graph
        };

        let mut candidates = self.run_im_stage(request, &mut module_results, total_start)?;

        if request.has_stage(PipelineStage::Sse) {
            if request.enable_sse && !candidates.is_empty() && !timed_out(request, total_start) {
                self.run_sse_stage(request, &mut candidates, &features, &mut module_results);
            } else {
                module_results.push(skipped_metrics("SSE", candidates.len(), total_start, request));
            }
        }

        if request.has_stage(PipelineStage::Sv) {
            if !candidates.is_empty() && !timed_out(request, total_start) {
                self.run_sv_stage(request, &mut candidates, &graph, &mut module_results);
            } else {
                module_results.push(skipped_metrics("SV", candidates.len(), total_start, request));
            }
        }

        let results = if request.has_stage(PipelineStage::Rp) {
            self.run_rp_stage(request, &candidates, &mut module_results)
        } else {
            Vec::new()
        };

        let total_latency_ms = total_start.elapsed().as_millis() as u64;
        let passed_gates = results.iter().filter(|r| r.passed_gates).count();
        let failed_gates = results.len() - passed_gates;

        Ok(RetrievalResponse {
            summary: Summary {
                total_results: results.len(),
                passed_gates,
                failed_gates,
                pipeline: request.pipeline.iter().map(|s| s.name().to_string()).collect(),
                intent_query: request.intent_query.clone(),
            },
            results,
            module_results,
            total_latency_ms,
        })
    }

    fn run_im_stage(
        &self,
        request: &RetrievalRequest,
        module_results: &mut Vec<StageMetrics>,
        total_start: Instant,
    ) -> Result<Vec<Candidate>, CashmereError> {
        let start = Instant::now();

        if !request.has_stage(PipelineStage::Im) {
            // IM disabled: downstream stages see the full active set,
            // unscored (neutral similarity so ranking falls back to the
            // other enabled signals).
            let signifiers = self.registry.list(false);
            let candidates = signifiers
                .into_iter()
                .map(|signifier| Candidate {
                    signifier,
                    intent_similarity: 1.0,
                    sse_pass: None,
                    shacl: None,
                    constraint_count: 0,
                })
                .collect::<Vec<_>>();
            module_results.push(StageMetrics {
                name: "IM".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
                candidate_count: candidates.len(),
                metadata: serde_json::json!({"enabled": false}),
            });
            return Ok(candidates);
        }

        let signifiers = self.registry.list(false);
        let matches = self.matchers.match_query(
            &request.matcher_version,
            &request.intent_query,
            &signifiers,
            request.k,
            &MatchParams::default(),
        )?;

        let by_id: std::collections::HashMap<&str, &Signifier> = signifiers
            .iter()
            .map(|s| (s.signifier_id.as_str(), s))
            .collect();

        let candidates: Vec<Candidate> = matches
            .iter()
            .filter_map(|m| {
                by_id.get(m.signifier_id.as_str()).map(|s| Candidate {
                    signifier: (*s).clone(),
                    intent_similarity: m.similarity,
                    sse_pass: None,
                    shacl: None,
                    constraint_count: 0,
                })
            })
            .collect();

        let timed_out_flag = timed_out(request, total_start);
        module_results.push(StageMetrics {
            name: "IM".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
            candidate_count: candidates.len(),
            metadata: serde_json::json!({
                "matcher_version": request.matcher_version,
                "timed_out": timed_out_flag,
            }),
        });

        Ok(candidates)
    }

    fn run_sse_stage(
        &self,
        _request: &RetrievalRequest,
        candidates: &mut [Candidate],
        features: &ContextFeatures,
        module_results: &mut Vec<StageMetrics>,
    ) {
        let start = Instant::now();
        let config = SseConfig::default();

        let results: Vec<bool> = candidates
            .par_iter()
            .map(|c| sse_evaluate(&c.signifier.context.structured_conditions, features, &config).sse_pass)
            .collect();

        for (candidate, pass) in candidates.iter_mut().zip(results) {
            candidate.sse_pass = Some(pass);
        }

        module_results.push(StageMetrics {
            name: "SSE".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
            candidate_count: candidates.len(),
            metadata: serde_json::json!({}),
        });
    }

    fn run_sv_stage(
        &self,
        _request: &RetrievalRequest,
        candidates: &mut [Candidate],
        graph: &TripleStore,
        module_results: &mut Vec<StageMetrics>,
    ) {
        let start = Instant::now();

        let outcomes: Vec<(usize, bool, usize)> = candidates
            .par_iter()
            .map(|c| {
                let has_shapes = c.signifier.context.has_shapes();
                if !has_shapes {
                    return (0, true, 0);
                }
                let shapes_text = c.signifier.context.shacl_shapes.as_deref().unwrap_or("");
                let constraint_count = cashmere_shacl::constraint_count(shapes_text);
                match self.shacl.validate_text(graph, shapes_text) {
                    Ok(report) => (1, report.conforms, constraint_count),
                    Err(e) => {
                        tracing::warn!(id = %c.signifier.signifier_id, error = %e, "SHACL validation failed for candidate, treating as non-conforming");
                        (1, false, constraint_count)
                    }
                }
            })
            .collect();

        for (candidate, (has_shapes_flag, conforms, constraint_count)) in
            candidates.iter_mut().zip(outcomes)
        {
            candidate.shacl = Some(ShaclSignal {
                conforms,
                has_shapes: has_shapes_flag == 1,
            });
            candidate.constraint_count = constraint_count;
        }

        module_results.push(StageMetrics {
            name: "SV".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
            candidate_count: candidates.len(),
            metadata: serde_json::json!({"cache_size": self.shacl.cache_len()}),
        });
    }

    fn run_rp_stage(
        &self,
        request: &RetrievalRequest,
        candidates: &[Candidate],
        module_results: &mut Vec<StageMetrics>,
    ) -> Vec<cashmere_rank::RankedResult> {
        let start = Instant::now();

        let mut config = self.ranker_config.clone();
        if let Some(overrides) = &request.ranking_weights {
            config = config.with_weight_overrides(overrides);
        }

        let signals: Vec<CandidateSignals> = candidates
            .iter()
            .map(|c| CandidateSignals {
                signifier_id: c.signifier.signifier_id.clone(),
                intent_similarity: c.intent_similarity,
                shacl: c.shacl,
                sse_pass: c.sse_pass,
                constraint_count: c.constraint_count,
            })
            .collect();

        let results = rank(&signals, &config);

        module_results.push(StageMetrics {
            name: "RP".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
            candidate_count: results.len(),
            metadata: serde_json::json!({}),
        });

        results
    }
}

fn timed_out(request: &RetrievalRequest, _total_start: Instant) -> bool {
    request.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
}

/// Records a stage's metrics when it was configured into the pipeline
/// but skipped (empty candidate set or deadline already passed), so
/// every configured stage reports metrics even on a no-op pass.
fn skipped_metrics(
    name: &str,
    candidate_count: usize,
    total_start: Instant,
    request: &RetrievalRequest,
) -> StageMetrics {
    StageMetrics {
        name: name.to_string(),
        latency_ms: 0,
        candidate_count,
        metadata: serde_json::json!({
            "skipped": true,
            "timed_out": timed_out(request, total_start),
        }),
    }
}
