use cashmere_rank::RankedResult;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StageMetrics {
    pub name: String,
    pub latency_ms: u64,
    pub candidate_count: usize,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_results: usize,
    pub passed_gates: usize,
    pub failed_gates: usize,
    pub pipeline: Vec<String>,
    pub intent_query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub results: Vec<RankedResult>,
    pub module_results: Vec<StageMetrics>,
    pub total_latency_ms: u64,
    pub summary: Summary,
}
