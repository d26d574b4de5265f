use std::collections::HashMap;
use std::time::Instant;

/// One named stage of the retrieval pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Im,
    Sse,
    Sv,
    Rp,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Im => "IM",
            PipelineStage::Sse => "SSE",
            PipelineStage::Sv => "SV",
            PipelineStage::Rp => "RP",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "IM" => Some(PipelineStage::Im),
            "SSE" => Some(PipelineStage::Sse),
            "SV" => Some(PipelineStage::Sv),
            "RP" => Some(PipelineStage::Rp),
            _ => None,
        }
    }

    pub fn default_pipeline() -> Vec<PipelineStage> {
        vec![
            PipelineStage::Im,
            PipelineStage::Sse,
            PipelineStage::Sv,
            PipelineStage::Rp,
        ]
    }
}

/// A single retrieval request. `deadline` is given as an already-resolved
/// `Instant` rather than a duration so the orchestrator never reads the
/// clock to compute "now + budget" itself.
pub struct RetrievalRequest {
    pub intent_query: String,
    pub context_input: serde_json::Map<String, serde_json::Value>,
    pub artifact_types: Option<HashMap<String, String>>,
    pub pipeline: Vec<PipelineStage>,
    pub matcher_version: String,
    pub k: usize,
    pub ranking_weights: Option<HashMap<String, f64>>,
    pub enable_sse: bool,
    pub deadline: Option<Instant>,
}

impl RetrievalRequest {
    pub fn new(intent_query: impl Into<String>) -> Self {
        RetrievalRequest {
            intent_query: intent_query.into(),
            context_input: serde_json::Map::new(),
            artifact_types: None,
            pipeline: PipelineStage::default_pipeline(),
            matcher_version: "v0".to_string(),
            k: 10,
            ranking_weights: None,
            enable_sse: true,
            deadline: None,
        }
    }

    pub fn has_stage(&self, stage: PipelineStage) -> bool {
        self.pipeline.contains(&stage)
    }
}
