//! Runtime configuration and logging setup for the Cashmere workspace.
//!
//! Defaults mirror the reference implementation's settings module
//! one-for-one; every field is overridable via a `CASHMERE_`-prefixed
//! environment variable.

use serde::{Deserialize, Serialize};
use std::env;

/// Per-stage soft latency budgets, observability only — the orchestrator
/// does not enforce these as hard deadlines unless a caller supplies an
/// explicit deadline on the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyBudgets {
    pub total_ms: u64,
    pub im_ms: u64,
    pub sse_ms: u64,
    pub sv_ms: u64,
    pub rp_ms: u64,
}

impl Default for LatencyBudgets {
    fn default() -> Self {
        LatencyBudgets {
            total_ms: 150,
            im_ms: 30,
            sse_ms: 20,
            sv_ms: 80,
            rp_ms: 10,
        }
    }
}

/// Top-level settings for a running Cashmere instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub storage_dir: String,
    pub rdf_format: String,
    pub enable_authoring_validation: bool,
    pub log_level: String,
    pub enabled_matcher_versions: Vec<String>,
    pub latency_budgets: LatencyBudgets,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            storage_dir: "./storage".to_string(),
            rdf_format: "turtle".to_string(),
            enable_authoring_validation: false,
            log_level: "INFO".to_string(),
            enabled_matcher_versions: vec![
                "v0".to_string(),
                "v1".to_string(),
            ],
            latency_budgets: LatencyBudgets::default(),
        }
    }
}

impl Settings {
    /// Builds settings from defaults, overridden by any
    /// `CASHMERE_*` environment variable that is set.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();

        if let Ok(v) = env::var("CASHMERE_STORAGE_DIR") {
            settings.storage_dir = v;
        }
        if let Ok(v) = env::var("CASHMERE_RDF_FORMAT") {
            settings.rdf_format = v;
        }
        if let Ok(v) = env::var("CASHMERE_ENABLE_AUTHORING_VALIDATION") {
            settings.enable_authoring_validation = parse_bool(&v, settings.enable_authoring_validation);
        }
        if let Ok(v) = env::var("CASHMERE_LOG_LEVEL") {
            settings.log_level = v;
        }
        if let Ok(v) = env::var("CASHMERE_ENABLED_MATCHER_VERSIONS") {
            settings.enabled_matcher_versions =
                v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("CASHMERE_LATENCY_BUDGET_TOTAL_MS") {
            if let Ok(n) = v.parse() {
                settings.latency_budgets.total_ms = n;
            }
        }

        settings
    }
}

fn parse_bool(raw: &str, fallback: bool) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}

/// Installs a `tracing-subscriber` `fmt` layer at the configured level.
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_logging(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level.to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
