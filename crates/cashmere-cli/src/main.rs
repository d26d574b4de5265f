//! Cashmere CLI
//!
//! Thin demo wrapper around the signifier retrieval core:
//! - `ingest` loads a signifier from a Turtle file into a file-backed registry
//! - `retrieve` runs a natural-language query through the full pipeline
//! - `info` prints registry/matcher diagnostics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use cashmere_matching::MatcherRegistry;
use cashmere_orchestrator::{Orchestrator, RetrievalRequest};
use cashmere_registry::SignifierRegistry;
use cashmere_shacl::{ShaclValidator, ValidationOptions};

#[derive(Parser)]
#[command(name = "cashmere")]
#[command(author, version, about = "Signifier retrieval over a local registry")]
struct Cli {
    /// Storage directory for the file-backed registry.
    #[arg(long, default_value = "./storage", global = true)]
    storage_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a signifier from a Turtle file.
    Ingest {
        /// Path to a `.ttl` file containing one authored signifier.
        path: PathBuf,
    },
    /// Run a natural-language query against the registry.
    Retrieve {
        /// The intent query text.
        intent_query: String,
        /// Context input as a JSON object (nested or flat form).
        #[arg(long, default_value = "{}")]
        context: String,
        /// Matcher version to use (`v0` or `v1`).
        #[arg(long, default_value = "v0")]
        matcher_version: String,
        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Print registry and matcher diagnostics.
    Info,
}

fn main() -> Result<()> {
    let settings = cashmere_config::Settings::from_env();
    cashmere_config::init_logging(&settings);
    let cli = Cli::parse();

    let registry = SignifierRegistry::with_storage(&cli.storage_dir)
        .context("failed to open signifier registry")?;
    let matchers = MatcherRegistry::with_defaults("all-MiniLM-L6-v2");
    let shacl = ShaclValidator::new(ValidationOptions { infer_rdfs: true });

    match cli.command {
        Commands::Ingest { path } => ingest(&registry, &path),
        Commands::Retrieve {
            intent_query,
            context,
            matcher_version,
            k,
        } => retrieve(&registry, &matchers, &shacl, &intent_query, &context, &matcher_version, k),
        Commands::Info => info(&registry, &matchers),
    }
}

fn ingest(registry: &SignifierRegistry, path: &PathBuf) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let signifier = registry.create_from_rdf(&text)?;
    println!(
        "{} ingested {} (v{})",
        "✓".green(),
        signifier.signifier_id.bold(),
        signifier.version
    );
    Ok(())
}

fn retrieve(
    registry: &SignifierRegistry,
    matchers: &MatcherRegistry,
    shacl: &ShaclValidator,
    intent_query: &str,
    context: &str,
    matcher_version: &str,
    k: usize,
) -> Result<()> {
    let context_value: serde_json::Value =
        serde_json::from_str(context).context("context must be a JSON object")?;
    let context_input = context_value
        .as_object()
        .context("context must be a JSON object")?
        .clone();

    let orchestrator = Orchestrator::new(registry, matchers, shacl);
    let mut request = RetrievalRequest::new(intent_query);
    request.context_input = context_input;
    request.matcher_version = matcher_version.to_string();
    request.k = k;

    let response = orchestrator.retrieve(&request)?;

    println!(
        "{} results in {}ms (pipeline: {})",
        response.results.len().to_string().bold(),
        response.total_latency_ms,
        response.summary.pipeline.join(" -> ")
    );
    for result in &response.results {
        let status = if result.passed_gates {
            "PASS".green()
        } else {
            "FAIL".red()
        };
        println!(
            "  [{status}] {} score={:.3}",
            result.signifier_id.bold(),
            result.final_score
        );
        for line in &result.explanation {
            println!("      {line}");
        }
    }
    Ok(())
}

fn info(registry: &SignifierRegistry, matchers: &MatcherRegistry) -> Result<()> {
    let signifiers = registry.list(true);
    println!("{}: {} signifiers", "registry".bold(), signifiers.len());
    for version in ["v0", "v1"] {
        let status = if matchers.has(version) {
            "available".green()
        } else {
            "unavailable".yellow()
        };
        println!("  matcher {version}: {status}");
    }
    Ok(())
}
