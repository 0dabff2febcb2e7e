use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use track_match::ollama::{OllamaArbitrator, OllamaConfig};
use track_match::query::{search_query, QueryGenerator};
use track_match::{Candidate, MatchConfig, MatchRequest, Resolution, ScoredCandidate, TrackMatcher};

#[derive(Parser)]
#[command(name = "track-match")]
#[command(about = "Match a reference track to the best search result from another catalog")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score and resolve one request file ({reference, candidates} JSON)
    Match {
        request: PathBuf,

        /// Escalate ambiguous rankings to Ollama (TRACK_MATCH_OLLAMA_* settings)
        #[arg(long)]
        arbitrate: bool,

        /// Override the confident-path score threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Override the required lead over the runner-up
        #[arg(long)]
        difference: Option<f64>,
    },

    /// Print a search query for the request's reference track
    Query {
        request: PathBuf,

        /// Ask Ollama for the query, falling back to the heuristic one
        #[arg(long)]
        generate: bool,
    },
}

#[derive(Serialize)]
struct MatchReport<'a> {
    status: &'static str,
    chosen: Option<&'a Candidate>,
    score: Option<f64>,
    confidence: Option<f64>,
    fallback_reason: Option<String>,
    ranked: &'a [ScoredCandidate],
}

impl<'a> MatchReport<'a> {
    fn new(resolution: &'a Resolution, ranked: &'a [ScoredCandidate]) -> Self {
        let (confidence, fallback_reason) = match resolution {
            Resolution::Arbitrated { verdict, .. } => (Some(verdict.confidence), None),
            Resolution::Fallback { reason, .. } => (None, Some(reason.to_string())),
            _ => (None, None),
        };
        Self {
            status: resolution.status(),
            chosen: resolution.candidate(),
            score: resolution.score(),
            confidence,
            fallback_reason,
            ranked,
        }
    }
}

fn read_request(path: &Path) -> Result<MatchRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse request file {:?}", path))
}

fn ollama() -> Result<OllamaArbitrator> {
    let config = OllamaConfig::from_env().context("Invalid Ollama configuration")?;
    OllamaArbitrator::new(config).context("Failed to build Ollama client")
}

fn run_query(request_path: &Path, generate: bool) -> Result<()> {
    let request = read_request(request_path)?;
    let generator = if generate { Some(ollama()?) } else { None };
    let query = search_query(
        generator.as_ref().map(|g| g as &dyn QueryGenerator),
        &request.reference,
    );
    println!("{}", query);
    Ok(())
}

fn run_match(
    request_path: &Path,
    arbitrate: bool,
    threshold: Option<f64>,
    difference: Option<f64>,
) -> Result<()> {
    let mut config = MatchConfig::from_env().context("Invalid matching configuration")?;
    if let Some(t) = threshold {
        config.llm_score_threshold = t;
    }
    if let Some(d) = difference {
        config.llm_score_difference = d;
    }
    config.validate().context("Invalid matching configuration")?;
    if !config.weights_are_normalized() {
        warn!(
            sum = config.weights_sum(),
            "Scoring weights do not sum to 1.0; totals may leave the 0-100 range"
        );
    }

    let mut matcher = TrackMatcher::new(&config);
    if arbitrate {
        matcher = matcher.with_arbitrator(Arc::new(ollama()?));
    }

    let request = read_request(request_path)?;
    let outcome = matcher
        .match_track(&request.reference, &request.candidates)
        .context("Invalid reference track")?;

    let report = MatchReport::new(&outcome.resolution, &outcome.ranked);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Match {
            request,
            arbitrate,
            threshold,
            difference,
        } => run_match(&request, arbitrate, threshold, difference),
        Command::Query { request, generate } => run_query(&request, generate),
    }
}
