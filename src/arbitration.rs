//! Arbitration: the external judgment step used when scores are inconclusive.
//!
//! The engine only ever talks to an arbitrator through [`consult`], which
//! turns every possible failure (no backend, transport error, unusable
//! answer) into a typed [`ArbitrationError`] so the resolver can branch on a
//! plain `Result`.

use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ArbitrationError;
use crate::models::{ArbitrationVerdict, Candidate, ReferenceTrack};

/// Backend that picks the best candidate for a reference track.
///
/// Implementations return the raw model output; parsing and validation
/// happen in [`parse_verdict`]. Must be safe to call from several threads.
pub trait Arbitrator: Send + Sync {
    fn judge(
        &self,
        reference: &ReferenceTrack,
        candidates: &[Candidate],
    ) -> Result<String, ArbitrationError>;
}

// ============================================================================
// Prompt
// ============================================================================

/// Format seconds as `m:ss`, or `?` when unknown.
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        "?".to_string()
    } else {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

fn format_candidate(index: usize, candidate: &Candidate) -> String {
    let title = if candidate.title.trim().is_empty() {
        "Unknown title"
    } else {
        candidate.title.as_str()
    };
    format!(
        "{}. {} by {} ({}) | Album: {}",
        index,
        title,
        candidate.primary_artist().unwrap_or("Unknown"),
        format_duration(candidate.duration_seconds),
        candidate.album.as_deref().unwrap_or("unknown"),
    )
}

/// Build the judgment prompt sent to a text-generation arbitrator.
pub fn build_judge_prompt(reference: &ReferenceTrack, candidates: &[Candidate]) -> String {
    let last_index = candidates.len().saturating_sub(1);
    let listing: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("  {}", format_candidate(i, c)))
        .collect();

    format!(
        "Analyze this music track matching request. \
         Return JSON with 'index' (0-{last}) and 'confidence' (0-100).\n\
         \n\
         Reference Track:\n\
         - Title: {title}\n\
         - Artists: {artists}\n\
         - Album: {album}\n\
         - Duration: {duration}s\n\
         - ISRC: {isrc}\n\
         \n\
         Candidates:\n\
         {listing}\n",
        last = last_index,
        title = reference.title,
        artists = reference.artists.join(", "),
        album = reference.album,
        duration = reference.duration_seconds,
        isrc = reference.external_id.as_deref().unwrap_or("N/A"),
        listing = listing.join("\n"),
    )
}

// ============================================================================
// Verdict Parsing
// ============================================================================

#[derive(Deserialize)]
struct RawVerdict {
    index: i64,
    confidence: f64,
}

/// Strictly parse arbitrator output.
///
/// The trimmed text must be a JSON object with an integer `index` in
/// `[0, sent)` and a numeric `confidence` in `[0, 100]`. Extra keys are ignored.
pub fn parse_verdict(raw: &str, sent: usize) -> Result<ArbitrationVerdict, ArbitrationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ArbitrationError::EmptyResponse);
    }

    let malformed = |e: serde_json::Error| ArbitrationError::Malformed {
        reason: e.to_string(),
    };
    let value: Value = serde_json::from_str(trimmed).map_err(malformed)?;
    if !value.is_object() {
        return Err(ArbitrationError::Malformed {
            reason: "expected a JSON object".to_string(),
        });
    }
    let parsed: RawVerdict = serde_json::from_value(value).map_err(malformed)?;

    let chosen_index = usize::try_from(parsed.index)
        .ok()
        .filter(|&i| i < sent)
        .ok_or(ArbitrationError::IndexOutOfRange {
            index: parsed.index,
            sent,
        })?;

    if !(0.0..=100.0).contains(&parsed.confidence) {
        return Err(ArbitrationError::InvalidConfidence(parsed.confidence));
    }

    Ok(ArbitrationVerdict {
        chosen_index,
        confidence: parsed.confidence,
    })
}

// ============================================================================
// Adapter
// ============================================================================

/// Ask the arbitrator (if any) to choose among `candidates`, returning a
/// validated verdict or the reason there is none. Never panics on bad output.
pub fn consult(
    arbitrator: Option<&dyn Arbitrator>,
    reference: &ReferenceTrack,
    candidates: &[Candidate],
) -> Result<ArbitrationVerdict, ArbitrationError> {
    let arbitrator = arbitrator.ok_or(ArbitrationError::Unavailable)?;

    let start = Instant::now();
    let raw = arbitrator.judge(reference, candidates);
    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        sent = candidates.len(),
        ok = raw.is_ok(),
        "Arbitrator returned"
    );

    parse_verdict(&raw?, candidates.len())
}
