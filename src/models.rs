//! Core data models for cross-catalog track matching.
//!
//! This module contains the inputs (reference track, search candidates),
//! the scored ranking, and the resolution produced for a single match request.

use serde::{Deserialize, Serialize};

use crate::error::ArbitrationError;

// ============================================================================
// Input Models
// ============================================================================

/// Track being searched for, from the source-of-truth catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTrack {
    pub title: String,
    pub artists: Vec<String>, // Credited order, primary artist first
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration_seconds: u32,
    /// ISRC-like code. Only shown to the arbitrator, never scored.
    #[serde(default)]
    pub external_id: Option<String>,
}

impl ReferenceTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            title: title.into(),
            artists: vec![artist.into()],
            album: String::new(),
            duration_seconds,
            external_id: None,
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

/// Single search result from the target catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration_seconds: u32, // 0 when the catalog did not report one
    pub external_ref: String,  // Opaque id used later to fetch the item
}

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_seconds: u32,
        external_ref: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artists: vec![artist.into()],
            album: None,
            duration_seconds,
            external_ref: external_ref.into(),
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

// ============================================================================
// Scoring Models
// ============================================================================

/// Per-signal scores (each 0-100) behind a candidate's total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub title: f64,
    pub artist: f64,
    pub duration: f64,
}

/// Candidate annotated with its weighted total score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub score: f64,
    pub candidate: Candidate,
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// Arbitration Models
// ============================================================================

/// Parsed arbitrator answer. `chosen_index` is always within the subset sent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArbitrationVerdict {
    pub chosen_index: usize,
    pub confidence: f64, // Informational only
}

// ============================================================================
// Resolution
// ============================================================================

/// Outcome of resolving a ranked list to a single candidate.
///
/// Every variant except `NoCandidates` carries a candidate; arbitration
/// problems never surface as errors, only as the `Fallback` reason.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The ranked list was empty.
    NoCandidates,
    /// Top candidate cleared both the threshold and the runner-up gap.
    Confident { candidate: Candidate, score: f64 },
    /// Arbitrator picked a candidate from the top of the ranking.
    Arbitrated {
        candidate: Candidate,
        score: f64,
        verdict: ArbitrationVerdict,
    },
    /// Scores were ambiguous and arbitration failed; top-ranked candidate returned.
    Fallback {
        candidate: Candidate,
        score: f64,
        reason: ArbitrationError,
    },
}

impl Resolution {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Resolution::NoCandidates => None,
            Resolution::Confident { candidate, .. }
            | Resolution::Arbitrated { candidate, .. }
            | Resolution::Fallback { candidate, .. } => Some(candidate),
        }
    }

    pub fn into_candidate(self) -> Option<Candidate> {
        match self {
            Resolution::NoCandidates => None,
            Resolution::Confident { candidate, .. }
            | Resolution::Arbitrated { candidate, .. }
            | Resolution::Fallback { candidate, .. } => Some(candidate),
        }
    }

    /// Score of the chosen candidate in the ranking it was picked from.
    pub fn score(&self) -> Option<f64> {
        match self {
            Resolution::NoCandidates => None,
            Resolution::Confident { score, .. }
            | Resolution::Arbitrated { score, .. }
            | Resolution::Fallback { score, .. } => Some(*score),
        }
    }

    /// Short machine-readable label, used in logs and CLI output.
    pub fn status(&self) -> &'static str {
        match self {
            Resolution::NoCandidates => "no_candidates",
            Resolution::Confident { .. } => "confident",
            Resolution::Arbitrated { .. } => "arbitrated",
            Resolution::Fallback { .. } => "fallback",
        }
    }
}

// ============================================================================
// Request / Outcome
// ============================================================================

/// One reference track plus the raw search results to match it against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRequest {
    pub reference: ReferenceTrack,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Full result of matching one reference track.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub ranked: Vec<ScoredCandidate>,
    pub resolution: Resolution,
}
