//! Escalation policy over a ranked candidate list.
//!
//! The resolver trusts the top candidate when it is both strong in absolute
//! terms and well ahead of the runner-up. Otherwise it sends the top few to
//! the arbitrator and falls back to the top candidate if that fails for any
//! reason.

use std::sync::Arc;

use tracing::{info, warn};

use crate::arbitration::{consult, Arbitrator};
use crate::config::MatchConfig;
use crate::error::InputError;
use crate::models::{Candidate, MatchOutcome, ReferenceTrack, Resolution, ScoredCandidate};
use crate::scoring::{validate_reference, Scorer};

/// Which branch of the escalation policy a ranked list falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Empty,
    Confident,
    Ambiguous,
}

/// Applies the confident/ambiguous policy and drives arbitration.
#[derive(Clone)]
pub struct Resolver {
    llm_score_threshold: f64,
    llm_score_difference: f64,
    max_candidates_to_arbitrate: usize,
    arbitrator: Option<Arc<dyn Arbitrator>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&MatchConfig::default())
    }
}

impl Resolver {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            llm_score_threshold: config.llm_score_threshold,
            llm_score_difference: config.llm_score_difference,
            max_candidates_to_arbitrate: config.max_candidates_to_arbitrate.max(1),
            arbitrator: None,
        }
    }

    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.arbitrator = Some(arbitrator);
        self
    }

    /// Classify a ranked list (sorted by descending score).
    /// A lone candidate is compared against an implicit runner-up score of 0.
    pub fn decide(&self, scored: &[ScoredCandidate]) -> Decision {
        let Some(top) = scored.first() else {
            return Decision::Empty;
        };
        let runner_up = scored.get(1).map_or(0.0, |s| s.score);

        if top.score >= self.llm_score_threshold
            && top.score - runner_up >= self.llm_score_difference
        {
            Decision::Confident
        } else {
            Decision::Ambiguous
        }
    }

    /// Pick one candidate from a ranked list.
    ///
    /// Only a malformed reference track is an error. An empty list yields
    /// [`Resolution::NoCandidates`]; any arbitration problem yields
    /// [`Resolution::Fallback`] with the top-ranked candidate.
    pub fn select(
        &self,
        reference: &ReferenceTrack,
        scored: &[ScoredCandidate],
    ) -> Result<Resolution, InputError> {
        validate_reference(reference)?;

        let Some(top) = scored.first() else {
            warn!(title = %reference.title, "No candidates to select from");
            return Ok(Resolution::NoCandidates);
        };

        if self.decide(scored) == Decision::Confident {
            info!(title = %reference.title, score = top.score, "Clear winner selected");
            return Ok(Resolution::Confident {
                candidate: top.candidate.clone(),
                score: top.score,
            });
        }

        let shortlist: Vec<Candidate> = scored
            .iter()
            .take(self.max_candidates_to_arbitrate)
            .map(|s| s.candidate.clone())
            .collect();

        info!(
            title = %reference.title,
            top_score = top.score,
            sent = shortlist.len(),
            "Scores ambiguous, escalating to arbitrator"
        );

        match consult(self.arbitrator.as_deref(), reference, &shortlist) {
            Ok(verdict) => {
                let chosen = &scored[verdict.chosen_index];
                info!(
                    title = %reference.title,
                    index = verdict.chosen_index,
                    confidence = verdict.confidence,
                    "Arbitrator selected candidate"
                );
                Ok(Resolution::Arbitrated {
                    candidate: chosen.candidate.clone(),
                    score: chosen.score,
                    verdict,
                })
            }
            Err(reason) => {
                warn!(
                    title = %reference.title,
                    reason = %reason,
                    "Arbitration failed, using top candidate"
                );
                Ok(Resolution::Fallback {
                    candidate: top.candidate.clone(),
                    score: top.score,
                    reason,
                })
            }
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Scorer and resolver configured from one [`MatchConfig`].
///
/// Holds no per-call state, so one instance can serve many threads.
#[derive(Clone, Default)]
pub struct TrackMatcher {
    scorer: Scorer,
    resolver: Resolver,
}

impl TrackMatcher {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            scorer: Scorer::new(config),
            resolver: Resolver::new(config),
        }
    }

    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.resolver = self.resolver.with_arbitrator(arbitrator);
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Score `candidates` against `reference` and resolve the ranking.
    pub fn match_track(
        &self,
        reference: &ReferenceTrack,
        candidates: &[Candidate],
    ) -> Result<MatchOutcome, InputError> {
        let ranked = self.scorer.score_candidates(reference, candidates)?;
        let resolution = self.resolver.select(reference, &ranked)?;
        Ok(MatchOutcome { ranked, resolution })
    }
}
