//! Scoring functions for cross-catalog matching.
//!
//! This module contains:
//! - Title similarity (token-order-insensitive indel ratio)
//! - Artist similarity (Jaro-Winkler on the primary artist)
//! - Duration scoring (linear one-point-per-second penalty)
//! - The weighted [`Scorer`] that ranks a candidate list

use strsim::jaro_winkler;
use tracing::debug;

use crate::config::MatchConfig;
use crate::error::InputError;
use crate::models::{Candidate, ReferenceTrack, ScoreBreakdown, ScoredCandidate};
use crate::normalize::{normalize, sorted_token_key};

// ============================================================================
// Signal Scores
// ============================================================================

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Indel similarity ratio on a 0-100 scale: `2 * lcs / (len_a + len_b)`.
/// Insertions and deletions only, so "blue monday" vs "blue monday remix"
/// scores 78.57 rather than the 64.7 a Levenshtein ratio gives.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Title similarity on a 0-100 scale.
/// Both titles are reduced to sorted normalized tokens before the
/// indel ratio, so "Artist - Title" and "Title (Artist)" score 100.
/// Returns 0 when either side has no comparable tokens.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let key_a = sorted_token_key(a);
    let key_b = sorted_token_key(b);
    if key_a.is_empty() || key_b.is_empty() {
        return 0.0;
    }
    indel_ratio(&key_a, &key_b)
}

/// Artist similarity on a 0-100 scale.
/// Jaro-Winkler rewards shared prefixes, which suits "Artist" vs "Artist feat. X".
/// Returns 0 when either side normalizes to nothing.
pub fn artist_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    jaro_winkler(&norm_a, &norm_b) * 100.0
}

/// Linear duration score: 100 for an exact match, minus one point per second
/// of difference, floored at 0 (so anything 100s or more apart scores 0).
/// A zero candidate duration is scored as-is.
pub fn duration_score(reference_sec: u32, candidate_sec: u32) -> f64 {
    let diff = (i64::from(reference_sec) - i64::from(candidate_sec)).abs();
    (100 - diff).max(0) as f64
}

/// Checks the fields the scorer cannot work without.
pub fn validate_reference(reference: &ReferenceTrack) -> Result<(), InputError> {
    if reference.title.trim().is_empty() {
        return Err(InputError::MissingTitle);
    }
    match reference.primary_artist() {
        Some(artist) if !artist.trim().is_empty() => Ok(()),
        _ => Err(InputError::MissingArtist),
    }
}

// ============================================================================
// Weighted Scorer
// ============================================================================

/// Ranks search candidates against a reference track.
///
/// Stateless apart from its weights; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Scorer {
    title_weight: f64,
    artist_weight: f64,
    duration_weight: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&MatchConfig::default())
    }
}

impl Scorer {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            title_weight: config.title_weight,
            artist_weight: config.artist_weight,
            duration_weight: config.duration_weight,
        }
    }

    /// Per-signal breakdown for one candidate.
    pub fn breakdown(&self, reference: &ReferenceTrack, candidate: &Candidate) -> ScoreBreakdown {
        let reference_artist = reference.primary_artist().unwrap_or_default();
        let candidate_artist = candidate.primary_artist().unwrap_or_default();

        ScoreBreakdown {
            title: title_similarity(&reference.title, &candidate.title),
            artist: artist_similarity(reference_artist, candidate_artist),
            duration: duration_score(reference.duration_seconds, candidate.duration_seconds),
        }
    }

    /// Weighted total. Stays within 0-100 when the weights sum to 1.0.
    pub fn total(&self, breakdown: &ScoreBreakdown) -> f64 {
        breakdown.title * self.title_weight
            + breakdown.artist * self.artist_weight
            + breakdown.duration * self.duration_weight
    }

    /// Scores every candidate and returns them sorted by descending total.
    /// Equal totals keep their original search-result order.
    pub fn score_candidates(
        &self,
        reference: &ReferenceTrack,
        candidates: &[Candidate],
    ) -> Result<Vec<ScoredCandidate>, InputError> {
        validate_reference(reference)?;

        debug!(
            title = %reference.title,
            artist = reference.primary_artist().unwrap_or_default(),
            duration = reference.duration_seconds,
            album = %reference.album,
            candidates = candidates.len(),
            "Scoring candidates"
        );

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|candidate| {
                let breakdown = self.breakdown(reference, candidate);
                let score = self.total(&breakdown);
                debug!(
                    candidate = %candidate.title,
                    artist = candidate.primary_artist().unwrap_or("Unknown"),
                    duration = candidate.duration_seconds,
                    title_score = breakdown.title,
                    artist_score = breakdown.artist,
                    duration_score = breakdown.duration,
                    total = score,
                    "Scored candidate"
                );
                ScoredCandidate {
                    score,
                    candidate: candidate.clone(),
                    breakdown,
                }
            })
            .collect();

        // sort_by is stable: ties keep search order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        for (rank, sc) in scored.iter().take(3).enumerate() {
            debug!(
                rank = rank + 1,
                candidate = %sc.candidate.title,
                score = sc.score,
                "Top candidate"
            );
        }

        Ok(scored)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn blue_monday() -> ReferenceTrack {
        ReferenceTrack::new("Blue Monday", "New Order", 280)
    }

    #[test]
    fn test_duration_score() {
        assert_eq!(duration_score(280, 280), 100.0);
        assert_eq!(duration_score(280, 270), 90.0);
        assert_eq!(duration_score(270, 280), 90.0);
        assert_eq!(duration_score(280, 340), 40.0);
        assert_eq!(duration_score(280, 380), 0.0);
        assert_eq!(duration_score(280, 1000), 0.0);
        // Unknown candidate duration is not special-cased
        assert_eq!(duration_score(60, 0), 40.0);
        assert_eq!(duration_score(280, 0), 0.0);
    }

    #[test]
    fn test_title_similarity_order_insensitive() {
        assert_eq!(title_similarity("Blue Monday", "blue monday"), 100.0);
        assert_eq!(title_similarity("New Order - Blue Monday", "Blue Monday (New Order)"), 100.0);
        assert_eq!(title_similarity("Don't Stop", "Dont Stop"), 100.0);
    }

    #[test]
    fn test_indel_ratio() {
        assert_eq!(indel_ratio("", ""), 100.0);
        assert_eq!(indel_ratio("abc", ""), 0.0);
        assert_eq!(indel_ratio("abc", "abc"), 100.0);
        // lcs 2 of lengths 3 + 3
        assert!((indel_ratio("abc", "abd") - 200.0 * 2.0 / 6.0).abs() < 1e-9);
        assert!((indel_ratio("blue monday", "blue mondays") - 95.652).abs() < 1e-3);
    }

    #[test]
    fn test_title_similarity_partial() {
        let s = title_similarity("Blue Monday", "Blue Monday (Remix)");
        assert!((s - 78.571).abs() < 1e-3, "got {}", s);
        let far = title_similarity("Blue Monday", "Stairway to Heaven");
        assert!((far - 27.586).abs() < 1e-3, "got {}", far);
    }

    #[test]
    fn test_lone_remix_at_same_length_is_confident_total() {
        let scorer = Scorer::default();
        let remix = Candidate::new("Blue Monday (Remix)", "New Order", 280, "remix");
        let b = scorer.breakdown(&blue_monday(), &remix);
        assert_eq!(b.artist, 100.0);
        assert_eq!(b.duration, 100.0);
        let total = scorer.total(&b);
        assert!((total - 89.286).abs() < 1e-3, "got {}", total);
        assert!(total >= MatchConfig::default().llm_score_threshold);
    }

    #[test]
    fn test_title_similarity_empty() {
        assert_eq!(title_similarity("", "Blue Monday"), 0.0);
        assert_eq!(title_similarity("Blue Monday", "!!!"), 0.0);
        assert_eq!(title_similarity("", ""), 0.0);
    }

    #[test]
    fn test_artist_similarity() {
        assert_eq!(artist_similarity("New Order", "new order"), 100.0);
        let feat = artist_similarity("New Order", "New Order feat. Someone");
        assert!(feat > 85.0, "prefix match should score high, got {}", feat);
        assert!(artist_similarity("New Order", "Joy Division") < feat);
        assert_eq!(artist_similarity("New Order", ""), 0.0);
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference(&blue_monday()).is_ok());

        let mut missing_title = blue_monday();
        missing_title.title = "  ".to_string();
        assert_eq!(validate_reference(&missing_title), Err(InputError::MissingTitle));

        let mut no_artists = blue_monday();
        no_artists.artists.clear();
        assert_eq!(validate_reference(&no_artists), Err(InputError::MissingArtist));

        let mut blank_artist = blue_monday();
        blank_artist.artists = vec![String::new(), "Someone".to_string()];
        assert_eq!(validate_reference(&blank_artist), Err(InputError::MissingArtist));
    }

    #[test]
    fn test_score_candidates_ranking() {
        let scorer = Scorer::default();
        let candidates = vec![
            Candidate::new("Blue Monday (Remix)", "New Order", 340, "b"),
            Candidate::new("Blue Monday", "New Order", 280, "a"),
        ];
        let ranked = scorer.score_candidates(&blue_monday(), &candidates).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].candidate.external_ref, "a");
        assert!((ranked[0].score - 100.0).abs() < 1e-9);
        assert!(ranked[0].score - ranked[1].score >= 15.0);
    }

    #[test]
    fn test_score_candidates_empty() {
        let ranked = Scorer::default().score_candidates(&blue_monday(), &[]).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_score_candidates_rejects_bad_reference() {
        let mut reference = blue_monday();
        reference.artists.clear();
        let candidates = vec![Candidate::new("Blue Monday", "New Order", 280, "a")];
        assert_eq!(
            Scorer::default().score_candidates(&reference, &candidates),
            Err(InputError::MissingArtist)
        );
    }

    #[test]
    fn test_missing_candidate_artist_scores_zero() {
        let scorer = Scorer::default();
        let mut candidate = Candidate::new("Blue Monday", "x", 280, "a");
        candidate.artists.clear();
        let b = scorer.breakdown(&blue_monday(), &candidate);
        assert_eq!(b.artist, 0.0);
        assert_eq!(b.title, 100.0);
        assert!((scorer.total(&b) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_stable_tie_break_and_determinism() {
        let scorer = Scorer::default();
        let candidates = vec![
            Candidate::new("Blue Monday", "New Order", 290, "first"),
            Candidate::new("Something Else", "Other", 100, "low"),
            Candidate::new("Blue Monday", "New Order", 290, "second"),
            Candidate::new("Blue Monday", "New Order", 270, "third"),
        ];
        let ranked = scorer.score_candidates(&blue_monday(), &candidates).unwrap();
        let refs: Vec<&str> = ranked.iter().map(|s| s.candidate.external_ref.as_str()).collect();
        assert_eq!(refs, vec!["first", "second", "third", "low"]);

        let again = scorer.score_candidates(&blue_monday(), &candidates).unwrap();
        assert_eq!(ranked, again);
    }

    #[test]
    fn test_score_bounded_with_normalized_weights() {
        let configs = [
            MatchConfig::default(),
            MatchConfig {
                title_weight: 1.0,
                artist_weight: 0.0,
                duration_weight: 0.0,
                ..MatchConfig::default()
            },
            MatchConfig {
                title_weight: 0.1,
                artist_weight: 0.1,
                duration_weight: 0.8,
                ..MatchConfig::default()
            },
        ];
        let reference = ReferenceTrack {
            title: "Bohemian Rhapsody".to_string(),
            artists: vec!["Queen".to_string(), "Freddie Mercury".to_string()],
            album: "A Night at the Opera".to_string(),
            duration_seconds: 354,
            external_id: Some("GBUM71029604".to_string()),
        };
        let mut no_artist = Candidate::new("", "", 0, "e");
        no_artist.artists.clear();
        let candidates = vec![
            Candidate::new("Bohemian Rhapsody", "Queen", 354, "a"),
            Candidate::new("Bohemian Rhapsody (Live)", "Queen", 420, "b"),
            Candidate::new("Stairway to Heaven", "Led Zeppelin", 482, "c"),
            Candidate::new("Rapsodia Bohemia", "Queen Tribute Band", 10, "d"),
            no_artist,
        ];
        for config in &configs {
            let ranked = Scorer::new(config).score_candidates(&reference, &candidates).unwrap();
            assert_eq!(ranked.len(), candidates.len());
            for sc in &ranked {
                assert!(
                    (0.0..=100.0 + 1e-9).contains(&sc.score),
                    "score {} out of bounds",
                    sc.score
                );
            }
        }
    }

    #[test]
    fn test_duration_weight_sensitivity() {
        let reference = blue_monday();
        let matching = Candidate::new("Blue Monday", "New Order", 280, "match");
        let far = Candidate::new("Blue Monday", "New Order", 400, "far");

        let gap = |duration_weight: f64| {
            let scorer = Scorer::new(&MatchConfig {
                title_weight: 0.5,
                artist_weight: 0.3,
                duration_weight,
                ..MatchConfig::default()
            });
            let m = scorer.total(&scorer.breakdown(&reference, &matching));
            let f = scorer.total(&scorer.breakdown(&reference, &far));
            f - m
        };

        assert!(gap(0.4) < gap(0.2));
        assert!(gap(0.2) < gap(0.1));
    }
}
