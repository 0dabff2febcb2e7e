//! Search query for the target catalog.
//!
//! A [`QueryGenerator`] backend may write the query; the heuristic
//! [`fallback_search_query`] built from reference metadata alone covers
//! every case where it can't.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ArbitrationError;
use crate::models::ReferenceTrack;

/// Backend that writes a search query for a reference track.
///
/// Shares [`ArbitrationError`] with [`crate::Arbitrator`] since both are
/// calls to the same kind of text-generation service.
pub trait QueryGenerator: Send + Sync {
    fn generate_query(&self, reference: &ReferenceTrack) -> Result<String, ArbitrationError>;
}

/// Album words that mark a specific release worth searching for.
pub const VERSION_KEYWORDS: [&str; 7] =
    ["remaster", "deluxe", "live", "version", "edit", "mix", "bonus"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Title, primary artist, `feat.` credits for the rest, and the album only
/// when it names a particular version.
/// e.g., "Blue Monday New Order" or "Halo Beyoncé feat. X (Live at Wembley)"
pub fn fallback_search_query(reference: &ReferenceTrack) -> String {
    let mut parts: Vec<String> = vec![reference.title.clone()];

    if let Some((primary, featured)) = reference.artists.split_first() {
        parts.push(primary.clone());
        if !featured.is_empty() {
            parts.push(format!("feat. {}", featured.join(", ")));
        }
    }

    let album_lower = reference.album.to_lowercase();
    if VERSION_KEYWORDS.iter().any(|kw| album_lower.contains(kw)) {
        parts.push(reference.album.clone());
    }

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Build the prompt asking a text-generation backend for a search query.
pub fn build_query_prompt(reference: &ReferenceTrack) -> String {
    format!(
        "Generate the most effective music catalog search query for:\n\
         Track: {title}\n\
         Artists: {artists}\n\
         Album: {album}\n\
         Duration: {duration}s\n\
         ISRC: {isrc}\n\
         Respond ONLY with the query.",
        title = reference.title,
        artists = reference.artists.join(", "),
        album = reference.album,
        duration = reference.duration_seconds,
        isrc = reference.external_id.as_deref().unwrap_or("N/A"),
    )
}

/// Strip surrounding quotes and whitespace from a generated query.
/// `None` when nothing usable is left.
pub fn clean_generated_query(raw: &str) -> Option<String> {
    let query = collapse_whitespace(raw.trim().trim_matches('"'));
    (!query.is_empty()).then_some(query)
}

/// Ask the generator (if any) for a query, falling back to
/// [`fallback_search_query`] when there is none or it fails.
pub fn search_query(generator: Option<&dyn QueryGenerator>, reference: &ReferenceTrack) -> String {
    let Some(generator) = generator else {
        return fallback_search_query(reference);
    };

    match generator.generate_query(reference) {
        Ok(raw) => match clean_generated_query(&raw) {
            Some(query) => {
                debug!(query = %query, "Generated search query");
                query
            }
            None => {
                warn!(title = %reference.title, "Generated query was empty, using fallback");
                fallback_search_query(reference)
            }
        },
        Err(e) => {
            warn!(title = %reference.title, error = %e, "Query generation failed, using fallback");
            fallback_search_query(reference)
        }
    }
}
