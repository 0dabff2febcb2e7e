//! Cross-catalog track matching - candidate scoring and disambiguation.

pub mod arbitration;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod ollama;
pub mod query;
pub mod resolve;
pub mod scoring;

pub use arbitration::Arbitrator;
pub use config::MatchConfig;
pub use error::{ArbitrationError, ConfigError, InputError};
pub use models::{
    ArbitrationVerdict, Candidate, MatchOutcome, MatchRequest, ReferenceTrack, Resolution,
    ScoredCandidate,
};
pub use resolve::{Resolver, TrackMatcher};
pub use scoring::Scorer;
