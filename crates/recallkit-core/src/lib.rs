//! recallkit-core: Recall scoring engine, statistics, and session model.
//!
//! This crate defines the data model, the pure scoring functions, and the
//! aggregation logic that the rest of recallkit builds on.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scorer;
pub mod statistics;
pub mod traits;

pub use error::{ErrorKind, ScoringError, ScoringResult};
pub use scorer::{score_chunk_intact, score_free_recall, score_serial, RecallScorer, ScorerConfig};
pub use statistics::{aggregate, effect, estimate_capacity};
