//! Probabilistic latent semantic analysis (PLSA) fitted by
//! Expectation-Maximization over sparse document-word counts.
//!
//! Given `(document, word, weight)` observations and a number of
//! topics, `train` learns `P(z|d)` (document-topic) and `P(w|z)`
//! (topic-word). `retrain` learns `P(z|d)` for new documents while
//! keeping a previously learned `P(w|z)` fixed.

/// Errors for invalid inputs and settings
pub mod error;

/// Validated sparse `(document, word, weight)` triples
pub mod observations;

/// Row-stochastic document-topic and topic-word tables
pub mod tables;

/// E-step: per-observation posterior over topics
pub mod posterior;

/// M-step: posterior-weighted re-estimation of the tables
pub mod sufficient_stats;

/// Log-likelihood and the stopping rule
pub mod convergence;

/// Training and folding-in loops
pub mod inference;

/// Synthetic corpora
pub mod simulate;

pub use error::{PlsaError, Result};
pub use inference::{retrain, train, Plsa, PlsaFit, PlsaOptions, RetrainFit, Termination};
pub use observations::SparseObservations;
pub use tables::TopicTables;
