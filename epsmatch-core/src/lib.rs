//! epsmatch Core Library
//!
//! Epsilon-match search between a query set and a database: filter
//! parameter derivation, seed index with abundance masking, SWIFT
//! filtering, banded verification and match collection.

pub mod config;
pub mod error;
pub mod filter;
pub mod ids;
pub mod io;
pub mod mask;
pub mod matches;
pub mod params;
pub mod pipeline;
pub mod search;
pub mod seed;
pub mod stats;
pub mod types;
pub mod verify;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types and functions
pub use config::{ConfigError, OutputFormat, SearchConfig, ValidatedConfig, VerificationMethod};
pub use error::{Error, Result};
pub use mask::{AbundanceMasker, MaskReport};
pub use matches::{LocalMatch, MatchCollection};
pub use params::FilterParams;
pub use pipeline::{Pipeline, RunReport, SearchOutcome, Timings};
pub use search::{NoopObserver, SearchObserver, Searcher};
pub use stats::Significance;
pub use types::{Alphabet, SequenceRecord, Strand};

/// Version information for the epsmatch core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
