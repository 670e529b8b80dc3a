//! Seed index over the query set
//!
//! Every window of `seed_length` symbols in every query is recorded in a bucket
//! keyed by the window itself. Buckets carry an explicit enabled/disabled state
//! so the abundance masker can switch off non-discriminative seeds without
//! overloading the occurrence count.

pub mod utils;

use std::collections::HashMap;

use crate::types::{Alphabet, SequenceRecord};
use utils::has_wildcard;

/// Longest seed the index accepts.
pub const MAX_SEED_LENGTH: usize = 32;

/// Result type for seeding operations
pub type SeedResult<T> = Result<T, SeedError>;

/// Errors that can occur while building the seed index
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// A seed occurrence: query number and start position inside that query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub query: usize,
    pub position: usize,
}

/// Whether a bucket still takes part in filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Enabled,
    Disabled,
}

/// Occurrence list for one seed value.
#[derive(Debug, Clone)]
pub struct Bucket {
    occurrences: Vec<Occurrence>,
    state: BucketState,
}

impl Bucket {
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn count(&self) -> usize {
        self.occurrences.len()
    }

    pub fn state(&self) -> BucketState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == BucketState::Enabled
    }

    pub(crate) fn disable(&mut self) {
        self.state = BucketState::Disabled;
    }
}

/// q-gram index over a query set
#[derive(Debug, Clone)]
pub struct SeedIndex {
    seed_length: usize,
    alphabet: Alphabet,
    buckets: HashMap<Box<[u8]>, Bucket>,
    total_length: usize,
}

impl SeedIndex {
    /// Index every wildcard-free window of `seed_length` symbols.
    pub fn build(queries: &[SequenceRecord], seed_length: usize, alphabet: Alphabet) -> SeedResult<Self> {
        if seed_length == 0 || seed_length > MAX_SEED_LENGTH {
            return Err(SeedError::InvalidParams(format!(
                "seed length must be between 1 and {}, got {}",
                MAX_SEED_LENGTH, seed_length
            )));
        }

        let mut buckets: HashMap<Box<[u8]>, Bucket> = HashMap::new();
        let mut total_length = 0;

        for (query, record) in queries.iter().enumerate() {
            total_length += record.len();
            if record.len() < seed_length {
                continue;
            }
            for (position, window) in record.seq.windows(seed_length).enumerate() {
                if has_wildcard(window, alphabet) {
                    continue;
                }
                // Queries and positions are visited in order, so bucket lists stay sorted.
                match buckets.get_mut(window) {
                    Some(bucket) => bucket.occurrences.push(Occurrence { query, position }),
                    None => {
                        buckets.insert(
                            window.into(),
                            Bucket {
                                occurrences: vec![Occurrence { query, position }],
                                state: BucketState::Enabled,
                            },
                        );
                    }
                }
            }
        }

        Ok(Self {
            seed_length,
            alphabet,
            buckets,
            total_length,
        })
    }

    pub fn seed_length(&self) -> usize {
        self.seed_length
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Sum of all indexed query lengths.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket(&self, seed: &[u8]) -> Option<&Bucket> {
        self.buckets.get(seed)
    }

    /// Occurrences of `seed`, or `None` if it is absent or disabled.
    pub fn hits(&self, seed: &[u8]) -> Option<&[Occurrence]> {
        self.buckets
            .get(seed)
            .filter(|b| b.is_enabled())
            .map(|b| b.occurrences.as_slice())
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&[u8], &Bucket)> {
        self.buckets.iter().map(|(k, b)| (k.as_ref(), b))
    }

    pub(crate) fn buckets_mut(&mut self) -> impl Iterator<Item = &mut Bucket> {
        self.buckets.values_mut()
    }
}
